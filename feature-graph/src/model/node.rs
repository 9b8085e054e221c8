//! Graph nodes: lexical tokens and higher-level syntax entities.

/// Node kind as stored in the record (`FeatureNode.NodeType`).
///
/// Values outside the known range are preserved as [`NodeKind::Unknown`]
/// so that a newer record producer does not break decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Token,
    AstElement,
    CommentLine,
    CommentBlock,
    CommentJavadoc,
    AstRoot,
    IdentifierToken,
    FakeAst,
    Symbol,
    SymbolTyp,
    SymbolVar,
    SymbolMth,
    Type,
    MethodSignature,
    AstLeaf,
    Unknown(i32),
}

impl NodeKind {
    pub fn from_i32(v: i32) -> Self {
        use NodeKind::*;
        match v {
            1 => Token,
            2 => AstElement,
            3 => CommentLine,
            4 => CommentBlock,
            5 => CommentJavadoc,
            6 => AstRoot,
            7 => IdentifierToken,
            8 => FakeAst,
            9 => Symbol,
            10 => SymbolTyp,
            11 => SymbolVar,
            12 => SymbolMth,
            13 => Type,
            14 => MethodSignature,
            15 => AstLeaf,
            other => Unknown(other),
        }
    }

    pub fn as_i32(self) -> i32 {
        use NodeKind::*;
        match self {
            Token => 1,
            AstElement => 2,
            CommentLine => 3,
            CommentBlock => 4,
            CommentJavadoc => 5,
            AstRoot => 6,
            IdentifierToken => 7,
            FakeAst => 8,
            Symbol => 9,
            SymbolTyp => 10,
            SymbolVar => 11,
            SymbolMth => 12,
            Type => 13,
            MethodSignature => 14,
            AstLeaf => 15,
            Unknown(v) => v,
        }
    }

    /// Plain and identifier tokens carry the source positions used as lookup keys.
    pub fn is_token_like(self) -> bool {
        matches!(self, NodeKind::Token | NodeKind::IdentifierToken)
    }
}

/// One node of a feature graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Unique within one graph.
    pub id: i64,
    pub kind: NodeKind,
    /// Token text, or a structural marker such as `METHOD`.
    pub contents: String,
    /// Start offset into the source text.
    pub start_position: i32,
    /// End offset into the source text.
    pub end_position: i32,
    pub start_line: i32,
    pub end_line: i32,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            id: 0,
            kind: NodeKind::Unknown(0),
            contents: String::new(),
            start_position: 0,
            end_position: 0,
            start_line: 0,
            end_line: 0,
        }
    }
}
