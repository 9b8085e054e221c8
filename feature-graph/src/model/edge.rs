//! Graph edges. Only [`EdgeKind::NextToken`] matters for chain-following;
//! the other kinds are decoded so the record survives intact.

/// Edge kind as stored in the record (`FeatureEdge.EdgeType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    AssociatedToken,
    NextToken,
    AstChild,
    None,
    LastWrite,
    LastUse,
    ComputedFrom,
    ReturnsTo,
    FormalArgName,
    GuardedBy,
    GuardedByNegation,
    LastLexicalUse,
    Comment,
    AssociatedSymbol,
    HasType,
    AssignableTo,
    MethodSignature,
    Unknown(i32),
}

impl EdgeKind {
    pub fn from_i32(v: i32) -> Self {
        match v {
            1 => Self::AssociatedToken,
            2 => Self::NextToken,
            3 => Self::AstChild,
            4 => Self::None,
            5 => Self::LastWrite,
            6 => Self::LastUse,
            7 => Self::ComputedFrom,
            8 => Self::ReturnsTo,
            9 => Self::FormalArgName,
            10 => Self::GuardedBy,
            11 => Self::GuardedByNegation,
            12 => Self::LastLexicalUse,
            13 => Self::Comment,
            14 => Self::AssociatedSymbol,
            15 => Self::HasType,
            16 => Self::AssignableTo,
            17 => Self::MethodSignature,
            other => Self::Unknown(other),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::AssociatedToken => 1,
            Self::NextToken => 2,
            Self::AstChild => 3,
            Self::None => 4,
            Self::LastWrite => 5,
            Self::LastUse => 6,
            Self::ComputedFrom => 7,
            Self::ReturnsTo => 8,
            Self::FormalArgName => 9,
            Self::GuardedBy => 10,
            Self::GuardedByNegation => 11,
            Self::LastLexicalUse => 12,
            Self::Comment => 13,
            Self::AssociatedSymbol => 14,
            Self::HasType => 15,
            Self::AssignableTo => 16,
            Self::MethodSignature => 17,
            Self::Unknown(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub source_id: i64,
    pub destination_id: i64,
    pub kind: EdgeKind,
}

impl Default for Edge {
    fn default() -> Self {
        Self {
            source_id: 0,
            destination_id: 0,
            kind: EdgeKind::Unknown(0),
        }
    }
}
