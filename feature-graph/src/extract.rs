//! Method token-chain extraction.
//!
//! A record's token stream is stored as a graph: every token node links to
//! its successor through a `NEXT_TOKEN` edge. For each method root we look up
//! the token starting at the method's start position and the token ending at
//! its end position, then follow the chain from the first to the second.
//! The end token itself is not part of the sequence.
//!
//! Index policy: node ids and token positions are lookup keys. When a key
//! occurs twice, the node enumerated last wins. Duplicate token positions are
//! counted in [`ExtractStats::duplicate_positions`].

use crate::{
    errors::{Boundary, GraphError, Result},
    model::{Edge, EdgeKind, Graph, Node},
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

/// What to do when a token has more than one outgoing next-token edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Follow the first edge in enumeration order; log and count the hop.
    #[default]
    FirstEdge,
    /// Fail the record with [`GraphError::AmbiguousNextToken`].
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// `contents` value that marks a method root.
    pub method_marker: String,
    /// Lowercase token text before emitting it.
    pub lowercase: bool,
    pub ambiguity: AmbiguityPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            method_marker: "METHOD".to_string(),
            lowercase: true,
            ambiguity: AmbiguityPolicy::FirstEdge,
        }
    }
}

/// Counters collected while extracting one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Method roots visited.
    pub methods: usize,
    /// Non-empty sequences yielded.
    pub sequences: usize,
    /// Methods whose chain was empty (start token == end token).
    pub empty_dropped: usize,
    /// Hops resolved by [`AmbiguityPolicy::FirstEdge`].
    pub ambiguous_hops: usize,
    /// Token start/end positions that were indexed more than once.
    pub duplicate_positions: usize,
}

impl ExtractStats {
    pub fn merge(&mut self, other: &ExtractStats) {
        self.methods += other.methods;
        self.sequences += other.sequences;
        self.empty_dropped += other.empty_dropped;
        self.ambiguous_hops += other.ambiguous_hops;
        self.duplicate_positions += other.duplicate_positions;
    }
}

/// Lookup tables over one graph. Borrowed from the graph, dropped with it.
#[derive(Debug)]
pub struct TokenGraph<'g> {
    graph: &'g Graph,
    nodes: HashMap<i64, &'g Node>,
    next_edges: HashMap<i64, Vec<&'g Edge>>,
    tokens_by_start: HashMap<i32, i64>,
    tokens_by_end: HashMap<i32, i64>,
    duplicate_positions: usize,
}

impl<'g> TokenGraph<'g> {
    /// Index nodes by id, next-token edges by source id, and token-like
    /// nodes by start and end position.
    pub fn index(graph: &'g Graph) -> Self {
        let mut nodes = HashMap::with_capacity(graph.nodes.len());
        let mut tokens_by_start = HashMap::new();
        let mut tokens_by_end = HashMap::new();
        let mut duplicate_positions = 0usize;

        for node in &graph.nodes {
            nodes.insert(node.id, node);
            if node.kind.is_token_like() {
                if tokens_by_start.insert(node.start_position, node.id).is_some() {
                    duplicate_positions += 1;
                }
                if tokens_by_end.insert(node.end_position, node.id).is_some() {
                    duplicate_positions += 1;
                }
            }
        }

        let mut next_edges: HashMap<i64, Vec<&Edge>> = HashMap::new();
        for edge in graph.edges.iter().filter(|e| e.kind == EdgeKind::NextToken) {
            next_edges.entry(edge.source_id).or_default().push(edge);
        }

        if duplicate_positions > 0 {
            debug!(duplicate_positions, "token positions indexed more than once; last node wins");
        }

        Self {
            graph,
            nodes,
            next_edges,
            tokens_by_start,
            tokens_by_end,
            duplicate_positions,
        }
    }

    pub fn duplicate_positions(&self) -> usize {
        self.duplicate_positions
    }

    /// Lazily walk every method root, yielding one token list per method.
    ///
    /// Empty lists are skipped. A failing method yields its error and the
    /// iterator moves on to the next method root.
    pub fn method_sequences<'a>(&'a self, options: &'a ExtractOptions) -> MethodSequences<'a, 'g> {
        MethodSequences {
            index: self,
            options,
            position: 0,
            stats: ExtractStats {
                duplicate_positions: self.duplicate_positions,
                ..ExtractStats::default()
            },
        }
    }

    /// Follow next-token edges from the method's first token up to (not
    /// including) its last token.
    pub fn walk_method(
        &self,
        method: &Node,
        options: &ExtractOptions,
        stats: &mut ExtractStats,
    ) -> Result<Vec<String>> {
        let (start, end) = (method.start_position, method.end_position);
        let first = *self
            .tokens_by_start
            .get(&start)
            .ok_or(GraphError::MissingTokenBoundary {
                start,
                end,
                boundary: Boundary::Start,
                position: start,
            })?;
        let last = *self
            .tokens_by_end
            .get(&end)
            .ok_or(GraphError::MissingTokenBoundary {
                start,
                end,
                boundary: Boundary::End,
                position: end,
            })?;

        let mut visited = HashSet::new();
        let mut tokens = Vec::new();
        let mut current = first;

        while current != last {
            if !visited.insert(current) {
                return Err(GraphError::TraversalCycle {
                    start,
                    end,
                    node: current,
                });
            }
            let node = self
                .nodes
                .get(&current)
                .ok_or(GraphError::DanglingTokenChain {
                    start,
                    end,
                    node: current,
                })?;
            trace!(node = current, contents = %node.contents, "chain step");
            tokens.push(if options.lowercase {
                node.contents.to_lowercase()
            } else {
                node.contents.clone()
            });

            current = self
                .next_token(current, options.ambiguity, stats)?
                .ok_or(GraphError::DanglingTokenChain {
                    start,
                    end,
                    node: current,
                })?;
        }

        Ok(tokens)
    }

    fn next_token(
        &self,
        node: i64,
        policy: AmbiguityPolicy,
        stats: &mut ExtractStats,
    ) -> Result<Option<i64>> {
        let Some(edges) = self.next_edges.get(&node) else {
            return Ok(None);
        };
        if edges.len() > 1 {
            match policy {
                AmbiguityPolicy::Reject => {
                    return Err(GraphError::AmbiguousNextToken {
                        node,
                        count: edges.len(),
                    });
                }
                AmbiguityPolicy::FirstEdge => {
                    stats.ambiguous_hops += 1;
                    warn!(
                        node,
                        count = edges.len(),
                        chosen = edges[0].destination_id,
                        "multiple next-token edges; following the first"
                    );
                }
            }
        }
        Ok(edges.first().map(|e| e.destination_id))
    }
}

/// Iterator returned by [`TokenGraph::method_sequences`].
pub struct MethodSequences<'a, 'g> {
    index: &'a TokenGraph<'g>,
    options: &'a ExtractOptions,
    position: usize,
    stats: ExtractStats,
}

impl MethodSequences<'_, '_> {
    /// Counters for the methods consumed so far.
    pub fn stats(&self) -> ExtractStats {
        self.stats
    }
}

impl Iterator for MethodSequences<'_, '_> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        let nodes = &index.graph.nodes;
        while self.position < nodes.len() {
            let node = &nodes[self.position];
            self.position += 1;
            if node.contents != self.options.method_marker {
                continue;
            }
            self.stats.methods += 1;
            match index.walk_method(node, self.options, &mut self.stats) {
                Ok(tokens) if tokens.is_empty() => {
                    self.stats.empty_dropped += 1;
                }
                Ok(tokens) => {
                    self.stats.sequences += 1;
                    return Some(Ok(tokens));
                }
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

/// Extract every method's token sequence from `graph`, failing on the first
/// structural error.
pub fn extract_method_tokens(
    graph: &Graph,
    options: &ExtractOptions,
) -> Result<(Vec<Vec<String>>, ExtractStats)> {
    let index = TokenGraph::index(graph);
    let mut sequences = index.method_sequences(options);
    let mut out = Vec::new();
    for item in sequences.by_ref() {
        out.push(item?);
    }
    let stats = sequences.stats();
    debug!(
        methods = stats.methods,
        sequences = stats.sequences,
        empty = stats.empty_dropped,
        "extracted method token sequences"
    );
    Ok((out, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;
    use crate::testing::{GraphBuilder, method_graph};

    fn extract(graph: &Graph) -> Result<Vec<Vec<String>>> {
        extract_method_tokens(graph, &ExtractOptions::default()).map(|(seqs, _)| seqs)
    }

    #[test]
    fn follows_chain_and_excludes_end_token() {
        let g = method_graph(1, &["public", "int", "foo"]).build();
        assert_eq!(extract(&g).unwrap(), vec![vec!["public", "int", "foo"]]);
    }

    #[test]
    fn lowercases_token_text() {
        let g = method_graph(1, &["Public", "INT", "fooBar"]).build();
        assert_eq!(extract(&g).unwrap(), vec![vec!["public", "int", "foobar"]]);
    }

    #[test]
    fn keeps_case_when_asked() {
        let g = method_graph(1, &["fooBar"]).build();
        let opts = ExtractOptions {
            lowercase: false,
            ..ExtractOptions::default()
        };
        let (seqs, _) = extract_method_tokens(&g, &opts).unwrap();
        assert_eq!(seqs, vec![vec!["fooBar"]]);
    }

    #[test]
    fn record_without_methods_yields_nothing() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "b", 2, 3)
            .next_token(1, 2)
            .build();
        let (seqs, stats) = extract_method_tokens(&g, &ExtractOptions::default()).unwrap();
        assert!(seqs.is_empty());
        assert_eq!(stats.methods, 0);
    }

    #[test]
    fn empty_sequences_are_dropped() {
        // start token == end token
        let g = GraphBuilder::new()
            .token(1, ";", 0, 1)
            .method(2, 0, 1)
            .build();
        let (seqs, stats) = extract_method_tokens(&g, &ExtractOptions::default()).unwrap();
        assert!(seqs.is_empty());
        assert_eq!(stats.methods, 1);
        assert_eq!(stats.empty_dropped, 1);
    }

    #[test]
    fn methods_come_out_in_enumeration_order() {
        // method B is enumerated before method A.
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "x", 2, 3)
            .token(3, "b", 4, 5)
            .token(4, "y", 6, 7)
            .next_token(1, 2)
            .next_token(2, 3)
            .next_token(3, 4)
            .method(11, 4, 7)
            .method(10, 0, 3)
            .build();
        assert_eq!(extract(&g).unwrap(), vec![vec!["b"], vec!["a"]]);
    }

    #[test]
    fn only_next_token_edges_are_followed() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "b", 2, 3)
            .token(3, "c", 4, 5)
            .edge(1, 3, EdgeKind::AstChild)
            .next_token(1, 2)
            .next_token(2, 3)
            .method(9, 0, 5)
            .build();
        assert_eq!(extract(&g).unwrap(), vec![vec!["a", "b"]]);
    }

    #[test]
    fn ambiguous_edges_follow_the_first_by_default() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "b", 2, 3)
            .token(3, "c", 4, 5)
            .token(4, "end", 6, 9)
            .next_token(1, 2)
            .next_token(1, 3)
            .next_token(2, 4)
            .next_token(3, 4)
            .method(9, 0, 9)
            .build();
        let (seqs, stats) = extract_method_tokens(&g, &ExtractOptions::default()).unwrap();
        assert_eq!(seqs, vec![vec!["a", "b"]]);
        assert_eq!(stats.ambiguous_hops, 1);
    }

    #[test]
    fn ambiguous_edges_can_be_rejected() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "b", 2, 3)
            .next_token(1, 2)
            .next_token(1, 2)
            .method(9, 0, 3)
            .build();
        let opts = ExtractOptions {
            ambiguity: AmbiguityPolicy::Reject,
            ..ExtractOptions::default()
        };
        let err = extract_method_tokens(&g, &opts).unwrap_err();
        assert!(matches!(err, GraphError::AmbiguousNextToken { node: 1, count: 2 }));
    }

    #[test]
    fn missing_start_token_is_reported() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .method(9, 5, 1)
            .build();
        let err = extract(&g).unwrap_err();
        assert!(matches!(
            err,
            GraphError::MissingTokenBoundary {
                boundary: Boundary::Start,
                position: 5,
                ..
            }
        ));
    }

    #[test]
    fn missing_end_token_is_reported() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .method(9, 0, 42)
            .build();
        let err = extract(&g).unwrap_err();
        assert!(matches!(
            err,
            GraphError::MissingTokenBoundary {
                boundary: Boundary::End,
                position: 42,
                ..
            }
        ));
    }

    #[test]
    fn loop_back_to_start_is_a_cycle() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "b", 2, 3)
            .token(3, "end", 4, 7)
            .next_token(1, 2)
            .next_token(2, 1)
            .method(9, 0, 7)
            .build();
        let err = extract(&g).unwrap_err();
        assert!(matches!(err, GraphError::TraversalCycle { node: 1, .. }), "{err:?}");
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "end", 2, 5)
            .next_token(1, 1)
            .method(9, 0, 5)
            .build();
        assert!(matches!(
            extract(&g).unwrap_err(),
            GraphError::TraversalCycle { node: 1, .. }
        ));
    }

    #[test]
    fn chain_without_successor_is_dangling() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "b", 2, 3)
            .token(3, "end", 4, 7)
            .next_token(1, 2)
            .method(9, 0, 7)
            .build();
        assert!(matches!(
            extract(&g).unwrap_err(),
            GraphError::DanglingTokenChain { node: 2, .. }
        ));
    }

    #[test]
    fn duplicate_positions_resolve_to_last_node() {
        let g = GraphBuilder::new()
            .token(1, "first", 0, 5)
            .token(2, "second", 0, 6)
            .token(3, "end", 7, 10)
            .next_token(1, 3)
            .next_token(2, 3)
            .method(9, 0, 10)
            .build();
        let (seqs, stats) = extract_method_tokens(&g, &ExtractOptions::default()).unwrap();
        assert_eq!(seqs, vec![vec!["second"]]);
        assert_eq!(stats.duplicate_positions, 1);
    }

    #[test]
    fn duplicate_end_positions_resolve_to_last_node() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "b", 2, 3)
            .token(3, "c", 4, 9)
            .token(4, "d", 6, 9)
            .next_token(1, 2)
            .next_token(2, 3)
            .next_token(3, 4)
            .method(9, 0, 9)
            .build();
        let (seqs, stats) = extract_method_tokens(&g, &ExtractOptions::default()).unwrap();
        assert_eq!(seqs, vec![vec!["a", "b", "c"]]);
        assert_eq!(stats.duplicate_positions, 1);
    }

    #[test]
    fn identifier_tokens_bound_methods() {
        // The class node shares the method's span but is not a token.
        let g = GraphBuilder::new()
            .identifier(1, "Foo", 0, 3)
            .token(2, "(", 3, 4)
            .identifier(3, "x", 4, 5)
            .next_token(1, 2)
            .next_token(2, 3)
            .node(8, NodeKind::AstElement, "CLASS", 0, 5)
            .method(9, 0, 5)
            .build();
        let (seqs, stats) = extract_method_tokens(&g, &ExtractOptions::default()).unwrap();
        assert_eq!(seqs, vec![vec!["foo", "("]]);
        assert_eq!(stats.duplicate_positions, 0);
    }

    #[test]
    fn lazy_iterator_continues_after_a_failing_method() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "end", 2, 5)
            .next_token(1, 2)
            .method(8, 99, 5)
            .method(9, 0, 5)
            .build();
        let index = TokenGraph::index(&g);
        let opts = ExtractOptions::default();
        let items: Vec<_> = index.method_sequences(&opts).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_err());
        assert_eq!(items[1].as_ref().unwrap(), &vec!["a".to_string()]);
    }

    #[test]
    fn custom_method_marker() {
        let g = GraphBuilder::new()
            .token(1, "a", 0, 1)
            .token(2, "end", 2, 5)
            .next_token(1, 2)
            .node(9, NodeKind::AstElement, "CONSTRUCTOR", 0, 5)
            .build();
        assert!(extract(&g).unwrap().is_empty());
        let opts = ExtractOptions {
            method_marker: "CONSTRUCTOR".to_string(),
            ..ExtractOptions::default()
        };
        let (seqs, _) = extract_method_tokens(&g, &opts).unwrap();
        assert_eq!(seqs, vec![vec!["a"]]);
    }
}
