//! Document snapshot model
//!
//! A snapshot is the immutable, format-agnostic tree representation of one
//! document's structure at evaluation time, produced by an extraction
//! collaborator. The core never mutates a snapshot; downstream stages borrow
//! it read-only.
//!
//! ## Content hash
//!
//! `content_hash()` is a pure function of the node tree: kind, text, and
//! child structure, under the snapshot schema version. Node ids (derivable
//! from structure) and source spans (extraction artifacts) are excluded, so
//! two extractors that agree on structure and text produce the same hash
//! regardless of originating format.

use crate::digest::hash_canonical;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot schema major version.
///
/// Snapshot format changes require bumping this version, not the engine.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Structural kind of a snapshot node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Section,
    Paragraph,
    Citation,
    Metadata,
    Span,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Section => "section",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Citation => "citation",
            NodeKind::Metadata => "metadata",
            NodeKind::Span => "span",
        };
        write!(f, "{}", name)
    }
}

/// Byte offsets into the source document
///
/// Spans are evidence pointers only; they never participate in the content
/// hash because different source formats place the same content at
/// different offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: u64,
    pub end: u64,
}

/// A single node in the snapshot tree
///
/// The `node_id` is a stable ordinal path from the root (e.g. `"0.2.1"`),
/// assigned by `DocumentSnapshot::new`. Build nodes with `Node::new` and the
/// `with_*` helpers; ids supplied before construction are overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable path-based identifier, assigned at snapshot construction
    pub node_id: String,

    /// Structural kind
    pub kind: NodeKind,

    /// Textual content of this node (may be empty for pure containers)
    pub text: String,

    /// Optional byte offsets into the source document
    pub span: Option<SourceSpan>,

    /// Child nodes in document order
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new node with the given kind and text
    pub fn new(kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            node_id: String::new(),
            kind,
            text: text.into(),
            span: None,
            children: Vec::new(),
        }
    }

    /// Attach source offsets
    pub fn with_span(mut self, start: u64, end: u64) -> Self {
        self.span = Some(SourceSpan { start, end });
        self
    }

    /// Attach child nodes
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }
}

/// Canonical hashed form of a node: kind, text, children only.
///
/// Private on purpose — this is the one place that defines what the content
/// hash covers.
#[derive(Serialize)]
struct CanonicalNode<'a> {
    kind: NodeKind,
    text: &'a str,
    children: Vec<CanonicalNode<'a>>,
}

impl<'a> CanonicalNode<'a> {
    fn from_node(node: &'a Node) -> Self {
        Self {
            kind: node.kind,
            text: &node.text,
            children: node.children.iter().map(CanonicalNode::from_node).collect(),
        }
    }
}

#[derive(Serialize)]
struct CanonicalTree<'a> {
    schema_version: u32,
    nodes: Vec<CanonicalNode<'a>>,
}

/// Immutable document snapshot
///
/// Created once by an extraction collaborator, never mutated, referenced
/// (not owned) by downstream stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Name or identifier of the source document (not hashed)
    pub document_name: String,

    /// Snapshot schema major version
    pub schema_version: u32,

    /// Extraction engine identifier (provenance only, not hashed)
    pub extractor: String,

    /// Extraction engine version (provenance only, not hashed)
    pub extractor_version: String,

    /// Root nodes in document order
    pub nodes: Vec<Node>,
}

impl DocumentSnapshot {
    /// Create a snapshot from root nodes, assigning canonical node ids.
    ///
    /// Node ids are ordinal paths from the root: the third child of the
    /// first root node becomes `"0.2"`. Any ids present on the input nodes
    /// are overwritten.
    pub fn new(
        document_name: impl Into<String>,
        extractor: impl Into<String>,
        extractor_version: impl Into<String>,
        mut nodes: Vec<Node>,
    ) -> Self {
        for (ordinal, node) in nodes.iter_mut().enumerate() {
            assign_ids(node, &ordinal.to_string());
        }
        Self {
            document_name: document_name.into(),
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            extractor: extractor.into(),
            extractor_version: extractor_version.into(),
            nodes,
        }
    }

    /// Compute the content hash of this snapshot.
    ///
    /// Pure function of `(schema_version, node tree)` — see module docs for
    /// what is excluded and why.
    ///
    /// ## Errors
    ///
    /// Returns `VerdexError::Serialization` if canonicalization fails.
    pub fn content_hash(&self) -> Result<String> {
        let tree = CanonicalTree {
            schema_version: self.schema_version,
            nodes: self.nodes.iter().map(CanonicalNode::from_node).collect(),
        };
        hash_canonical(&tree)
    }

    /// Look up a node by its path-based id.
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        let mut ordinals = node_id.split('.');
        let first: usize = ordinals.next()?.parse().ok()?;
        let mut current = self.nodes.get(first)?;
        for part in ordinals {
            let ordinal: usize = part.parse().ok()?;
            current = current.children.get(ordinal)?;
        }
        Some(current)
    }

    /// All nodes of the given kind, in preorder.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&Node> {
        let mut found = Vec::new();
        for node in &self.nodes {
            collect_kind(node, kind, &mut found);
        }
        found
    }

    /// Count of nodes of the given kind.
    pub fn count_kind(&self, kind: NodeKind) -> u32 {
        self.nodes_of_kind(kind).len() as u32
    }
}

fn assign_ids(node: &mut Node, path: &str) {
    node.node_id = path.to_string();
    for (ordinal, child) in node.children.iter_mut().enumerate() {
        assign_ids(child, &format!("{}.{}", path, ordinal));
    }
}

fn collect_kind<'a>(node: &'a Node, kind: NodeKind, found: &mut Vec<&'a Node>) {
    if node.kind == kind {
        found.push(node);
    }
    for child in &node.children {
        collect_kind(child, kind, found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot(extractor: &str) -> DocumentSnapshot {
        DocumentSnapshot::new(
            "thesis.docx",
            extractor,
            "1.0.0",
            vec![
                Node::new(NodeKind::Section, "Introduction").with_children(vec![
                    Node::new(NodeKind::Paragraph, "First paragraph.").with_span(10, 26),
                    Node::new(NodeKind::Citation, "(Doe, 2021)"),
                ]),
                Node::new(NodeKind::Section, "Method"),
            ],
        )
    }

    #[test]
    fn test_node_ids_are_ordinal_paths() {
        let snapshot = sample_snapshot("extractor-a");
        assert_eq!(snapshot.nodes[0].node_id, "0");
        assert_eq!(snapshot.nodes[0].children[0].node_id, "0.0");
        assert_eq!(snapshot.nodes[0].children[1].node_id, "0.1");
        assert_eq!(snapshot.nodes[1].node_id, "1");
    }

    #[test]
    fn test_node_lookup_by_path() {
        let snapshot = sample_snapshot("extractor-a");
        assert_eq!(snapshot.node("0.1").unwrap().text, "(Doe, 2021)");
        assert!(snapshot.node("0.2").is_none());
        assert!(snapshot.node("nonsense").is_none());
    }

    #[test]
    fn test_content_hash_deterministic() {
        let snapshot = sample_snapshot("extractor-a");
        assert_eq!(
            snapshot.content_hash().unwrap(),
            snapshot.content_hash().unwrap()
        );
    }

    #[test]
    fn test_content_hash_extractor_independent() {
        // Same structure and text, different provenance and spans
        let a = sample_snapshot("docx-extractor");
        let mut b = sample_snapshot("gdoc-extractor");
        b.document_name = "thesis.gdoc".to_string();
        b.nodes[0].children[0].span = Some(SourceSpan { start: 999, end: 1020 });

        assert_eq!(a.content_hash().unwrap(), b.content_hash().unwrap());
    }

    #[test]
    fn test_content_hash_sensitive_to_text() {
        let a = sample_snapshot("extractor-a");
        let mut b = sample_snapshot("extractor-a");
        b.nodes[1].text = "Methods".to_string();

        assert_ne!(a.content_hash().unwrap(), b.content_hash().unwrap());
    }

    #[test]
    fn test_content_hash_sensitive_to_structure() {
        let a = sample_snapshot("extractor-a");
        let mut b = sample_snapshot("extractor-a");
        // Move the citation out of the section; same node multiset, new shape
        let citation = b.nodes[0].children.pop().unwrap();
        b.nodes.push(citation);

        assert_ne!(a.content_hash().unwrap(), b.content_hash().unwrap());
    }

    #[test]
    fn test_nodes_of_kind_preorder() {
        let snapshot = sample_snapshot("extractor-a");
        let sections = snapshot.nodes_of_kind(NodeKind::Section);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].text, "Introduction");

        assert_eq!(snapshot.count_kind(NodeKind::Citation), 1);
        assert_eq!(snapshot.count_kind(NodeKind::Metadata), 0);
    }
}
