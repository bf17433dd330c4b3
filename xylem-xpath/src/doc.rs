//! The document-access capability the evaluator is generic over.
//!
//! Anything that can answer these questions can be queried: the
//! structural index implements it (see `xml.rs`), and so does the plain
//! in-memory tree the test suite uses.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element,
    Text,
    Attribute,
    Comment,
    ProcessingInstruction,
}

pub trait DocumentAccess {
    /// Cheap node identity; hashable for node-set deduplication.
    type Node: Copy + Eq + Hash + Debug;

    fn root(&self) -> Self::Node;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Child nodes in document order. Attributes are not children.
    fn children(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_;

    /// Attribute nodes of an element, in document order; empty for
    /// anything that is not an element.
    fn attributes(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_;

    fn node_kind(&self, node: Self::Node) -> NodeKind;

    /// Qualified name as written; empty for unnamed node kinds.
    fn name(&self, node: Self::Node) -> String;

    fn local_name(&self, node: Self::Node) -> String;

    fn prefix(&self, node: Self::Node) -> Option<String>;

    fn namespace_uri(&self, node: Self::Node) -> Option<String>;

    /// The XPath string-value: concatenated descendant text for elements
    /// and the root, the decoded value for texts and attributes.
    fn string_value(&self, node: Self::Node) -> String;

    fn document_order(&self, a: Self::Node, b: Self::Node) -> Ordering;
}
