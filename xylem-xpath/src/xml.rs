//! [`DocumentAccess`] over the structural index.
//!
//! Node ids are small copyable handles into the index's flat arrays.
//! Document order is O(1): the builder stamped elements and texts with a
//! shared preorder sequence number, and an attribute sorts between its
//! owner element and the owner's first child.

use std::cmp::Ordering;

use xylem_xml::{ChildKind, ChildRef, StructuralIndex, SENTINEL};

use crate::doc::{DocumentAccess, NodeKind};

/// A node handle into a [`StructuralIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexNode {
    /// The document root, parent of the root element.
    Root,
    Element(u32),
    Text(u32),
    Attribute {
        element: u32,
        /// Index into the global attribute array.
        attr: u32,
    },
}

enum NodeChildren<'a> {
    Root(Option<IndexNode>),
    Slice(std::slice::Iter<'a, ChildRef>),
    Empty,
}

impl Iterator for NodeChildren<'_> {
    type Item = IndexNode;

    fn next(&mut self) -> Option<IndexNode> {
        match self {
            NodeChildren::Root(root) => root.take(),
            NodeChildren::Slice(refs) => refs.next().map(|r| match r.kind() {
                ChildKind::Element => IndexNode::Element(r.index()),
                ChildKind::Text | ChildKind::CData => IndexNode::Text(r.index()),
            }),
            NodeChildren::Empty => None,
        }
    }
}

impl DocumentAccess for StructuralIndex {
    type Node = IndexNode;

    fn root(&self) -> IndexNode {
        IndexNode::Root
    }

    fn parent(&self, node: IndexNode) -> Option<IndexNode> {
        match node {
            IndexNode::Root => None,
            IndexNode::Element(i) => {
                let parent = self.element(i).parent;
                if parent == SENTINEL {
                    Some(IndexNode::Root)
                } else {
                    Some(IndexNode::Element(parent))
                }
            }
            IndexNode::Text(i) => Some(IndexNode::Element(self.text(i).parent())),
            IndexNode::Attribute { element, .. } => Some(IndexNode::Element(element)),
        }
    }

    fn children(&self, node: IndexNode) -> impl Iterator<Item = IndexNode> + '_ {
        match node {
            IndexNode::Root => NodeChildren::Root(self.root_element().map(IndexNode::Element)),
            IndexNode::Element(i) => NodeChildren::Slice(self.children(i).iter()),
            _ => NodeChildren::Empty,
        }
    }

    fn attributes(&self, node: IndexNode) -> impl Iterator<Item = IndexNode> + '_ {
        let (element, range) = match node {
            IndexNode::Element(i) => (i, self.element(i).attrs_range()),
            _ => (0, 0..0),
        };
        range.map(move |attr| IndexNode::Attribute { element, attr })
    }

    fn node_kind(&self, node: IndexNode) -> NodeKind {
        match node {
            IndexNode::Root => NodeKind::Root,
            IndexNode::Element(_) => NodeKind::Element,
            IndexNode::Text(_) => NodeKind::Text,
            IndexNode::Attribute { .. } => NodeKind::Attribute,
        }
    }

    fn name(&self, node: IndexNode) -> String {
        match node {
            IndexNode::Element(i) => self.qname(i).to_string(),
            IndexNode::Attribute { attr, .. } => self.attr_qname(self.attr(attr)).to_string(),
            _ => String::new(),
        }
    }

    fn local_name(&self, node: IndexNode) -> String {
        match node {
            IndexNode::Element(i) => self.local_name(i).to_string(),
            IndexNode::Attribute { attr, .. } => self.attr_local_name(self.attr(attr)).to_string(),
            _ => String::new(),
        }
    }

    fn prefix(&self, node: IndexNode) -> Option<String> {
        match node {
            IndexNode::Element(i) => StructuralIndex::prefix(self, i).map(str::to_string),
            IndexNode::Attribute { attr, .. } => {
                self.attr_prefix(self.attr(attr)).map(str::to_string)
            }
            _ => None,
        }
    }

    fn namespace_uri(&self, node: IndexNode) -> Option<String> {
        match node {
            IndexNode::Element(i) => StructuralIndex::namespace_uri(self, i).map(|c| c.into_owned()),
            IndexNode::Attribute { element, attr } => {
                // unprefixed attributes are in no namespace
                let prefix = self.attr_prefix(self.attr(attr))?.to_string();
                self.lookup_namespace(element, Some(&prefix))
                    .map(|c| c.into_owned())
            }
            _ => None,
        }
    }

    fn string_value(&self, node: IndexNode) -> String {
        match node {
            IndexNode::Root => self
                .root_element()
                .map(|root| self.string_value(root))
                .unwrap_or_default(),
            IndexNode::Element(i) => StructuralIndex::string_value(self, i),
            IndexNode::Text(i) => self.text_value(self.text(i)).into_owned(),
            IndexNode::Attribute { attr, .. } => self.attr_value(self.attr(attr)).into_owned(),
        }
    }

    fn document_order(&self, a: IndexNode, b: IndexNode) -> Ordering {
        order_key(self, a).cmp(&order_key(self, b))
    }
}

fn order_key(index: &StructuralIndex, node: IndexNode) -> (u32, u32) {
    match node {
        IndexNode::Root => (0, 0),
        IndexNode::Element(i) => (index.element(i).order(), 0),
        IndexNode::Text(i) => (index.text(i).order(), 0),
        IndexNode::Attribute { element, attr } => {
            let owner = index.element(element);
            let within = attr - owner.attrs_range().start;
            (owner.order(), within + 1)
        }
    }
}
