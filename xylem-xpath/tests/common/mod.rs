//! A plain in-memory tree implementing the document-access capability,
//! so the engine can be exercised without the structural index — and
//! with node kinds the index does not carry (comments, processing
//! instructions).

use std::cmp::Ordering;

use xylem_xpath::{DocumentAccess, NodeKind};

struct NodeData {
    kind: NodeKind,
    /// Qualified name for elements/attributes, target for PIs.
    name: String,
    /// Text/attribute/comment content.
    value: String,
    parent: Option<usize>,
    children: Vec<usize>,
    attrs: Vec<usize>,
}

/// Node ids are allocation order; build in document order (attributes
/// right after their element, then children) and document order is id
/// order.
pub struct SimpleTree {
    nodes: Vec<NodeData>,
}

impl SimpleTree {
    pub fn new() -> Self {
        SimpleTree {
            nodes: vec![NodeData {
                kind: NodeKind::Root,
                name: String::new(),
                value: String::new(),
                parent: None,
                children: Vec::new(),
                attrs: Vec::new(),
            }],
        }
    }

    fn push(&mut self, kind: NodeKind, name: &str, value: &str, parent: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(NodeData {
            kind,
            name: name.to_string(),
            value: value.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            attrs: Vec::new(),
        });
        id
    }

    pub fn element(&mut self, parent: usize, name: &str) -> usize {
        let id = self.push(NodeKind::Element, name, "", parent);
        self.nodes[parent].children.push(id);
        id
    }

    pub fn attr(&mut self, element: usize, name: &str, value: &str) -> usize {
        let id = self.push(NodeKind::Attribute, name, value, element);
        self.nodes[element].attrs.push(id);
        id
    }

    pub fn text(&mut self, parent: usize, value: &str) -> usize {
        let id = self.push(NodeKind::Text, "", value, parent);
        self.nodes[parent].children.push(id);
        id
    }

    pub fn comment(&mut self, parent: usize, value: &str) -> usize {
        let id = self.push(NodeKind::Comment, "", value, parent);
        self.nodes[parent].children.push(id);
        id
    }

    pub fn pi(&mut self, parent: usize, target: &str, data: &str) -> usize {
        let id = self.push(NodeKind::ProcessingInstruction, target, data, parent);
        self.nodes[parent].children.push(id);
        id
    }

    fn collect_text(&self, node: usize, out: &mut String) {
        let mut stack = vec![self.nodes[node].children.as_slice()];
        while let Some(top) = stack.last_mut() {
            match top.split_first() {
                None => {
                    stack.pop();
                }
                Some((head, rest)) => {
                    *top = rest;
                    match self.nodes[*head].kind {
                        NodeKind::Text => out.push_str(&self.nodes[*head].value),
                        NodeKind::Element => stack.push(self.nodes[*head].children.as_slice()),
                        _ => {}
                    }
                }
            }
        }
    }
}

impl DocumentAccess for SimpleTree {
    type Node = usize;

    fn root(&self) -> usize {
        0
    }

    fn parent(&self, node: usize) -> Option<usize> {
        self.nodes[node].parent
    }

    fn children(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes[node].children.iter().copied()
    }

    fn attributes(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes[node].attrs.iter().copied()
    }

    fn node_kind(&self, node: usize) -> NodeKind {
        self.nodes[node].kind
    }

    fn name(&self, node: usize) -> String {
        self.nodes[node].name.clone()
    }

    fn local_name(&self, node: usize) -> String {
        let name = &self.nodes[node].name;
        match name.split_once(':') {
            Some((_, local)) => local.to_string(),
            None => name.clone(),
        }
    }

    fn prefix(&self, node: usize) -> Option<String> {
        self.nodes[node]
            .name
            .split_once(':')
            .map(|(prefix, _)| prefix.to_string())
    }

    fn namespace_uri(&self, _node: usize) -> Option<String> {
        None
    }

    fn string_value(&self, node: usize) -> String {
        match self.nodes[node].kind {
            NodeKind::Root | NodeKind::Element => {
                let mut out = String::new();
                self.collect_text(node, &mut out);
                out
            }
            NodeKind::ProcessingInstruction => self.nodes[node].value.clone(),
            _ => self.nodes[node].value.clone(),
        }
    }

    fn document_order(&self, a: usize, b: usize) -> Ordering {
        a.cmp(&b)
    }
}
