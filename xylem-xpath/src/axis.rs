//! Axis traversal.
//!
//! Every walk that can go document-deep uses an explicit stack; nesting
//! depth must never translate into call-stack depth. Axes push their
//! nodes in axis order — reverse axes nearest-first — which is the order
//! predicates count positions in.

use xylem_xpath_ast::Axis;

use crate::doc::{DocumentAccess, NodeKind};

pub(crate) fn axis_nodes<D: DocumentAccess>(
    doc: &D,
    axis: Axis,
    node: D::Node,
    out: &mut Vec<D::Node>,
) {
    match axis {
        Axis::Child => out.extend(doc.children(node)),
        Axis::Parent => out.extend(doc.parent(node)),
        Axis::Self_ => out.push(node),
        Axis::Attribute => out.extend(doc.attributes(node)),
        Axis::Descendant => push_descendants(doc, node, out),
        Axis::DescendantOrSelf => {
            out.push(node);
            push_descendants(doc, node, out);
        }
        Axis::Ancestor => push_ancestors(doc, node, out),
        Axis::AncestorOrSelf => {
            out.push(node);
            push_ancestors(doc, node, out);
        }
        Axis::FollowingSibling => push_following_siblings(doc, node, out),
        Axis::PrecedingSibling => push_preceding_siblings(doc, node, out),
        Axis::Following => push_following(doc, node, out),
        Axis::Preceding => push_preceding(doc, node, out),
        // the capability set carries no namespace nodes
        Axis::Namespace => {}
    }
}

/// Preorder descendants via an explicit stack.
fn push_descendants<D: DocumentAccess>(doc: &D, node: D::Node, out: &mut Vec<D::Node>) {
    let mut stack: Vec<D::Node> = doc.children(node).collect();
    stack.reverse();
    while let Some(n) = stack.pop() {
        out.push(n);
        let mark = stack.len();
        stack.extend(doc.children(n));
        stack[mark..].reverse();
    }
}

fn push_ancestors<D: DocumentAccess>(doc: &D, node: D::Node, out: &mut Vec<D::Node>) {
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        out.push(parent);
        current = parent;
    }
}

fn push_following_siblings<D: DocumentAccess>(doc: &D, node: D::Node, out: &mut Vec<D::Node>) {
    // attributes are not children of their element; they have no siblings
    if doc.node_kind(node) == NodeKind::Attribute {
        return;
    }
    let Some(parent) = doc.parent(node) else { return };
    let mut seen = false;
    for child in doc.children(parent) {
        if seen {
            out.push(child);
        }
        if child == node {
            seen = true;
        }
    }
}

fn push_preceding_siblings<D: DocumentAccess>(doc: &D, node: D::Node, out: &mut Vec<D::Node>) {
    if doc.node_kind(node) == NodeKind::Attribute {
        return;
    }
    let Some(parent) = doc.parent(node) else { return };
    let mark = out.len();
    for child in doc.children(parent) {
        if child == node {
            break;
        }
        out.push(child);
    }
    // nearest sibling first
    out[mark..].reverse();
}

/// Everything after `node` in document order, minus its own descendants:
/// for each ancestor-or-self, the following siblings with their subtrees.
fn push_following<D: DocumentAccess>(doc: &D, node: D::Node, out: &mut Vec<D::Node>) {
    let mut current = node;
    if doc.node_kind(node) == NodeKind::Attribute {
        // an attribute precedes its element's content
        if let Some(element) = doc.parent(node) {
            push_descendants(doc, element, out);
            current = element;
        }
    }
    loop {
        let Some(parent) = doc.parent(current) else { break };
        let mut seen = false;
        for child in doc.children(parent) {
            if seen {
                out.push(child);
                push_descendants(doc, child, out);
            }
            if child == current {
                seen = true;
            }
        }
        current = parent;
    }
}

/// Everything before `node` in document order, minus ancestors, nearest
/// first: preceding siblings' subtrees in reverse preorder, walking up.
fn push_preceding<D: DocumentAccess>(doc: &D, node: D::Node, out: &mut Vec<D::Node>) {
    let mut current = match doc.node_kind(node) {
        NodeKind::Attribute => match doc.parent(node) {
            Some(element) => element,
            None => return,
        },
        _ => node,
    };
    loop {
        let Some(parent) = doc.parent(current) else { break };
        let mut before: Vec<D::Node> = Vec::new();
        for child in doc.children(parent) {
            if child == current {
                break;
            }
            before.push(child);
        }
        for sibling in before.into_iter().rev() {
            let mark = out.len();
            out.push(sibling);
            push_descendants(doc, sibling, out);
            out[mark..].reverse();
        }
        current = parent;
    }
}
