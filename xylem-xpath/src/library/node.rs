// https://www.w3.org/TR/xpath-10/#section-Node-Set-Functions

use crate::doc::DocumentAccess;
use crate::error::{Error, Result};
use crate::eval::EvalContext;
use crate::value::Value;

pub(super) fn count<N: Copy>(values: &[Value<N>]) -> Result<Value<N>> {
    let nodes = node_set(&values[0], "count")?;
    Ok(Value::Number(nodes.len() as f64))
}

pub(super) fn local_name<D: DocumentAccess>(
    doc: &D,
    ctx: &EvalContext<D::Node>,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let target = target_node(doc, ctx, values, "local-name")?;
    Ok(Value::String(
        target.map(|n| doc.local_name(n)).unwrap_or_default(),
    ))
}

pub(super) fn namespace_uri<D: DocumentAccess>(
    doc: &D,
    ctx: &EvalContext<D::Node>,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let target = target_node(doc, ctx, values, "namespace-uri")?;
    Ok(Value::String(
        target
            .and_then(|n| doc.namespace_uri(n))
            .unwrap_or_default(),
    ))
}

pub(super) fn name<D: DocumentAccess>(
    doc: &D,
    ctx: &EvalContext<D::Node>,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let target = target_node(doc, ctx, values, "name")?;
    Ok(Value::String(
        target.map(|n| doc.name(n)).unwrap_or_default(),
    ))
}

/// The optional-argument convention: no argument means the context node,
/// an argument must be a node-set whose first node is used (or none when
/// empty).
fn target_node<D: DocumentAccess>(
    _doc: &D,
    ctx: &EvalContext<D::Node>,
    values: &[Value<D::Node>],
    name: &str,
) -> Result<Option<D::Node>> {
    match values.first() {
        None => Ok(Some(ctx.node)),
        Some(v) => Ok(node_set(v, name)?.first().copied()),
    }
}

fn node_set<'v, N: Copy>(value: &'v Value<N>, name: &str) -> Result<&'v Vec<N>> {
    match value {
        Value::NodeSet(nodes) => Ok(nodes),
        _ => Err(Error::eval(format!("{name}() requires a node-set argument"))),
    }
}
