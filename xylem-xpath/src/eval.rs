//! Expression evaluation.
//!
//! A context is `(node, position, size)`. Location paths thread a node
//! set through their steps: each seed produces axis candidates, the node
//! test filters them, predicates run left to right counting positions in
//! axis order, and results from multiple seeds are merged back into
//! document order without duplicates.

use ahash::{HashSet, HashSetExt};
use xylem_xpath_ast::{Axis, BinaryOp, NodeTest};

use crate::axis;
use crate::compile::{Compiled, CompiledStep, Pred};
use crate::doc::{DocumentAccess, NodeKind};
use crate::error::{Error, Result};
use crate::library;
use crate::value::{number_from_str, Value};

#[derive(Debug, Clone, Copy)]
pub(crate) struct EvalContext<N> {
    pub node: N,
    pub position: usize,
    pub size: usize,
}

pub(crate) fn evaluate<D: DocumentAccess>(
    doc: &D,
    expr: &Compiled,
    ctx: &EvalContext<D::Node>,
) -> Result<Value<D::Node>> {
    match expr {
        Compiled::LiteralString(s) => Ok(Value::String(s.clone())),
        Compiled::LiteralNumber(n) => Ok(Value::Number(*n)),
        Compiled::VariableRef(name) => Err(Error::eval(format!(
            "variable ${name} is not supported: no variable bindings exist"
        ))),
        Compiled::Negate(inner) => Ok(Value::Number(-evaluate(doc, inner, ctx)?.to_number(doc))),
        Compiled::FunctionCall { name, args } => library::call(doc, name, args, ctx),
        Compiled::Binary { op, lhs, rhs } => eval_binary(doc, *op, lhs, rhs, ctx),
        Compiled::Path { absolute, steps } => {
            let start = if *absolute { doc.root() } else { ctx.node };
            Ok(Value::NodeSet(eval_steps(doc, steps, vec![start])?))
        }
        Compiled::Filter {
            primary,
            predicates,
            steps,
        } => {
            let Value::NodeSet(nodes) = evaluate(doc, primary, ctx)? else {
                return Err(Error::eval("predicates and path steps require a node-set"));
            };
            let nodes = apply_predicates(doc, predicates, nodes)?;
            Ok(Value::NodeSet(eval_steps(doc, steps, nodes)?))
        }
    }
}

fn eval_binary<D: DocumentAccess>(
    doc: &D,
    op: BinaryOp,
    lhs: &Compiled,
    rhs: &Compiled,
    ctx: &EvalContext<D::Node>,
) -> Result<Value<D::Node>> {
    match op {
        BinaryOp::Or => Ok(Value::Boolean(
            evaluate(doc, lhs, ctx)?.to_boolean() || evaluate(doc, rhs, ctx)?.to_boolean(),
        )),
        BinaryOp::And => Ok(Value::Boolean(
            evaluate(doc, lhs, ctx)?.to_boolean() && evaluate(doc, rhs, ctx)?.to_boolean(),
        )),
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => {
            let l = evaluate(doc, lhs, ctx)?;
            let r = evaluate(doc, rhs, ctx)?;
            Ok(Value::Boolean(compare_values(doc, op, &l, &r)))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let l = evaluate(doc, lhs, ctx)?.to_number(doc);
            let r = evaluate(doc, rhs, ctx)?.to_number(doc);
            let n = match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                _ => l % r,
            };
            Ok(Value::Number(n))
        }
        BinaryOp::Union => {
            let l = evaluate(doc, lhs, ctx)?;
            let r = evaluate(doc, rhs, ctx)?;
            let (Value::NodeSet(mut a), Value::NodeSet(b)) = (l, r) else {
                return Err(Error::eval("both operands of | must be node-sets"));
            };
            a.extend(b);
            sort_document_order(doc, &mut a);
            Ok(Value::NodeSet(a))
        }
    }
}

/// Dedup by node identity, then order by document position.
pub(crate) fn sort_document_order<D: DocumentAccess>(doc: &D, nodes: &mut Vec<D::Node>) {
    let mut seen = HashSet::with_capacity(nodes.len());
    nodes.retain(|n| seen.insert(*n));
    nodes.sort_by(|a, b| doc.document_order(*a, *b));
}

fn eval_steps<D: DocumentAccess>(
    doc: &D,
    steps: &[CompiledStep],
    mut current: Vec<D::Node>,
) -> Result<Vec<D::Node>> {
    for step in steps {
        let multi_seed = current.len() > 1;
        let mut next = Vec::new();
        for &seed in &current {
            let mut candidates = Vec::new();
            axis::axis_nodes(doc, step.axis, seed, &mut candidates);
            candidates.retain(|n| node_test_matches(doc, step.axis, &step.test, *n));
            next.extend(apply_predicates(doc, &step.predicates, candidates)?);
        }
        // per-seed results are in axis order; normalize whenever that is
        // not already deduplicated document order
        if multi_seed || step.axis.is_reverse() {
            sort_document_order(doc, &mut next);
        }
        current = next;
    }
    Ok(current)
}

fn apply_predicates<D: DocumentAccess>(
    doc: &D,
    predicates: &[Pred],
    mut nodes: Vec<D::Node>,
) -> Result<Vec<D::Node>> {
    for pred in predicates {
        let size = nodes.len();
        let mut kept = Vec::new();
        for (i, &node) in nodes.iter().enumerate() {
            if pred_matches(doc, pred, node, i + 1, size)? {
                kept.push(node);
            }
        }
        nodes = kept;
    }
    Ok(nodes)
}

fn pred_matches<D: DocumentAccess>(
    doc: &D,
    pred: &Pred,
    node: D::Node,
    position: usize,
    size: usize,
) -> Result<bool> {
    match pred {
        Pred::Position(n) => Ok(position == *n),
        Pred::AttrEquals { name, value } => {
            for attr in doc.attributes(node) {
                if doc.name(attr) == *name {
                    return Ok(doc.string_value(attr) == *value);
                }
            }
            Ok(false)
        }
        Pred::Expr(expr) => {
            let ctx = EvalContext {
                node,
                position,
                size,
            };
            match evaluate(doc, expr, &ctx)? {
                // a numeric predicate selects by position
                Value::Number(n) => Ok(position as f64 == n),
                v => Ok(v.to_boolean()),
            }
        }
    }
}

fn node_test_matches<D: DocumentAccess>(
    doc: &D,
    axis: Axis,
    test: &NodeTest,
    node: D::Node,
) -> bool {
    let kind = doc.node_kind(node);
    let principal = if axis == Axis::Attribute {
        NodeKind::Attribute
    } else {
        NodeKind::Element
    };
    match test {
        NodeTest::Star => kind == principal,
        NodeTest::PrefixStar(prefix) => {
            kind == principal && doc.prefix(node).as_deref() == Some(prefix.as_str())
        }
        NodeTest::Name { prefix, local } => {
            kind == principal
                && doc.local_name(node) == *local
                && doc.prefix(node).as_deref() == prefix.as_deref()
        }
        NodeTest::Text => kind == NodeKind::Text,
        NodeTest::Comment => kind == NodeKind::Comment,
        NodeTest::Node => true,
        NodeTest::ProcessingInstruction(target) => {
            kind == NodeKind::ProcessingInstruction
                && target.as_ref().map_or(true, |t| doc.name(node) == *t)
        }
    }
}

/// The XPath 1.0 comparison matrix. Node-sets compare existentially;
/// booleans dominate equality, then numbers, then strings; the relational
/// operators always go through numbers except between two node-sets'
/// string-values, which also go through numbers.
fn compare_values<D: DocumentAccess>(
    doc: &D,
    op: BinaryOp,
    lhs: &Value<D::Node>,
    rhs: &Value<D::Node>,
) -> bool {
    let equality = matches!(op, BinaryOp::Eq | BinaryOp::Ne);
    match (lhs, rhs) {
        (Value::NodeSet(a), Value::NodeSet(b)) => {
            if equality {
                let right: Vec<String> = b.iter().map(|n| doc.string_value(*n)).collect();
                a.iter().any(|n| {
                    let left = doc.string_value(*n);
                    right.iter().any(|r| cmp_strings(op, &left, r))
                })
            } else {
                let right: Vec<f64> = b
                    .iter()
                    .map(|n| number_from_str(&doc.string_value(*n)))
                    .collect();
                a.iter().any(|n| {
                    let left = number_from_str(&doc.string_value(*n));
                    right.iter().any(|r| cmp_numbers(op, left, *r))
                })
            }
        }
        (Value::NodeSet(nodes), Value::Boolean(b)) => cmp_booleans(op, !nodes.is_empty(), *b),
        (Value::Boolean(b), Value::NodeSet(nodes)) => cmp_booleans(op, *b, !nodes.is_empty()),
        (Value::NodeSet(nodes), scalar) => nodes
            .iter()
            .any(|n| cmp_node_scalar(doc, op, *n, scalar, false)),
        (scalar, Value::NodeSet(nodes)) => nodes
            .iter()
            .any(|n| cmp_node_scalar(doc, op, *n, scalar, true)),
        (l, r) => {
            if equality {
                if matches!(l, Value::Boolean(_)) || matches!(r, Value::Boolean(_)) {
                    cmp_booleans(op, l.to_boolean(), r.to_boolean())
                } else if matches!(l, Value::Number(_)) || matches!(r, Value::Number(_)) {
                    cmp_numbers(op, l.to_number(doc), r.to_number(doc))
                } else {
                    cmp_strings(op, &l.to_string_value(doc), &r.to_string_value(doc))
                }
            } else {
                cmp_numbers(op, l.to_number(doc), r.to_number(doc))
            }
        }
    }
}

fn cmp_node_scalar<D: DocumentAccess>(
    doc: &D,
    op: BinaryOp,
    node: D::Node,
    scalar: &Value<D::Node>,
    node_on_right: bool,
) -> bool {
    let equality = matches!(op, BinaryOp::Eq | BinaryOp::Ne);
    match scalar {
        Value::Number(x) => {
            let n = number_from_str(&doc.string_value(node));
            if node_on_right {
                cmp_numbers(op, *x, n)
            } else {
                cmp_numbers(op, n, *x)
            }
        }
        Value::String(s) => {
            if equality {
                cmp_strings(op, &doc.string_value(node), s)
            } else {
                let n = number_from_str(&doc.string_value(node));
                let x = number_from_str(s);
                if node_on_right {
                    cmp_numbers(op, x, n)
                } else {
                    cmp_numbers(op, n, x)
                }
            }
        }
        // booleans and node-sets are handled before this point
        _ => false,
    }
}

fn cmp_numbers(op: BinaryOp, a: f64, b: f64) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        _ => false,
    }
}

fn cmp_strings(op: BinaryOp, a: &str, b: &str) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        _ => cmp_numbers(op, number_from_str(a), number_from_str(b)),
    }
}

fn cmp_booleans(op: BinaryOp, a: bool, b: bool) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        _ => cmp_numbers(op, f64::from(a as u8), f64::from(b as u8)),
    }
}
