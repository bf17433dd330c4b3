//! AST → compiled form.
//!
//! Compilation is a structural transform: axes and node tests come over
//! resolved from the parser, predicate sub-expressions are compiled
//! individually, and the two predicate shapes worth special-casing are
//! detected here so the evaluator can skip full expression dispatch:
//! `[@name = 'literal']` and `[integer]`.

use xylem_xpath_ast::{self as ast, Axis, BinaryOp, NodeTest};

#[derive(Debug)]
pub(crate) enum Compiled {
    Path {
        absolute: bool,
        steps: Vec<CompiledStep>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Compiled>,
        rhs: Box<Compiled>,
    },
    Negate(Box<Compiled>),
    LiteralString(String),
    LiteralNumber(f64),
    FunctionCall {
        name: String,
        args: Vec<Compiled>,
    },
    VariableRef(String),
    Filter {
        primary: Box<Compiled>,
        predicates: Vec<Pred>,
        steps: Vec<CompiledStep>,
    },
}

#[derive(Debug)]
pub(crate) struct CompiledStep {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Pred>,
}

#[derive(Debug)]
pub(crate) enum Pred {
    /// `[n]`: keep only the node at that 1-based position.
    Position(usize),
    /// `[@name = 'literal']`: one attribute read and a comparison.
    AttrEquals { name: String, value: String },
    Expr(Compiled),
}

pub(crate) fn compile(expr: &ast::Expr) -> Compiled {
    match expr {
        ast::Expr::Path(path) => Compiled::Path {
            absolute: path.absolute,
            steps: path.steps.iter().map(compile_step).collect(),
        },
        ast::Expr::Binary { op, lhs, rhs } => Compiled::Binary {
            op: *op,
            lhs: Box::new(compile(lhs)),
            rhs: Box::new(compile(rhs)),
        },
        ast::Expr::Negate(inner) => Compiled::Negate(Box::new(compile(inner))),
        ast::Expr::Literal(ast::Literal::String(s)) => Compiled::LiteralString(s.clone()),
        ast::Expr::Literal(ast::Literal::Number(n)) => Compiled::LiteralNumber(*n),
        ast::Expr::FunctionCall { name, args } => Compiled::FunctionCall {
            name: name.clone(),
            args: args.iter().map(compile).collect(),
        },
        ast::Expr::VariableRef(name) => Compiled::VariableRef(name.clone()),
        ast::Expr::Filter {
            primary,
            predicates,
            steps,
        } => Compiled::Filter {
            primary: Box::new(compile(primary)),
            predicates: predicates.iter().map(compile_predicate).collect(),
            steps: steps.iter().map(compile_step).collect(),
        },
    }
}

fn compile_step(step: &ast::Step) -> CompiledStep {
    CompiledStep {
        axis: step.axis,
        test: step.node_test.clone(),
        predicates: step.predicates.iter().map(compile_predicate).collect(),
    }
}

fn compile_predicate(expr: &ast::Expr) -> Pred {
    if let ast::Expr::Literal(ast::Literal::Number(n)) = expr {
        if n.fract() == 0.0 && *n >= 1.0 && *n <= u32::MAX as f64 {
            return Pred::Position(*n as usize);
        }
    }
    if let ast::Expr::Binary {
        op: BinaryOp::Eq,
        lhs,
        rhs,
    } = expr
    {
        if let Some(fast) = attr_equals(lhs, rhs).or_else(|| attr_equals(rhs, lhs)) {
            return fast;
        }
    }
    Pred::Expr(compile(expr))
}

/// `@name = 'literal'` in either operand order.
fn attr_equals(path: &ast::Expr, literal: &ast::Expr) -> Option<Pred> {
    let ast::Expr::Literal(ast::Literal::String(value)) = literal else {
        return None;
    };
    let ast::Expr::Path(path) = path else {
        return None;
    };
    if path.absolute || path.steps.len() != 1 {
        return None;
    }
    let step = &path.steps[0];
    if step.axis != Axis::Attribute || !step.predicates.is_empty() {
        return None;
    }
    let NodeTest::Name {
        prefix: None,
        local,
    } = &step.node_test
    else {
        return None;
    };
    Some(Pred::AttrEquals {
        name: local.clone(),
        value: value.clone(),
    })
}
