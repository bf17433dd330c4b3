//! The XPath 1.0 core function library.
//!
//! Dispatch is by name over eagerly evaluated arguments;
//! `position()`/`last()` read the context instead. Implementations live
//! in one file per category.

mod boolean;
mod node;
mod numeric;
mod string;

use crate::compile::Compiled;
use crate::doc::DocumentAccess;
use crate::error::{Error, Result};
use crate::eval::{evaluate, EvalContext};
use crate::value::Value;

pub(crate) fn call<D: DocumentAccess>(
    doc: &D,
    name: &str,
    args: &[Compiled],
    ctx: &EvalContext<D::Node>,
) -> Result<Value<D::Node>> {
    match name {
        "position" => {
            arity(name, args.len(), 0, 0)?;
            return Ok(Value::Number(ctx.position as f64));
        }
        "last" => {
            arity(name, args.len(), 0, 0)?;
            return Ok(Value::Number(ctx.size as f64));
        }
        _ => {}
    }
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate(doc, arg, ctx)?);
    }
    let values = values.as_slice();
    match name {
        // node-set
        "count" => {
            arity(name, values.len(), 1, 1)?;
            node::count(values)
        }
        "local-name" => {
            arity(name, values.len(), 0, 1)?;
            node::local_name(doc, ctx, values)
        }
        "namespace-uri" => {
            arity(name, values.len(), 0, 1)?;
            node::namespace_uri(doc, ctx, values)
        }
        "name" => {
            arity(name, values.len(), 0, 1)?;
            node::name(doc, ctx, values)
        }
        "id" => Err(Error::eval(
            "id() is not supported: DTDs are not processed",
        )),

        // string
        "string" => {
            arity(name, values.len(), 0, 1)?;
            string::string(doc, ctx, values)
        }
        "concat" => {
            if values.len() < 2 {
                return Err(Error::eval("concat() requires at least two arguments"));
            }
            string::concat(doc, values)
        }
        "starts-with" => {
            arity(name, values.len(), 2, 2)?;
            string::starts_with(doc, values)
        }
        "contains" => {
            arity(name, values.len(), 2, 2)?;
            string::contains(doc, values)
        }
        "substring-before" => {
            arity(name, values.len(), 2, 2)?;
            string::substring_before(doc, values)
        }
        "substring-after" => {
            arity(name, values.len(), 2, 2)?;
            string::substring_after(doc, values)
        }
        "substring" => {
            arity(name, values.len(), 2, 3)?;
            string::substring(doc, values)
        }
        "string-length" => {
            arity(name, values.len(), 0, 1)?;
            string::string_length(doc, ctx, values)
        }
        "normalize-space" => {
            arity(name, values.len(), 0, 1)?;
            string::normalize_space(doc, ctx, values)
        }
        "translate" => {
            arity(name, values.len(), 3, 3)?;
            string::translate(doc, values)
        }

        // boolean
        "boolean" => {
            arity(name, values.len(), 1, 1)?;
            boolean::boolean(values)
        }
        "not" => {
            arity(name, values.len(), 1, 1)?;
            boolean::not(values)
        }
        "true" => {
            arity(name, values.len(), 0, 0)?;
            Ok(Value::Boolean(true))
        }
        "false" => {
            arity(name, values.len(), 0, 0)?;
            Ok(Value::Boolean(false))
        }
        "lang" => {
            arity(name, values.len(), 1, 1)?;
            boolean::lang(doc, ctx, values)
        }

        // number
        "number" => {
            arity(name, values.len(), 0, 1)?;
            numeric::number(doc, ctx, values)
        }
        "sum" => {
            arity(name, values.len(), 1, 1)?;
            numeric::sum(doc, values)
        }
        "floor" => {
            arity(name, values.len(), 1, 1)?;
            numeric::floor(doc, values)
        }
        "ceiling" => {
            arity(name, values.len(), 1, 1)?;
            numeric::ceiling(doc, values)
        }
        "round" => {
            arity(name, values.len(), 1, 1)?;
            numeric::round(doc, values)
        }

        _ => Err(Error::eval(format!("unknown function {name}()"))),
    }
}

fn arity(name: &str, got: usize, min: usize, max: usize) -> Result<()> {
    if got < min || got > max {
        return Err(Error::eval(format!(
            "{name}() called with {got} arguments, expected {min}..={max}"
        )));
    }
    Ok(())
}
