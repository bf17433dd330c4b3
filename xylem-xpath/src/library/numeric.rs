// https://www.w3.org/TR/xpath-10/#section-Number-Functions

use crate::doc::DocumentAccess;
use crate::error::{Error, Result};
use crate::eval::EvalContext;
use crate::value::{number_from_str, Value};

pub(super) fn number<D: DocumentAccess>(
    doc: &D,
    ctx: &EvalContext<D::Node>,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let n = match values.first() {
        Some(v) => v.to_number(doc),
        None => number_from_str(&doc.string_value(ctx.node)),
    };
    Ok(Value::Number(n))
}

pub(super) fn sum<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let Value::NodeSet(nodes) = &values[0] else {
        return Err(Error::eval("sum() requires a node-set argument"));
    };
    let total = nodes
        .iter()
        .map(|n| number_from_str(&doc.string_value(*n)))
        .sum();
    Ok(Value::Number(total))
}

pub(super) fn floor<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    Ok(Value::Number(values[0].to_number(doc).floor()))
}

pub(super) fn ceiling<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    Ok(Value::Number(values[0].to_number(doc).ceil()))
}

pub(super) fn round<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    Ok(Value::Number(xpath_round(values[0].to_number(doc))))
}

/// XPath rounds halves toward positive infinity; NaN and the infinities
/// pass through.
pub(crate) fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::xpath_round;

    #[test]
    fn rounding_goes_up_at_halves() {
        assert_eq!(xpath_round(2.5), 3.0);
        assert_eq!(xpath_round(-2.5), -2.0);
        assert_eq!(xpath_round(2.4), 2.0);
        assert_eq!(xpath_round(-2.6), -3.0);
        assert!(xpath_round(f64::NAN).is_nan());
        assert_eq!(xpath_round(f64::INFINITY), f64::INFINITY);
    }
}
