// https://www.w3.org/TR/xpath-10/#section-String-Functions

use crate::doc::DocumentAccess;
use crate::error::Result;
use crate::eval::EvalContext;
use crate::value::Value;

use super::numeric::xpath_round;

pub(super) fn string<D: DocumentAccess>(
    doc: &D,
    ctx: &EvalContext<D::Node>,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let s = match values.first() {
        Some(v) => v.to_string_value(doc),
        None => doc.string_value(ctx.node),
    };
    Ok(Value::String(s))
}

pub(super) fn concat<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let mut out = String::new();
    for v in values {
        out.push_str(&v.to_string_value(doc));
    }
    Ok(Value::String(out))
}

pub(super) fn starts_with<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let haystack = values[0].to_string_value(doc);
    let prefix = values[1].to_string_value(doc);
    Ok(Value::Boolean(haystack.starts_with(&prefix)))
}

pub(super) fn contains<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let haystack = values[0].to_string_value(doc);
    let needle = values[1].to_string_value(doc);
    Ok(Value::Boolean(haystack.contains(&needle)))
}

pub(super) fn substring_before<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let haystack = values[0].to_string_value(doc);
    let needle = values[1].to_string_value(doc);
    let out = haystack
        .find(&needle)
        .map(|i| haystack[..i].to_string())
        .unwrap_or_default();
    Ok(Value::String(out))
}

pub(super) fn substring_after<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let haystack = values[0].to_string_value(doc);
    let needle = values[1].to_string_value(doc);
    let out = haystack
        .find(&needle)
        .map(|i| haystack[i + needle.len()..].to_string())
        .unwrap_or_default();
    Ok(Value::String(out))
}

/// Character positions are 1-based and the boundaries are `round()`ed,
/// so `substring('12345', 1.5, 2.6)` is `'234'`. NaN boundaries select
/// nothing because the comparisons below are false.
pub(super) fn substring<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let s = values[0].to_string_value(doc);
    let begin = xpath_round(values[1].to_number(doc));
    let end = match values.get(2) {
        Some(length) => begin + xpath_round(length.to_number(doc)),
        None => f64::INFINITY,
    };
    let out: String = s
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let position = (i + 1) as f64;
            position >= begin && position < end
        })
        .map(|(_, c)| c)
        .collect();
    Ok(Value::String(out))
}

pub(super) fn string_length<D: DocumentAccess>(
    doc: &D,
    ctx: &EvalContext<D::Node>,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let s = match values.first() {
        Some(v) => v.to_string_value(doc),
        None => doc.string_value(ctx.node),
    };
    Ok(Value::Number(s.chars().count() as f64))
}

pub(super) fn normalize_space<D: DocumentAccess>(
    doc: &D,
    ctx: &EvalContext<D::Node>,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let s = match values.first() {
        Some(v) => v.to_string_value(doc),
        None => doc.string_value(ctx.node),
    };
    let out = s
        .split(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Value::String(out))
}

/// Map characters of the first argument through the second/third: chars
/// present in `from` are replaced by the char at the same position in
/// `to`, or removed when `to` is shorter.
pub(super) fn translate<D: DocumentAccess>(
    doc: &D,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let s = values[0].to_string_value(doc);
    let from: Vec<char> = values[1].to_string_value(doc).chars().collect();
    let to: Vec<char> = values[2].to_string_value(doc).chars().collect();
    let out: String = s
        .chars()
        .filter_map(|c| match from.iter().position(|f| *f == c) {
            // first occurrence in `from` wins
            Some(i) => to.get(i).copied(),
            None => Some(c),
        })
        .collect();
    Ok(Value::String(out))
}
