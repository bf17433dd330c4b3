// https://www.w3.org/TR/xpath-10/#section-Boolean-Functions

use crate::doc::{DocumentAccess, NodeKind};
use crate::error::Result;
use crate::eval::EvalContext;
use crate::value::Value;

pub(super) fn boolean<N: Copy>(values: &[Value<N>]) -> Result<Value<N>> {
    Ok(Value::Boolean(values[0].to_boolean()))
}

pub(super) fn not<N: Copy>(values: &[Value<N>]) -> Result<Value<N>> {
    Ok(Value::Boolean(!values[0].to_boolean()))
}

/// True when the language of the context node — the `xml:lang` attribute
/// on it or its nearest carrying ancestor — is the argument or a
/// hyphenated subtag of it, case-insensitively: `lang('en')` accepts
/// `en` and `en-US` but not `ens`.
pub(super) fn lang<D: DocumentAccess>(
    doc: &D,
    ctx: &EvalContext<D::Node>,
    values: &[Value<D::Node>],
) -> Result<Value<D::Node>> {
    let target = values[0].to_string_value(doc);
    let mut current = Some(ctx.node);
    while let Some(node) = current {
        if doc.node_kind(node) == NodeKind::Element {
            for attr in doc.attributes(node) {
                if doc.name(attr) == "xml:lang" {
                    let value = doc.string_value(attr);
                    return Ok(Value::Boolean(lang_matches(&value, &target)));
                }
            }
        }
        current = doc.parent(node);
    }
    Ok(Value::Boolean(false))
}

fn lang_matches(value: &str, target: &str) -> bool {
    if value.eq_ignore_ascii_case(target) {
        return true;
    }
    value.len() > target.len()
        && value.as_bytes()[target.len()] == b'-'
        && value[..target.len()].eq_ignore_ascii_case(target)
}

#[cfg(test)]
mod tests {
    use super::lang_matches;

    #[test]
    fn language_range_matching() {
        assert!(lang_matches("en", "en"));
        assert!(lang_matches("EN", "en"));
        assert!(lang_matches("en-US", "en"));
        assert!(lang_matches("en-GB", "EN"));
        assert!(!lang_matches("ens", "en"));
        assert!(!lang_matches("fr", "en"));
        assert!(!lang_matches("e", "en"));
    }
}
