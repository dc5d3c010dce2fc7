//! Argument expansion.
//!
//! Rewrites a fragment's `?` marker sequence and argument list so that
//! the stored fragment text is final: slice arguments become one marker
//! per element, NULLs become the literal `NULL`, sub-queries are spliced
//! in as raw parenthesized SQL, and escaped `\?` markers pass through
//! untouched. Runs once, at the moment a fragment is attached to a
//! chain.

use crate::error::ChainResult;
use crate::value::Value;

/// Expand `text` against `args`.
///
/// Returns the rewritten text and the flattened scalar argument list.
/// Markers without a matching argument are left in place; the final
/// positional pass reports the imbalance.
pub(crate) fn expand_markers(text: &str, args: Vec<Value>) -> ChainResult<(String, Vec<Value>)> {
    let mut out = String::with_capacity(text.len());
    let mut flat = Vec::with_capacity(args.len());
    let mut args = args.into_iter();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&'?') {
            chars.next();
            out.push_str("\\?");
            continue;
        }
        if ch != '?' {
            out.push(ch);
            continue;
        }
        match args.next() {
            None => out.push('?'),
            Some(value) => expand_slot(value, &mut out, &mut flat)?,
        }
    }

    // Surplus arguments keep their position so the count check can see them.
    flat.extend(args);
    Ok((out, flat))
}

/// Expand a single marker's argument into text and flattened arguments.
///
/// Shared between fragment expansion and the INSERT/UPDATE map paths so
/// a value behaves identically wherever it is bound.
pub(crate) fn expand_slot(
    value: Value,
    out: &mut String,
    flat: &mut Vec<Value>,
) -> ChainResult<()> {
    match value {
        Value::Null => out.push_str("NULL"),
        Value::Array(items) => {
            if items.is_empty() {
                // An empty group would render `IN ()`, which is not SQL.
                out.push_str("NULL");
            } else {
                for (i, item) in items.into_iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push('?');
                    flat.push(item);
                }
            }
        }
        Value::Subquery(chain) => {
            let (sub_sql, sub_args) = chain.render_raw()?;
            out.push('(');
            out.push_str(&sub_sql);
            out.push(')');
            flat.extend(sub_args);
        }
        scalar => {
            out.push('?');
            flat.push(scalar);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_pass_through() {
        let (text, args) =
            expand_markers("a = ? AND b = ?", vec![Value::I32(1), Value::from("x")]).unwrap();
        assert_eq!(text, "a = ? AND b = ?");
        assert_eq!(args, vec![Value::I32(1), Value::Text("x".to_string())]);
    }

    #[test]
    fn null_inlined_and_dropped() {
        let (text, args) = expand_markers("a = ?", vec![Value::Null]).unwrap();
        assert_eq!(text, "a = NULL");
        assert!(args.is_empty());
    }

    #[test]
    fn array_expands_into_group() {
        let (text, args) = expand_markers(
            "id IN (?)",
            vec![Value::from(vec![1_i64, 2, 3])],
        )
        .unwrap();
        assert_eq!(text, "id IN (?, ?, ?)");
        assert_eq!(args, vec![Value::I64(1), Value::I64(2), Value::I64(3)]);
    }

    #[test]
    fn empty_array_renders_null() {
        let (text, args) = expand_markers("id IN (?)", vec![Value::Array(vec![])]).unwrap();
        assert_eq!(text, "id IN (NULL)");
        assert!(args.is_empty());
    }

    #[test]
    fn bytes_stay_scalar() {
        let (text, args) = expand_markers("b = ?", vec![Value::Bytes(vec![0xAA])]).unwrap();
        assert_eq!(text, "b = ?");
        assert_eq!(args, vec![Value::Bytes(vec![0xAA])]);
    }

    #[test]
    fn escaped_marker_consumes_nothing() {
        let (text, args) =
            expand_markers("data \\? col = ?", vec![Value::from("x")]).unwrap();
        assert_eq!(text, "data \\? col = ?");
        assert_eq!(args, vec![Value::Text("x".to_string())]);
    }

    #[test]
    fn missing_args_leave_markers() {
        let (text, args) = expand_markers("a = ? AND b = ?", vec![Value::I32(1)]).unwrap();
        assert_eq!(text, "a = ? AND b = ?");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn surplus_args_kept_for_count_check() {
        let (text, args) =
            expand_markers("a = ?", vec![Value::I32(1), Value::I32(2)]).unwrap();
        assert_eq!(text, "a = ?");
        assert_eq!(args.len(), 2);
    }
}
