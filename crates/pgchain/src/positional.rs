//! Final placeholder pass: `?` input markers to `$n` positional
//! parameters.

use crate::error::{ChainError, ChainResult};

/// Replace every unescaped `?` in `sql` with `$1..$n`, unescape `\?`
/// to a literal `?`, and verify the marker count matches `args`.
pub(crate) fn to_positional(sql: &str, args: usize) -> ChainResult<String> {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut markers = 0_usize;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&'?') {
            chars.next();
            out.push('?');
            continue;
        }
        if ch == '?' {
            markers += 1;
            out.push('$');
            out.push_str(&markers.to_string());
            continue;
        }
        out.push(ch);
    }

    if markers != args {
        return Err(ChainError::PlaceholderMismatch { markers, args });
    }
    Ok(out)
}
