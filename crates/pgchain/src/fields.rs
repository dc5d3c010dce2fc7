//! Best-effort extraction of result field names from a SELECT
//! projection expression.
//!
//! Handles `AS` aliases, `table.column` qualification, function calls
//! and `DISTINCT` / `DISTINCT ON (...)` prefixes. This is not a SQL
//! parser; it only needs to be good enough to hand projected names to a
//! row mapper.

/// Extract the output field names of a projection expression.
///
/// ```
/// use pgchain::fields::projection_fields;
///
/// let names = projection_fields("DISTINCT ON (u.id) u.id, name AS n, count(*) AS total");
/// assert_eq!(names, vec!["id", "n", "total"]);
/// ```
pub fn projection_fields(expr: &str) -> Vec<String> {
    let body = strip_distinct(expr.trim());
    split_top_level(body)
        .into_iter()
        .map(field_name)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Drop a leading `DISTINCT` or `DISTINCT ON (...)`.
fn strip_distinct(expr: &str) -> &str {
    let upper = expr.to_ascii_uppercase();
    if let Some(rest) = upper.strip_prefix("DISTINCT ON") {
        let skipped = expr.len() - rest.len();
        // Skip the parenthesized target list.
        let tail = &expr[skipped..];
        let mut depth = 0_i32;
        for (i, ch) in tail.char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return tail[i + 1..].trim_start();
                    }
                }
                _ => {}
            }
        }
        return "";
    }
    if upper.starts_with("DISTINCT ") {
        return expr["DISTINCT ".len()..].trim_start();
    }
    expr
}

/// Split on commas outside parentheses.
fn split_top_level(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0_usize;
    for (i, ch) in expr.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(expr[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = expr[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Resolve one projection item to its output name.
fn field_name(item: &str) -> String {
    if let Some(alias) = top_level_alias(item) {
        return unquote(alias);
    }
    if item == "*" {
        return "*".to_string();
    }
    if let Some(paren) = item.find('(') {
        // Unaliased function call: Postgres names the column after the
        // function.
        return unquote(item[..paren].trim()).to_lowercase();
    }
    match item.rfind('.') {
        Some(dot) => unquote(item[dot + 1..].trim()),
        None => unquote(item),
    }
}

/// Find the text after the last top-level ` AS ` (case-insensitive).
fn top_level_alias(item: &str) -> Option<&str> {
    let upper = item.to_ascii_uppercase();
    let bytes = upper.as_bytes();
    let mut depth = 0_i32;
    let mut found = None;
    let mut i = 0_usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b' ' if depth == 0 && upper[i..].starts_with(" AS ") => {
                found = Some(i + 4);
            }
            _ => {}
        }
        i += 1;
    }
    found.map(|at| item[at..].trim())
}

fn unquote(name: &str) -> String {
    name.trim_matches('"').to_string()
}
