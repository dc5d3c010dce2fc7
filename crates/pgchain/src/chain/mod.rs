//! The expression chain: an ordered, owned accumulation of clause
//! fragments plus the distinguished single-valued fields, rendered on
//! demand into `(sql, args)`.
//!
//! The chain is a plain owned value: every fluent method consumes and
//! returns it, so there is no shared mutable state and no lock. Clone
//! the chain to hand an independent copy to another task.
//!
//! ```ignore
//! let (sql, args) = ExpressionChain::new()
//!     .select(&["id", "name"])
//!     .table("users")
//!     .and_where("age > ?", values![18])
//!     .order_by(&asc("name"))
//!     .limit(10)
//!     .render()?;
//! // SELECT id, name FROM users WHERE age > $1 ORDER BY name ASC LIMIT 10
//! ```

mod exec;
mod render;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::conflict::ConflictClause;
use crate::error::ChainResult;
use crate::expand::{expand_markers, expand_slot};
use crate::fields::projection_fields;
use crate::segment::{Combinator, JoinKind, Segment, SegmentKind};
use crate::value::Value;

/// Fluent SQL statement builder for the Postgres dialect.
///
/// Fragments take `?` input markers; [`render`](ExpressionChain::render)
/// produces `$1..$n` positional parameters and the matching argument
/// list. Invalid fluent calls never panic; they record a deferred error
/// that surfaces when the chain is rendered or executed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionChain {
    pub(crate) segments: Vec<Segment>,
    pub(crate) operation: Option<Segment>,
    pub(crate) table: String,
    pub(crate) limit: Option<Segment>,
    pub(crate) offset: Option<Segment>,
    pub(crate) conflict: Option<ConflictClause>,
    /// CTEs in declaration order; order is significant in the emitted SQL.
    pub(crate) ctes: Vec<(String, ExpressionChain)>,
    /// Pre-built `VALUES` row templates for INSERT / INSERT-MULTI.
    pub(crate) value_rows: Vec<String>,
    /// `{.alias}` substitutions, applied to fragment text at attach time.
    prefixes: Vec<(String, String)>,
    /// Deferred construction errors, surfaced at render time.
    pub(crate) build_errors: Vec<String>,
}

/// `column ASC` helper for [`ExpressionChain::order_by`].
pub fn asc(column: &str) -> String {
    format!("{} ASC", column)
}

/// `column DESC` helper for [`ExpressionChain::order_by`].
pub fn desc(column: &str) -> String {
    format!("{} DESC", column)
}

impl ExpressionChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== main operations ====================
    // Mutually exclusive; the last call wins.

    /// `SELECT <columns>`.
    pub fn select(mut self, columns: &[&str]) -> Self {
        let text = self.apply_prefixes(&columns.join(", "));
        self.operation = Some(Segment::new(SegmentKind::Select, text, Vec::new()));
        self
    }

    /// `DELETE FROM <table>`.
    pub fn delete(mut self) -> Self {
        self.operation = Some(Segment::new(SegmentKind::Delete, "", Vec::new()));
        self
    }

    /// `INSERT INTO <table> (...) VALUES (...)` from a column→value map.
    ///
    /// Keys are sorted lexicographically before the column and value
    /// lists are built, so two maps with the same logical pairs always
    /// render identical SQL and argument order.
    pub fn insert(mut self, row: HashMap<&str, Value>) -> Self {
        let mut columns: Vec<&str> = row.keys().copied().collect();
        columns.sort_unstable();

        let mut row = row;
        let mut args = Vec::with_capacity(columns.len());
        match self.build_value_row(&columns, &mut row, &mut args) {
            Ok(template) => {
                self.operation =
                    Some(Segment::new(SegmentKind::Insert, columns.join(", "), args));
                self.value_rows = vec![template];
            }
            Err(e) => self.defer_error(format!("insert: {}", e)),
        }
        self
    }

    /// `INSERT INTO <table> (...) VALUES (...), (...), ...`.
    ///
    /// All rows must share the key set of the first row; a mismatch is a
    /// deferred construction error.
    pub fn insert_multi(mut self, rows: Vec<HashMap<&str, Value>>) -> Self {
        let Some(first) = rows.first() else {
            self.defer_error("insert_multi: no rows given".to_string());
            return self;
        };
        let mut columns: Vec<&str> = first.keys().copied().collect();
        columns.sort_unstable();

        let mut args = Vec::with_capacity(columns.len() * rows.len());
        let mut templates = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() || !columns.iter().all(|c| row.contains_key(c)) {
                self.defer_error(format!(
                    "insert_multi: row {} does not match the column set of row 0",
                    i
                ));
                return self;
            }
            match self.build_value_row(&columns, &mut row, &mut args) {
                Ok(template) => templates.push(template),
                Err(e) => {
                    self.defer_error(format!("insert_multi: row {}: {}", i, e));
                    return self;
                }
            }
        }

        self.operation = Some(Segment::new(
            SegmentKind::InsertMulti,
            columns.join(", "),
            args,
        ));
        self.value_rows = templates;
        self
    }

    /// `UPDATE <table> SET <expr>` with a raw SET body.
    pub fn update(mut self, expr: &str, args: Vec<Value>) -> Self {
        let text = self.apply_prefixes(expr);
        match expand_markers(&text, args) {
            Ok((text, args)) => {
                self.operation = Some(Segment::new(SegmentKind::Update, text, args));
            }
            Err(e) => self.defer_error(format!("update: {}", e)),
        }
        self
    }

    /// `UPDATE <table> SET a = $1, b = $2, ...` from a column→value map,
    /// keys sorted lexicographically.
    pub fn update_map(mut self, fields: HashMap<&str, Value>) -> Self {
        let mut columns: Vec<&str> = fields.keys().copied().collect();
        columns.sort_unstable();

        let mut fields = fields;
        let mut args = Vec::with_capacity(columns.len());
        let mut body = String::new();
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                body.push_str(", ");
            }
            body.push_str(column);
            body.push_str(" = ");
            let value = fields.remove(*column).unwrap_or(Value::Null);
            if let Err(e) = expand_slot(value, &mut body, &mut args) {
                self.defer_error(format!("update_map: {}", e));
                return self;
            }
        }
        self.operation = Some(Segment::new(SegmentKind::Update, body, args));
        self
    }

    // ==================== singleton fields ====================

    /// Set the target table.
    pub fn table(mut self, name: &str) -> Self {
        self.table = name.to_string();
        self
    }

    /// Alias for [`table`](ExpressionChain::table).
    pub fn from(self, name: &str) -> Self {
        self.table(name)
    }

    /// `LIMIT n` (last write wins; the numeral is inlined, not a
    /// parameter).
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(Segment::new(
            SegmentKind::Limit,
            format!("LIMIT {}", n),
            Vec::new(),
        ));
        self
    }

    /// `OFFSET n` (last write wins).
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(Segment::new(
            SegmentKind::Offset,
            format!("OFFSET {}", n),
            Vec::new(),
        ));
        self
    }

    /// Attach an `ON CONFLICT` clause. A second call is a deferred
    /// construction error, not a silent overwrite.
    pub fn on_conflict(mut self, clause: ConflictClause) -> Self {
        if self.conflict.is_some() {
            self.defer_error("on_conflict may only be set once per chain".to_string());
        } else {
            self.conflict = Some(clause);
        }
        self
    }

    /// Declare a CTE: `WITH <name> AS (<chain>)`. Declaration order is
    /// preserved; redeclaring a name replaces its body in place.
    pub fn with(mut self, name: &str, chain: ExpressionChain) -> Self {
        if let Some(existing) = self.ctes.iter_mut().find(|(n, _)| n == name) {
            existing.1 = chain;
        } else {
            self.ctes.push((name.to_string(), chain));
        }
        self
    }

    /// Register a `{.alias}` substitution applied to all subsequently
    /// attached fragment text.
    pub fn table_alias(mut self, alias: &str, replacement: &str) -> Self {
        self.prefixes
            .push((alias.to_string(), replacement.to_string()));
        self
    }

    // ==================== predicates ====================

    /// Append a WHERE predicate combined with `AND`.
    pub fn and_where(self, expr: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Where, Combinator::And, expr, args)
    }

    /// Append a WHERE predicate combined with `OR`.
    pub fn or_where(self, expr: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Where, Combinator::Or, expr, args)
    }

    /// Append a WHERE predicate combined with `NOT`.
    pub fn not_where(self, expr: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Where, Combinator::Not, expr, args)
    }

    /// Append a WHERE predicate combined with `AND NOT`.
    pub fn and_not_where(self, expr: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Where, Combinator::AndNot, expr, args)
    }

    /// Append a WHERE predicate combined with `OR NOT`.
    pub fn or_not_where(self, expr: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Where, Combinator::OrNot, expr, args)
    }

    /// Append a HAVING predicate combined with `AND`.
    pub fn and_having(self, expr: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Having, Combinator::And, expr, args)
    }

    /// Append a HAVING predicate combined with `OR`.
    pub fn or_having(self, expr: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Having, Combinator::Or, expr, args)
    }

    /// Render the WHERE clause of `group` in isolation, wrap it in
    /// parentheses and append it as a single `AND` predicate. Enables
    /// arbitrary nesting of predicate groups.
    pub fn and_where_group(self, group: ExpressionChain) -> Self {
        self.where_group(Combinator::And, group)
    }

    /// Like [`and_where_group`](ExpressionChain::and_where_group) but
    /// combined with `OR`.
    pub fn or_where_group(self, group: ExpressionChain) -> Self {
        self.where_group(Combinator::Or, group)
    }

    fn where_group(mut self, combinator: Combinator, group: ExpressionChain) -> Self {
        match group.render_where_fragment() {
            Ok((body, args)) => {
                if !body.is_empty() {
                    self.segments.push(Segment::predicate(
                        SegmentKind::Where,
                        combinator,
                        format!("({})", body),
                        args,
                    ));
                }
            }
            Err(e) => self.defer_error(format!("where group: {}", e)),
        }
        self
    }

    // ==================== joins ====================
    // Insertion order is preserved across flavors.

    /// `JOIN <clause>`.
    pub fn join(self, clause: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Join(JoinKind::Plain), Combinator::None, clause, args)
    }

    /// `LEFT JOIN <clause>`.
    pub fn left_join(self, clause: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Join(JoinKind::Left), Combinator::None, clause, args)
    }

    /// `RIGHT JOIN <clause>`.
    pub fn right_join(self, clause: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Join(JoinKind::Right), Combinator::None, clause, args)
    }

    /// `INNER JOIN <clause>`.
    pub fn inner_join(self, clause: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Join(JoinKind::Inner), Combinator::None, clause, args)
    }

    /// `FULL JOIN <clause>`.
    pub fn full_join(self, clause: &str, args: Vec<Value>) -> Self {
        self.attach(SegmentKind::Join(JoinKind::Full), Combinator::None, clause, args)
    }

    // ==================== remaining clauses ====================

    /// Append a `GROUP BY` expression.
    pub fn group_by(self, expr: &str) -> Self {
        self.attach(SegmentKind::GroupBy, Combinator::None, expr, Vec::new())
    }

    /// Append an `ORDER BY` expression; see [`asc`] / [`desc`].
    pub fn order_by(self, expr: &str) -> Self {
        self.attach(SegmentKind::OrderBy, Combinator::None, expr, Vec::new())
    }

    /// Append a `RETURNING` expression. Valid on INSERT, UPDATE and
    /// DELETE chains; on SELECT it is a deferred error.
    pub fn returning(self, columns: &str) -> Self {
        self.attach(SegmentKind::Returning, Combinator::None, columns, Vec::new())
    }

    /// Append `UNION <chain>`.
    pub fn union(self, other: ExpressionChain) -> Self {
        self.union_inner(other, None)
    }

    /// Append `UNION ALL <chain>`.
    pub fn union_all(self, other: ExpressionChain) -> Self {
        self.union_inner(other, Some("ALL"))
    }

    fn union_inner(mut self, other: ExpressionChain, modifier: Option<&str>) -> Self {
        match other.render_raw() {
            Ok((sql, args)) => {
                let mut segment = Segment::new(SegmentKind::Union, sql, args);
                if let Some(m) = modifier {
                    segment = segment.with_modifier(m);
                }
                self.segments.push(segment);
            }
            Err(e) => self.defer_error(format!("union: {}", e)),
        }
        self
    }

    /// Append a trailing `FOR UPDATE`.
    pub fn for_update(mut self) -> Self {
        self.segments
            .push(Segment::new(SegmentKind::Suffix, "FOR UPDATE", Vec::new()));
        self
    }

    /// Append a table to the `FROM` list of an UPDATE statement
    /// (Postgres's join-via-FROM idiom). Distinct from the JOIN
    /// methods, which apply to SELECT/DELETE.
    pub fn from_update(self, table: &str) -> Self {
        self.attach(SegmentKind::FromUpdate, Combinator::None, table, Vec::new())
    }

    // ==================== inspection ====================

    /// Projected field names of a SELECT chain, for row mappers.
    pub fn projected_fields(&self) -> Vec<String> {
        match &self.operation {
            Some(op) if op.kind == SegmentKind::Select => projection_fields(&op.text),
            _ => Vec::new(),
        }
    }

    /// Deferred construction errors recorded so far.
    pub fn build_errors(&self) -> &[String] {
        &self.build_errors
    }

    // ==================== internals ====================

    /// Expand and attach a fragment. Expansion failures become deferred
    /// errors; fragment text is immutable afterwards.
    fn attach(
        mut self,
        kind: SegmentKind,
        combinator: Combinator,
        text: &str,
        args: Vec<Value>,
    ) -> Self {
        let text = self.apply_prefixes(text);
        match expand_markers(&text, args) {
            Ok((text, args)) => {
                self.segments
                    .push(Segment::predicate(kind, combinator, text, args));
            }
            Err(e) => self.defer_error(format!("attaching fragment: {}", e)),
        }
        self
    }

    /// Build one `VALUES` row template from sorted columns, draining the
    /// map and appending arguments.
    fn build_value_row(
        &self,
        columns: &[&str],
        row: &mut HashMap<&str, Value>,
        args: &mut Vec<Value>,
    ) -> ChainResult<String> {
        let mut template = String::new();
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                template.push_str(", ");
            }
            let value = row.remove(*column).unwrap_or(Value::Null);
            expand_slot(value, &mut template, args)?;
        }
        Ok(template)
    }

    fn apply_prefixes(&self, text: &str) -> String {
        let mut text = text.to_string();
        for (alias, replacement) in &self.prefixes {
            text = text.replace(&format!("{{.{}}}", alias), replacement);
        }
        text
    }

    pub(crate) fn defer_error(&mut self, message: String) {
        self.build_errors.push(message);
    }
}

impl std::fmt::Display for ExpressionChain {
    /// Best-effort debug rendering: the positional SQL, or the first
    /// render error.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.render() {
            Ok((sql, _)) => f.write_str(&sql),
            Err(e) => write!(f, "<invalid chain: {}>", e),
        }
    }
}
