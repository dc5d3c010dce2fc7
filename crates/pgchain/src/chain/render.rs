//! Rendering: chain state to `(sql, args)`.
//!
//! `render_raw` emits SQL with `?` markers and the argument list in
//! marker order; `render` runs the final positional pass that turns
//! markers into `$1..$n`. Rendering never mutates the chain, so the
//! same chain renders the same statement every time.

use super::ExpressionChain;
use crate::error::{ChainError, ChainResult};
use crate::segment::{Combinator, Segment, SegmentKind};
use crate::value::Value;

impl ExpressionChain {
    /// Render the chain to positional SQL (`$1..$n`) and its argument
    /// list.
    pub fn render(&self) -> ChainResult<(String, Vec<Value>)> {
        let (raw, args) = self.render_raw()?;
        let sql = crate::positional::to_positional(&raw, args.len())?;
        Ok((sql, args))
    }

    /// Render the chain with `?` markers left in place. Used when the
    /// output is spliced into an enclosing statement (sub-queries, CTE
    /// bodies, unions) whose own render pass numbers the markers.
    pub(crate) fn render_raw(&self) -> ChainResult<(String, Vec<Value>)> {
        if !self.build_errors.is_empty() {
            return Err(ChainError::Build(self.build_errors.join("; ")));
        }
        let operation = self.operation.as_ref().ok_or(ChainError::MissingOperation)?;

        let mut sql = String::new();
        let mut args = Vec::new();
        self.render_ctes(&mut sql, &mut args)?;

        match operation.kind {
            SegmentKind::Insert | SegmentKind::InsertMulti => {
                self.render_insert(operation, &mut sql, &mut args)?
            }
            SegmentKind::Update => self.render_update(operation, &mut sql, &mut args)?,
            SegmentKind::Select | SegmentKind::Delete => {
                self.render_query(operation, &mut sql, &mut args)?
            }
            _ => return Err(ChainError::MissingOperation),
        }

        Ok((sql, args))
    }

    /// The WHERE clause body without the keyword, for splicing into a
    /// parent clause (predicate groups, conflict filters).
    pub(crate) fn render_where_fragment(&self) -> ChainResult<(String, Vec<Value>)> {
        if !self.build_errors.is_empty() {
            return Err(ChainError::Build(self.build_errors.join("; ")));
        }
        let mut body = String::new();
        let mut args = Vec::new();
        self.predicate_body(SegmentKind::Where, &mut body, &mut args);
        Ok((body, args))
    }

    fn render_ctes(&self, sql: &mut String, args: &mut Vec<Value>) -> ChainResult<()> {
        if self.ctes.is_empty() {
            return Ok(());
        }
        sql.push_str("WITH ");
        for (i, (name, chain)) in self.ctes.iter().enumerate() {
            if chain
                .segments
                .iter()
                .any(|s| s.kind == SegmentKind::Union)
            {
                return Err(ChainError::CteUnion(name.clone()));
            }
            let (body, body_args) = chain
                .render_raw()
                .map_err(|e| ChainError::build(format!("CTE '{}': {}", name, e)))?;
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(name);
            sql.push_str(" AS (");
            sql.push_str(&body);
            sql.push(')');
            args.extend(body_args);
        }
        sql.push(' ');
        Ok(())
    }

    fn render_insert(
        &self,
        operation: &Segment,
        sql: &mut String,
        args: &mut Vec<Value>,
    ) -> ChainResult<()> {
        if self.table.is_empty() {
            return Err(ChainError::MissingTable("INSERT"));
        }

        sql.push_str("INSERT INTO ");
        sql.push_str(&self.table);
        if operation.text.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            sql.push_str(" (");
            sql.push_str(&operation.text);
            sql.push_str(") VALUES ");
            for (i, row) in self.value_rows.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push('(');
                sql.push_str(row);
                sql.push(')');
            }
            args.extend(operation.args.iter().cloned());
        }

        if let Some(conflict) = &self.conflict {
            let (clause, clause_args) = conflict.render_raw()?;
            sql.push_str(&clause);
            args.extend(clause_args);
        }

        self.push_returning(sql, args);
        Ok(())
    }

    fn render_update(
        &self,
        operation: &Segment,
        sql: &mut String,
        args: &mut Vec<Value>,
    ) -> ChainResult<()> {
        if self.table.is_empty() {
            return Err(ChainError::MissingTable("UPDATE"));
        }

        sql.push_str("UPDATE ");
        sql.push_str(&self.table);
        sql.push_str(" SET ");
        sql.push_str(&operation.text);
        args.extend(operation.args.iter().cloned());

        let from_tables: Vec<&Segment> = self
            .segments
            .iter()
            .filter(|s| s.kind == SegmentKind::FromUpdate)
            .collect();
        if !from_tables.is_empty() {
            sql.push_str(" FROM ");
            for (i, table) in from_tables.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&table.text);
                args.extend(table.args.iter().cloned());
            }
        }

        self.push_predicates(SegmentKind::Where, " WHERE ", sql, args);
        self.push_returning(sql, args);
        Ok(())
    }

    fn render_query(
        &self,
        operation: &Segment,
        sql: &mut String,
        args: &mut Vec<Value>,
    ) -> ChainResult<()> {
        let select = operation.kind == SegmentKind::Select;
        if select {
            sql.push_str("SELECT ");
            sql.push_str(&operation.text);
            if !self.table.is_empty() {
                sql.push_str(" FROM ");
                sql.push_str(&self.table);
            }
        } else {
            if self.table.is_empty() {
                return Err(ChainError::MissingTable("DELETE"));
            }
            sql.push_str("DELETE FROM ");
            sql.push_str(&self.table);
        }

        // Joins keep their declaration order across flavors.
        for segment in &self.segments {
            if let SegmentKind::Join(kind) = segment.kind {
                sql.push(' ');
                sql.push_str(kind.keyword());
                sql.push(' ');
                sql.push_str(&segment.text);
                args.extend(segment.args.iter().cloned());
            }
        }

        self.push_predicates(SegmentKind::Where, " WHERE ", sql, args);
        self.push_list(SegmentKind::GroupBy, " GROUP BY ", sql, args);
        self.push_predicates(SegmentKind::Having, " HAVING ", sql, args);
        self.push_list(SegmentKind::OrderBy, " ORDER BY ", sql, args);

        if select {
            if self.segments.iter().any(|s| s.kind == SegmentKind::Returning) {
                return Err(ChainError::ReturningNotAllowed("SELECT"));
            }
            if let Some(limit) = &self.limit {
                sql.push(' ');
                sql.push_str(&limit.text);
            }
            if let Some(offset) = &self.offset {
                sql.push(' ');
                sql.push_str(&offset.text);
            }
        } else {
            self.push_returning(sql, args);
        }

        for segment in &self.segments {
            if segment.kind == SegmentKind::Union {
                sql.push_str(" UNION ");
                if let Some(modifier) = &segment.modifier {
                    sql.push_str(modifier);
                    sql.push(' ');
                }
                sql.push_str(&segment.text);
                args.extend(segment.args.iter().cloned());
            }
        }
        for segment in &self.segments {
            if segment.kind == SegmentKind::Suffix {
                sql.push(' ');
                sql.push_str(&segment.text);
            }
        }
        Ok(())
    }

    /// Emit a predicate clause with AND-family atoms ahead of the
    /// OR/NOT family, regardless of call order. The combinator of the
    /// first emitted atom is suppressed down to its negation.
    fn predicate_body(&self, kind: SegmentKind, body: &mut String, args: &mut Vec<Value>) {
        let (and_family, or_family): (Vec<&Segment>, Vec<&Segment>) = self
            .segments
            .iter()
            .filter(|s| s.kind == kind)
            .partition(|s| {
                matches!(
                    s.combinator,
                    Combinator::And | Combinator::AndNot | Combinator::None
                )
            });

        for segment in and_family.iter().chain(or_family.iter()) {
            if body.is_empty() {
                body.push_str(segment.combinator.leading());
            } else {
                body.push(' ');
                body.push_str(segment.combinator.keyword());
                body.push(' ');
            }
            body.push_str(&segment.text);
            args.extend(segment.args.iter().cloned());
        }
    }

    fn push_predicates(
        &self,
        kind: SegmentKind,
        keyword: &str,
        sql: &mut String,
        args: &mut Vec<Value>,
    ) {
        let mut body = String::new();
        self.predicate_body(kind, &mut body, args);
        if !body.is_empty() {
            sql.push_str(keyword);
            sql.push_str(&body);
        }
    }

    /// Comma-joined clause such as GROUP BY / ORDER BY.
    fn push_list(&self, kind: SegmentKind, keyword: &str, sql: &mut String, args: &mut Vec<Value>) {
        let mut first = true;
        for segment in self.segments.iter().filter(|s| s.kind == kind) {
            if first {
                sql.push_str(keyword);
                first = false;
            } else {
                sql.push_str(", ");
            }
            sql.push_str(&segment.text);
            args.extend(segment.args.iter().cloned());
        }
    }

    fn push_returning(&self, sql: &mut String, args: &mut Vec<Value>) {
        self.push_list(SegmentKind::Returning, " RETURNING ", sql, args);
    }
}
