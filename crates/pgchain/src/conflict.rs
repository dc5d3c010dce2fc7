//! `ON CONFLICT` clause builder.
//!
//! A small typed state machine: pick a target (column list or named
//! constraint), then either `DO NOTHING` or `DO UPDATE` with an ordered
//! assignment list and an optional trailing WHERE sub-chain. Column/value
//! pairs are a single typed call each, so a mismatched pair list cannot
//! be constructed.
//!
//! ```ignore
//! chain.on_conflict(
//!     Conflict::columns(&["username"])
//!         .do_update()
//!         .set_excluded("email")
//!         .set_now("updated_at")
//!         .build(),
//! );
//! ```

use crate::chain::ExpressionChain;
use crate::error::{ChainError, ChainResult};
use crate::value::Value;

/// One piece of the conflict action: literal text, the arguments bound
/// to its markers, and whether it closes the clause (a trailing WHERE
/// must stay behind the assignment list).
#[derive(Debug, Clone, PartialEq)]
struct ConflictPart {
    text: String,
    args: Vec<Value>,
    terminal: bool,
}

/// Entry point for building a conflict clause.
pub struct Conflict;

impl Conflict {
    /// Target a column list: `ON CONFLICT (a, b)`.
    pub fn columns(cols: &[&str]) -> ConflictTarget {
        ConflictTarget {
            target: format!("({})", cols.join(", ")),
        }
    }

    /// Target a named constraint: `ON CONFLICT ON CONSTRAINT name`.
    pub fn constraint(name: &str) -> ConflictTarget {
        ConflictTarget {
            target: format!("ON CONSTRAINT {}", name),
        }
    }
}

/// A conflict target waiting for its action.
pub struct ConflictTarget {
    target: String,
}

impl ConflictTarget {
    /// `DO NOTHING` (terminal).
    pub fn do_nothing(self) -> ConflictClause {
        ConflictClause {
            target: self.target,
            update: false,
            parts: Vec::new(),
            filter: None,
        }
    }

    /// `DO UPDATE SET ...`; configure assignments on the returned
    /// builder.
    pub fn do_update(self) -> ConflictUpdate {
        ConflictUpdate {
            target: self.target,
            parts: Vec::new(),
        }
    }
}

/// Assignment accumulator for `DO UPDATE SET`.
#[must_use]
pub struct ConflictUpdate {
    target: String,
    parts: Vec<ConflictPart>,
}

impl ConflictUpdate {
    /// `column = <value>`.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.parts.push(ConflictPart {
            text: format!("{} = ?", column),
            args: vec![value.into()],
            terminal: false,
        });
        self
    }

    /// `column = <raw sql>`, no escaping, no argument.
    pub fn set_sql(mut self, column: &str, expr: &str) -> Self {
        self.parts.push(ConflictPart {
            text: format!("{} = {}", column, expr),
            args: Vec::new(),
            terminal: false,
        });
        self
    }

    /// `column = EXCLUDED.column`.
    pub fn set_excluded(self, column: &str) -> Self {
        let expr = format!("EXCLUDED.{}", column);
        self.set_sql(column, &expr)
    }

    /// `column = DEFAULT`.
    pub fn set_default(self, column: &str) -> Self {
        self.set_sql(column, "DEFAULT")
    }

    /// `column = now()`.
    pub fn set_now(self, column: &str) -> Self {
        self.set_sql(column, "now()")
    }

    /// Close the clause with a trailing `WHERE` rendered from the given
    /// chain's WHERE predicates (terminal).
    pub fn filter(self, chain: ExpressionChain) -> ConflictClause {
        ConflictClause {
            target: self.target,
            update: true,
            parts: self.parts,
            filter: Some(Box::new(chain)),
        }
    }

    /// Close the clause (terminal).
    pub fn build(self) -> ConflictClause {
        ConflictClause {
            target: self.target,
            update: true,
            parts: self.parts,
            filter: None,
        }
    }
}

/// A fully configured `ON CONFLICT` clause, attachable to an INSERT
/// chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictClause {
    target: String,
    update: bool,
    parts: Vec<ConflictPart>,
    filter: Option<Box<ExpressionChain>>,
}

impl ConflictClause {
    /// Render the clause raw (markers left as `?`), including the
    /// leading space.
    pub(crate) fn render_raw(&self) -> ChainResult<(String, Vec<Value>)> {
        let mut sql = format!(" ON CONFLICT {}", self.target);
        let mut args = Vec::new();

        if !self.update {
            sql.push_str(" DO NOTHING");
            return Ok((sql, args));
        }

        if self.parts.is_empty() {
            return Err(ChainError::build(
                "ON CONFLICT DO UPDATE requires at least one assignment",
            ));
        }

        sql.push_str(" DO UPDATE SET ");
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&part.text);
            args.extend(part.args.iter().cloned());
        }

        if let Some(filter) = &self.filter {
            let (body, filter_args) = filter.render_where_fragment()?;
            if !body.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&body);
                args.extend(filter_args);
            }
        }

        Ok((sql, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExpressionChain;

    #[test]
    fn do_nothing_on_columns() {
        let clause = Conflict::columns(&["username"]).do_nothing();
        let (sql, args) = clause.render_raw().unwrap();
        assert_eq!(sql, " ON CONFLICT (username) DO NOTHING");
        assert!(args.is_empty());
    }

    #[test]
    fn do_nothing_on_constraint() {
        let clause = Conflict::constraint("users_pkey").do_nothing();
        let (sql, _) = clause.render_raw().unwrap();
        assert_eq!(sql, " ON CONFLICT ON CONSTRAINT users_pkey DO NOTHING");
    }

    #[test]
    fn do_update_assignments_in_order() {
        let clause = Conflict::columns(&["id"])
            .do_update()
            .set("email", "a@b.c")
            .set_excluded("name")
            .set_default("flags")
            .set_now("updated_at")
            .build();
        let (sql, args) = clause.render_raw().unwrap();
        assert_eq!(
            sql,
            " ON CONFLICT (id) DO UPDATE SET email = ?, name = EXCLUDED.name, \
             flags = DEFAULT, updated_at = now()"
        );
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn trailing_filter_renders_after_set_list() {
        let filter = ExpressionChain::new().and_where("users.version < ?", crate::values![3_i32]);
        let clause = Conflict::columns(&["id"])
            .do_update()
            .set_excluded("payload")
            .filter(filter);
        let (sql, args) = clause.render_raw().unwrap();
        assert_eq!(
            sql,
            " ON CONFLICT (id) DO UPDATE SET payload = EXCLUDED.payload WHERE users.version < ?"
        );
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn update_without_assignments_fails() {
        let clause = Conflict::columns(&["id"]).do_update().build();
        assert!(clause.render_raw().is_err());
    }
}
