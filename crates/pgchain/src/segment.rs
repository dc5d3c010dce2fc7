//! Clause fragment atoms.
//!
//! A [`Segment`] is the atomic unit of a chain: a kind tag, the literal
//! SQL fragment (with `?` input markers already expanded), the arguments
//! aligned with those markers, and the boolean combinator used when the
//! fragment is a WHERE/HAVING predicate. Segments are immutable once
//! attached to a chain.

use crate::value::Value;

/// Join flavor; rendered in declaration order, never grouped by flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Plain,
    Left,
    Right,
    Inner,
    Full,
}

impl JoinKind {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            JoinKind::Plain => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

/// The clause a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Where,
    Having,
    Join(JoinKind),
    Select,
    Delete,
    Insert,
    InsertMulti,
    Update,
    /// Postgres `UPDATE ... FROM` table, not a JOIN
    FromUpdate,
    GroupBy,
    OrderBy,
    Returning,
    Union,
    Limit,
    Offset,
    /// Trailing decoration such as `FOR UPDATE`
    Suffix,
}

/// Boolean combinator emitted before a predicate segment when it is
/// concatenated with the previous same-kind segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    None,
    And,
    Or,
    Not,
    AndNot,
    OrNot,
}

impl Combinator {
    /// The separator emitted before a non-leading predicate.
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            Combinator::None => "",
            Combinator::And => "AND",
            Combinator::Or => "OR",
            Combinator::Not => "NOT",
            Combinator::AndNot => "AND NOT",
            Combinator::OrNot => "OR NOT",
        }
    }

    /// What survives of the combinator when the predicate opens the
    /// clause: the joiner is suppressed, the negation is not.
    pub(crate) fn leading(self) -> &'static str {
        match self {
            Combinator::Not | Combinator::AndNot | Combinator::OrNot => "NOT ",
            _ => "",
        }
    }
}

/// One clause fragment with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub(crate) kind: SegmentKind,
    pub(crate) text: String,
    pub(crate) args: Vec<Value>,
    pub(crate) combinator: Combinator,
    pub(crate) modifier: Option<String>,
}

impl Segment {
    pub(crate) fn new(kind: SegmentKind, text: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            kind,
            text: text.into(),
            args,
            combinator: Combinator::None,
            modifier: None,
        }
    }

    pub(crate) fn predicate(
        kind: SegmentKind,
        combinator: Combinator,
        text: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            args,
            combinator,
            modifier: None,
        }
    }

    pub(crate) fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = Some(modifier.into());
        self
    }

    /// The literal SQL fragment.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The arguments aligned with the fragment's remaining `?` markers.
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}
