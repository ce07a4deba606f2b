//! Row, column and invocation-context types.

use crate::value::{SqlType, SqlValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a table within the host catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableKey(pub u32);

/// Stable identity of a trigger definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerKey(pub u32);

/// Schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedName {
    pub schema: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// One attribute of the relation, in catalog position order.
///
/// Dropped columns stay in the list so positions line up with row images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: SqlType,
    pub dropped: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
            dropped: false,
        }
    }

    /// Placeholder for a dropped attribute, keeping positions aligned.
    pub fn dropped_slot() -> Self {
        Self {
            name: String::new(),
            ty: SqlType::Other,
            dropped: true,
        }
    }
}

/// A row image: one slot per column, `None` for SQL NULL.
pub type RowImage = Vec<Option<SqlValue>>;

/// Operation kind of a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Truncate,
}

impl Operation {
    /// Single-letter code used in event type fields.
    pub fn code(&self) -> char {
        match self {
            Operation::Insert => 'I',
            Operation::Update => 'U',
            Operation::Delete => 'D',
            Operation::Truncate => 'R',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Truncate => "TRUNCATE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When the trigger fires relative to the row operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timing {
    Before,
    After,
}

/// Granularity the trigger was fired at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Row,
    Statement,
}

/// Session replication role; `Local` disables logging entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionRole {
    Origin,
    Replica,
    Local,
}

/// Everything the host hands over for one trigger invocation.
#[derive(Debug, Clone)]
pub struct TriggerCall<'a> {
    pub table: TableKey,
    pub trigger: TriggerKey,
    pub op: Operation,
    pub timing: Timing,
    pub level: Level,
    pub session_role: SessionRole,
    /// Session value of the standard-conforming-strings setting.
    pub standard_strings: bool,
    /// Raw trigger arguments; the first names the destination queue.
    pub args: &'a [String],
    pub columns: &'a [Column],
    /// Pre-change image: present for update and delete.
    pub old: Option<&'a RowImage>,
    /// Post-change image: present for insert and update.
    pub new: Option<&'a RowImage>,
}

impl<'a> TriggerCall<'a> {
    /// The row image override expressions and encoders read from:
    /// the new image when one exists, otherwise the old one.
    pub fn current_row(&self) -> Option<&'a RowImage> {
        self.new.or(self.old)
    }
}
