//! Change event record and its overridable field positions.

use crate::row::Operation;
use serde::{Deserialize, Serialize};

/// Identifier assigned by the destination queue on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub i64);

/// Overridable event field positions, in evaluation order.
///
/// `When` is the veto predicate; it never carries text of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventField {
    Type,
    Data,
    Extra1,
    Extra2,
    Extra3,
    Extra4,
    When,
}

impl EventField {
    pub const COUNT: usize = 7;

    /// All fields in evaluation order.
    pub const ALL: [EventField; EventField::COUNT] = [
        EventField::Type,
        EventField::Data,
        EventField::Extra1,
        EventField::Extra2,
        EventField::Extra3,
        EventField::Extra4,
        EventField::When,
    ];

    pub fn index(self) -> usize {
        match self {
            EventField::Type => 0,
            EventField::Data => 1,
            EventField::Extra1 => 2,
            EventField::Extra2 => 3,
            EventField::Extra3 => 4,
            EventField::Extra4 => 5,
            EventField::When => 6,
        }
    }

    /// Name used in trigger arguments (`ev_type=...`, `when=...`).
    pub fn arg_name(self) -> &'static str {
        match self {
            EventField::Type => "ev_type",
            EventField::Data => "ev_data",
            EventField::Extra1 => "ev_extra1",
            EventField::Extra2 => "ev_extra2",
            EventField::Extra3 => "ev_extra3",
            EventField::Extra4 => "ev_extra4",
            EventField::When => "when",
        }
    }

    /// Suffix used by reserved event-field columns (`_rowlog_ev_type`, ...).
    /// `When` has no column form.
    pub fn column_suffix(self) -> Option<&'static str> {
        match self {
            EventField::Type => Some("type"),
            EventField::Data => Some("data"),
            EventField::Extra1 => Some("extra1"),
            EventField::Extra2 => Some("extra2"),
            EventField::Extra3 => Some("extra3"),
            EventField::Extra4 => Some("extra4"),
            EventField::When => None,
        }
    }
}

/// One normalized row-change record, ready for queue insertion.
///
/// Created fresh per invocation and consumed by the append call or discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub op: Operation,
    pub ev_type: Option<String>,
    pub ev_data: Option<String>,
    pub ev_extra1: Option<String>,
    pub ev_extra2: Option<String>,
    pub ev_extra3: Option<String>,
    pub ev_extra4: Option<String>,
    /// Set when the `when=` predicate vetoed emission.
    pub skip: bool,
}

impl ChangeEvent {
    pub fn new(op: Operation) -> Self {
        Self {
            op,
            ev_type: None,
            ev_data: None,
            ev_extra1: None,
            ev_extra2: None,
            ev_extra3: None,
            ev_extra4: None,
            skip: false,
        }
    }

    /// Mutable slot for a text-carrying field; `None` for [`EventField::When`].
    pub fn field_slot(&mut self, field: EventField) -> Option<&mut Option<String>> {
        match field {
            EventField::Type => Some(&mut self.ev_type),
            EventField::Data => Some(&mut self.ev_data),
            EventField::Extra1 => Some(&mut self.ev_extra1),
            EventField::Extra2 => Some(&mut self.ev_extra2),
            EventField::Extra3 => Some(&mut self.ev_extra3),
            EventField::Extra4 => Some(&mut self.ev_extra4),
            EventField::When => None,
        }
    }

    pub fn field(&self, field: EventField) -> Option<&str> {
        match field {
            EventField::Type => self.ev_type.as_deref(),
            EventField::Data => self.ev_data.as_deref(),
            EventField::Extra1 => self.ev_extra1.as_deref(),
            EventField::Extra2 => self.ev_extra2.as_deref(),
            EventField::Extra3 => self.ev_extra3.as_deref(),
            EventField::Extra4 => self.ev_extra4.as_deref(),
            EventField::When => None,
        }
    }
}
