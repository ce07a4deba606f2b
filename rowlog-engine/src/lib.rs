//! Rowlog Engine - from row change to queue event.
//!
//! The pieces, leaves first: the column classifier decides which columns are
//! keys and which are skipped; the change detector gates update events; three
//! encoders produce the wire payloads; the metadata cache keeps per-table and
//! per-trigger state alive across invocations; [`TriggerEngine`] orchestrates
//! one invocation end to end and hands the finished event to the sink.

pub mod cache;
pub mod classify;
pub mod config;
pub mod detect;
pub mod encode;
pub mod trigger;

pub use cache::{MetadataCache, TableInfo, TableState, TriggerInfo};
pub use classify::{is_reserved_column, strlist_contains, ColumnFilter, RESERVED_COLUMN_PREFIX};
pub use config::{LegacyArgs, TriggerArgs};
pub use detect::{interesting_update, values_equal};
pub use trigger::{TriggerEngine, TriggerFlavor, TriggerOutcome};
