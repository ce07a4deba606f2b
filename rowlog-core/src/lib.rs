//! Rowlog Core - Data Types and Collaborator Traits
//!
//! Pure data structures and the trait seams toward the host system.
//! This crate contains no engine logic - the tokenizer, encoders and the
//! event assembler live in `rowlog-sql` and `rowlog-engine`.

pub mod error;
pub mod event;
pub mod row;
pub mod traits;
pub mod value;

pub use error::{
    AppendError, ConfigError, ExecError, ParseError, RowlogError, RowlogResult, SchemaError,
};
pub use event::{ChangeEvent, EventField, EventId};
pub use row::{
    Column, Level, Operation, QualifiedName, RowImage, SessionRole, TableKey, Timing, TriggerCall,
    TriggerKey,
};
pub use traits::{BindingSource, Catalog, EventSink, Invalidation, PlanId, QueryEngine, TableMeta};
pub use value::{DateTimeValue, SqlType, SqlValue};
