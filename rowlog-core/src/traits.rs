//! Trait seams toward the host system.
//!
//! The engine never talks to a live database; everything it needs from the
//! host comes through these traits, so tests can run against the in-memory
//! implementations in `rowlog-testkit`.

use crate::error::{AppendError, ExecError, SchemaError};
use crate::event::{ChangeEvent, EventId};
use crate::row::{QualifiedName, RowImage, TableKey};
use crate::value::{SqlType, SqlValue};

/// Handle to a prepared parameterized statement owned by the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanId(pub u64);

/// Table metadata as the catalog reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    pub name: QualifiedName,
    /// Ordered primary key columns: relation position and name.
    pub pkeys: Vec<(usize, String)>,
}

/// Schema-change signal from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Drop every cached entry.
    All,
    /// Drop the entry for one table.
    Table(TableKey),
}

/// Destination queue; accepts finished events.
pub trait EventSink {
    /// Append one event to the named queue. Failure aborts the invocation.
    fn append(&mut self, queue: &str, event: &ChangeEvent) -> Result<EventId, AppendError>;
}

/// Catalog lookups plus the host's schema-change signal feed.
pub trait Catalog {
    /// Qualified name and primary-key columns for a table.
    fn table_meta(&mut self, table: TableKey) -> Result<TableMeta, SchemaError>;

    /// Drain invalidation signals accumulated since the last call.
    ///
    /// The cache drains this before and after every rebuild so a signal
    /// arriving mid-rebuild is never lost.
    fn pending_invalidations(&mut self) -> Vec<Invalidation>;
}

/// Prepares and executes parameterized statements on the host's behalf.
pub trait QueryEngine {
    fn prepare(&mut self, sql: &str, arg_types: &[SqlType]) -> Result<PlanId, ExecError>;

    /// Run a prepared plan with the given argument values (`None` = NULL).
    fn execute(
        &mut self,
        plan: PlanId,
        args: &[Option<SqlValue>],
    ) -> Result<Vec<RowImage>, ExecError>;

    /// Release a prepared plan when cached trigger state is torn down.
    fn release(&mut self, plan: PlanId);
}

/// Resolves identifier references against the current row context.
///
/// Used by the query builder: `resolve` maps a name to an opaque index,
/// `type_of`/`value_of` answer for indexes `resolve` handed out.
pub trait BindingSource {
    fn resolve(&self, name: &str) -> Option<usize>;

    fn type_of(&self, index: usize) -> SqlType;

    /// Current value; `None` is SQL NULL.
    fn value_of(&self, index: usize) -> Option<SqlValue>;
}
