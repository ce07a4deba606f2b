//! Rowlog Test Utilities
//!
//! In-memory implementations of the collaborator traits plus a builder for
//! trigger invocations, so engine tests run without a live host:
//! - [`MemoryCatalog`] - table metadata and invalidation signals
//! - [`MemorySink`] - records appended events, can be told to reject
//! - [`ScriptedQueryEngine`] - prepares plans, answers from scripted results
//! - [`CallBuilder`] - fluent construction of [`TriggerCall`] fixtures

use rowlog_core::{
    AppendError, Catalog, ChangeEvent, Column, EventId, EventSink, ExecError, Invalidation, Level,
    Operation, PlanId, QualifiedName, QueryEngine, RowImage, SchemaError, SessionRole, SqlType,
    SqlValue, TableKey, TableMeta, Timing, TriggerKey,
};
use std::collections::HashMap;

// ============================================================================
// CATALOG
// ============================================================================

/// In-memory catalog with a controllable invalidation feed.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: HashMap<TableKey, TableMeta>,
    pending: Vec<Invalidation>,
    during_fill: Vec<Invalidation>,
    /// Number of `table_meta` lookups served, for cache assertions.
    pub lookups: usize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table with its qualified name and `(position, name)` pkeys.
    pub fn add_table(
        &mut self,
        table: TableKey,
        schema: &str,
        name: &str,
        pkeys: &[(usize, &str)],
    ) {
        self.tables.insert(
            table,
            TableMeta {
                name: QualifiedName::new(schema, name),
                pkeys: pkeys
                    .iter()
                    .map(|(pos, name)| (*pos, name.to_string()))
                    .collect(),
            },
        );
    }

    /// Queue an invalidation signal for the next drain.
    pub fn signal(&mut self, inv: Invalidation) {
        self.pending.push(inv);
    }

    /// Queue a signal that surfaces only after the next metadata fetch,
    /// simulating a schema change landing mid-rebuild.
    pub fn signal_during_fill(&mut self, inv: Invalidation) {
        self.during_fill.push(inv);
    }
}

impl Catalog for MemoryCatalog {
    fn table_meta(&mut self, table: TableKey) -> Result<TableMeta, SchemaError> {
        self.lookups += 1;
        self.pending.append(&mut self.during_fill);
        self.tables
            .get(&table)
            .cloned()
            .ok_or(SchemaError::TableLookup {
                table: table.0,
                reason: "no such table".to_string(),
            })
    }

    fn pending_invalidations(&mut self) -> Vec<Invalidation> {
        std::mem::take(&mut self.pending)
    }
}

// ============================================================================
// EVENT SINK
// ============================================================================

/// Records appended events; can be told to reject appends.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<(String, ChangeEvent)>,
    pub reject: bool,
    next_id: i64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&ChangeEvent> {
        self.events.last().map(|(_, ev)| ev)
    }
}

impl EventSink for MemorySink {
    fn append(&mut self, queue: &str, event: &ChangeEvent) -> Result<EventId, AppendError> {
        if self.reject {
            return Err(AppendError::Rejected {
                queue: queue.to_string(),
                reason: "insert disabled".to_string(),
            });
        }
        self.next_id += 1;
        self.events.push((queue.to_string(), event.clone()));
        Ok(EventId(self.next_id))
    }
}

// ============================================================================
// QUERY ENGINE
// ============================================================================

/// Prepares plans and answers executions from scripted results.
///
/// Results are keyed by the prepared statement text; a statement without a
/// script yields a single NULL cell, the shape override queries expect.
#[derive(Debug, Default)]
pub struct ScriptedQueryEngine {
    plans: HashMap<PlanId, String>,
    results: HashMap<String, Vec<RowImage>>,
    next_plan: u64,
    /// Statements whose prepare should fail.
    fail_prepare: Vec<String>,
    /// Record of prepared statement texts with their argument types.
    pub prepared: Vec<(String, Vec<SqlType>)>,
    /// Record of executed statement texts with their argument values.
    pub executed: Vec<(String, Vec<Option<SqlValue>>)>,
    /// Plans released by cache teardown.
    pub released: Vec<PlanId>,
}

impl ScriptedQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the result rows for a statement text.
    pub fn script(&mut self, sql: &str, rows: Vec<RowImage>) {
        self.results.insert(sql.to_string(), rows);
    }

    /// Script a single one-cell result, the common override shape.
    pub fn script_cell(&mut self, sql: &str, cell: Option<SqlValue>) {
        self.script(sql, vec![vec![cell]]);
    }

    /// Make prepare fail for a statement text.
    pub fn fail_prepare(&mut self, sql: &str) {
        self.fail_prepare.push(sql.to_string());
    }

    /// Stop failing prepares.
    pub fn heal(&mut self) {
        self.fail_prepare.clear();
    }
}

impl QueryEngine for ScriptedQueryEngine {
    fn prepare(&mut self, sql: &str, arg_types: &[SqlType]) -> Result<PlanId, ExecError> {
        if self.fail_prepare.iter().any(|s| s == sql) {
            return Err(ExecError::PrepareFailed {
                reason: format!("scripted failure for: {}", sql),
            });
        }
        self.next_plan += 1;
        let plan = PlanId(self.next_plan);
        self.plans.insert(plan, sql.to_string());
        self.prepared.push((sql.to_string(), arg_types.to_vec()));
        Ok(plan)
    }

    fn execute(
        &mut self,
        plan: PlanId,
        args: &[Option<SqlValue>],
    ) -> Result<Vec<RowImage>, ExecError> {
        let Some(sql) = self.plans.get(&plan) else {
            return Err(ExecError::QueryFailed {
                reason: "unknown plan".to_string(),
            });
        };
        self.executed.push((sql.clone(), args.to_vec()));
        match self.results.get(sql) {
            Some(rows) => Ok(rows.clone()),
            None => Ok(vec![vec![None]]),
        }
    }

    fn release(&mut self, plan: PlanId) {
        self.plans.remove(&plan);
        self.released.push(plan);
    }
}

// ============================================================================
// CALL BUILDER
// ============================================================================

/// Owned backing storage for a [`TriggerCall`], built fluently.
#[derive(Debug, Clone)]
pub struct CallFixture {
    pub table: TableKey,
    pub trigger: TriggerKey,
    pub op: Operation,
    pub timing: Timing,
    pub level: Level,
    pub session_role: SessionRole,
    pub standard_strings: bool,
    pub args: Vec<String>,
    pub columns: Vec<Column>,
    pub old: Option<RowImage>,
    pub new: Option<RowImage>,
}

impl CallFixture {
    /// Borrow as the engine-facing call type.
    pub fn call(&self) -> rowlog_core::TriggerCall<'_> {
        rowlog_core::TriggerCall {
            table: self.table,
            trigger: self.trigger,
            op: self.op,
            timing: self.timing,
            level: self.level,
            session_role: self.session_role,
            standard_strings: self.standard_strings,
            args: &self.args,
            columns: &self.columns,
            old: self.old.as_ref(),
            new: self.new.as_ref(),
        }
    }
}

/// Fluent builder for trigger invocation fixtures.
#[derive(Debug, Clone)]
pub struct CallBuilder {
    fixture: CallFixture,
}

impl CallBuilder {
    pub fn new(op: Operation) -> Self {
        let (timing, level) = match op {
            Operation::Truncate => (Timing::After, Level::Statement),
            _ => (Timing::After, Level::Row),
        };
        Self {
            fixture: CallFixture {
                table: TableKey(1),
                trigger: TriggerKey(1),
                op,
                timing,
                level,
                session_role: SessionRole::Origin,
                standard_strings: false,
                args: vec!["testqueue".to_string()],
                columns: Vec::new(),
                old: None,
                new: None,
            },
        }
    }

    pub fn table(mut self, table: TableKey) -> Self {
        self.fixture.table = table;
        self
    }

    pub fn trigger(mut self, trigger: TriggerKey) -> Self {
        self.fixture.trigger = trigger;
        self
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.fixture.timing = timing;
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.fixture.level = level;
        self
    }

    pub fn session_role(mut self, role: SessionRole) -> Self {
        self.fixture.session_role = role;
        self
    }

    pub fn standard_strings(mut self, on: bool) -> Self {
        self.fixture.standard_strings = on;
        self
    }

    /// Replace the argument list (the first argument is the queue name).
    pub fn args(mut self, args: &[&str]) -> Self {
        self.fixture.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.fixture.args.push(arg.to_string());
        self
    }

    pub fn column(mut self, name: &str, ty: SqlType) -> Self {
        self.fixture.columns.push(Column::new(name, ty));
        self
    }

    pub fn dropped_column(mut self) -> Self {
        self.fixture.columns.push(Column::dropped_slot());
        self
    }

    pub fn old_row(mut self, row: RowImage) -> Self {
        self.fixture.old = Some(row);
        self
    }

    pub fn new_row(mut self, row: RowImage) -> Self {
        self.fixture.new = Some(row);
        self
    }

    pub fn build(self) -> CallFixture {
        self.fixture
    }
}
