//! Process-lifetime cache of per-table and per-trigger metadata.
//!
//! The cache is an explicit service object handed around by the caller, so
//! tests run isolated instances. Invalidation arrives through the catalog's
//! signal feed and is drained before and after every rebuild; a signal that
//! lands mid-rebuild leaves the fresh entry non-valid so the next lookup
//! rebuilds again, while the current invocation keeps using the data it
//! just built.

use crate::encode::json_string;
use rowlog_core::{
    Catalog, EventField, Invalidation, QueryEngine, RowlogError, SchemaError, TableKey, TableMeta,
    TriggerKey,
};
use rowlog_sql::QueryBuilder;
use std::collections::HashMap;

/// Tri-state validity of a cached table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Valid,
    /// Schema change reported; rebuild before next use.
    Invalid,
    /// A rebuild started and has not completed cleanly.
    Rebuilding,
}

/// Cached per-table info.
#[derive(Debug)]
pub struct TableInfo {
    pub table: TableKey,
    /// Schema-qualified name, `schema.name`.
    pub table_name: String,
    /// Primary key positions in the attribute list, ascending.
    pub pkey_positions: Vec<usize>,
    pub pkey_names: Vec<String>,
    /// Comma-joined pkey names, ready for event type fields.
    pub pkey_list: String,
    /// Precomputed `"table":[schema,name]` JSON fragment.
    pub json_table: String,
    state: TableState,
    /// Per-trigger cached state, dropped together with this entry.
    pub triggers: HashMap<TriggerKey, TriggerInfo>,
}

impl TableInfo {
    fn stub(table: TableKey) -> Self {
        Self {
            table,
            table_name: String::new(),
            pkey_positions: Vec::new(),
            pkey_names: Vec::new(),
            pkey_list: String::new(),
            json_table: String::new(),
            state: TableState::Rebuilding,
            triggers: HashMap::new(),
        }
    }

    fn fill(&mut self, meta: TableMeta) {
        self.table_name = meta.name.to_string();

        let mut json_table = String::from("\"table\":[");
        json_string(&mut json_table, &meta.name.schema);
        json_table.push(',');
        json_string(&mut json_table, &meta.name.name);
        json_table.push(']');
        self.json_table = json_table;

        self.pkey_positions = meta.pkeys.iter().map(|(pos, _)| *pos).collect();
        self.pkey_names = meta.pkeys.into_iter().map(|(_, name)| name).collect();
        self.pkey_list = self.pkey_names.join(",");
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    /// Cached state for one trigger, created on first use.
    pub fn trigger_entry(&mut self, trigger: TriggerKey) -> &mut TriggerInfo {
        self.triggers.entry(trigger).or_default()
    }
}

/// Per-trigger cached configuration and compiled override queries.
#[derive(Debug, Default)]
pub struct TriggerInfo {
    /// Arguments were parsed and stored; later invocations skip the parse.
    pub finalized: bool,
    pub skip: bool,
    pub backup: bool,
    pub deny: bool,
    pub ignore_list: Option<String>,
    pub pkey_list: Option<String>,
    /// One compiled builder per overridable field.
    pub queries: [Option<QueryBuilder>; EventField::COUNT],
}

impl TriggerInfo {
    fn release_plans(&mut self, db: &mut impl QueryEngine) {
        for query in self.queries.iter_mut().flatten() {
            query.release(db);
        }
    }
}

/// Process-wide table/trigger metadata cache.
#[derive(Debug, Default)]
pub struct MetadataCache {
    tables: HashMap<TableKey, TableInfo>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, table: TableKey) -> Option<&TableInfo> {
        self.tables.get(&table)
    }

    /// Mark one table for rebuild on next use.
    pub fn invalidate_table(&mut self, table: TableKey) {
        if let Some(info) = self.tables.get_mut(&table) {
            info.state = TableState::Invalid;
        }
    }

    /// Tear down every entry, releasing prepared plans.
    pub fn invalidate_all(&mut self, db: &mut impl QueryEngine) {
        for (_, mut info) in self.tables.drain() {
            for (_, mut tg) in info.triggers.drain() {
                tg.release_plans(db);
            }
        }
    }

    fn apply(&mut self, inv: Invalidation, db: &mut impl QueryEngine) {
        match inv {
            Invalidation::All => self.invalidate_all(db),
            Invalidation::Table(table) => self.invalidate_table(table),
        }
    }

    /// Fetch the cached info for a table, rebuilding it if needed.
    ///
    /// The old entry is torn down completely before the catalog is asked for
    /// fresh metadata; a failed fetch leaves a non-valid stub behind, never
    /// partially-built data.
    pub fn lookup(
        &mut self,
        table: TableKey,
        catalog: &mut impl Catalog,
        db: &mut impl QueryEngine,
    ) -> Result<&mut TableInfo, RowlogError> {
        for inv in catalog.pending_invalidations() {
            self.apply(inv, db);
        }

        let ready = self
            .tables
            .get(&table)
            .is_some_and(|info| info.state == TableState::Valid);

        if !ready {
            if let Some(mut old) = self.tables.remove(&table) {
                for (_, mut tg) in old.triggers.drain() {
                    tg.release_plans(db);
                }
            }

            // stub goes in first so an error below leaves a non-valid entry
            self.tables.insert(table, TableInfo::stub(table));
            let meta = catalog.table_meta(table)?;

            let mut fresh = TableInfo::stub(table);
            fresh.fill(meta);
            fresh.state = TableState::Valid;

            // a reset may have landed while we were filling; keep serving
            // this invocation but force a rebuild on the next one
            for inv in catalog.pending_invalidations() {
                match inv {
                    Invalidation::All => {
                        for other in self.tables.values_mut() {
                            other.state = TableState::Invalid;
                        }
                        fresh.state = TableState::Invalid;
                    }
                    Invalidation::Table(t) if t == table => fresh.state = TableState::Invalid,
                    Invalidation::Table(t) => self.invalidate_table(t),
                }
            }

            self.tables.insert(table, fresh);
        }

        self.tables.get_mut(&table).ok_or_else(|| {
            RowlogError::Schema(SchemaError::TableLookup {
                table: table.0,
                reason: "cache entry vanished during rebuild".to_string(),
            })
        })
    }
}
