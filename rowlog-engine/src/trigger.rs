//! Event assembly: one trigger invocation end to end.
//!
//! [`TriggerEngine::fire`] pulls table/trigger metadata from the cache,
//! evaluates field overrides, runs the change detector, invokes the right
//! row encoder and hands the finished event to the sink. Any fatal
//! condition aborts before the append; partial events are never emitted.

use crate::cache::{MetadataCache, TriggerInfo};
use crate::classify::{live_columns, ColumnFilter, RESERVED_COLUMN_PREFIX};
use crate::config::{LegacyArgs, TriggerArgs};
use crate::detect::interesting_update;
use crate::encode;
use rowlog_core::{
    BindingSource, Catalog, ChangeEvent, ConfigError, EventField, EventId, EventSink, ExecError,
    Level, Operation, QueryEngine, RowImage, RowlogError, SchemaError, SessionRole, SqlType,
    SqlValue, Timing, TriggerCall,
};
use rowlog_sql::QueryBuilder;

/// Trigger flavors exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerFlavor {
    /// Modern arguments, SQL-fragment payload.
    Sql,
    /// Legacy column-kind arguments, SQL-fragment payload, AFTER only.
    SqlLegacy,
    /// Modern arguments, URL-encoded payload.
    UrlEncoded,
    /// Modern arguments, JSON payload.
    Json,
}

/// What happened, and what the host should do with the physical row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerOutcome {
    /// Queue id of the appended event, when one was emitted.
    pub event: Option<EventId>,
    /// A skipping BEFORE trigger tells the host to drop the row operation.
    pub suppress_operation: bool,
}

/// Binding source over the invocation's relation and current row.
struct CallBindings<'a, 'b> {
    call: &'a TriggerCall<'b>,
}

impl BindingSource for CallBindings<'_, '_> {
    fn resolve(&self, name: &str) -> Option<usize> {
        self.call
            .columns
            .iter()
            .position(|c| !c.dropped && c.name == name)
    }

    fn type_of(&self, index: usize) -> SqlType {
        self.call
            .columns
            .get(index)
            .map_or(SqlType::Other, |c| c.ty)
    }

    fn value_of(&self, index: usize) -> Option<SqlValue> {
        self.call
            .current_row()
            .and_then(|row| row.get(index))
            .and_then(|v| v.clone())
    }
}

/// Orchestrates trigger invocations against an owned metadata cache.
#[derive(Debug, Default)]
pub struct TriggerEngine {
    cache: MetadataCache,
}

impl TriggerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut MetadataCache {
        &mut self.cache
    }

    /// Process one trigger invocation.
    pub fn fire(
        &mut self,
        flavor: TriggerFlavor,
        call: &TriggerCall<'_>,
        catalog: &mut impl Catalog,
        db: &mut impl QueryEngine,
        sink: &mut impl EventSink,
    ) -> Result<TriggerOutcome, RowlogError> {
        // local replication role: logging is off for this session
        if call.session_role == SessionRole::Local {
            return Ok(TriggerOutcome {
                event: None,
                suppress_operation: false,
            });
        }

        check_calling_conventions(flavor, call)?;

        let queue_name = call
            .args
            .first()
            .cloned()
            .ok_or(ConfigError::MissingQueue)?;

        let info = self.cache.lookup(call.table, catalog, db)?;
        let table_name = info.table_name.clone();
        let table_pkey_list = info.pkey_list.clone();
        let pkey_names = info.pkey_names.clone();
        let json_table = info.json_table.clone();

        if flavor == TriggerFlavor::SqlLegacy {
            let legacy = LegacyArgs::parse(call.args)?;
            legacy.validate(live_columns(call.columns).count())?;
            let table_name = legacy.table_name.clone().unwrap_or(table_name);
            let filter = ColumnFilter::Legacy {
                attkind: &legacy.attkind,
            };

            let mut ev = ChangeEvent::new(call.op);
            ev.ev_type = Some(call.op.code().to_string());
            ev.ev_extra1 = Some(table_name);

            let Some(sql) =
                encode::make_sql(call.op, call.columns, call.old, call.new, &filter)?
            else {
                return Ok(TriggerOutcome {
                    event: None,
                    suppress_operation: false,
                });
            };
            ev.ev_data = Some(sql);

            fill_reserved_columns(&mut ev, call)?;

            let id = sink.append(&queue_name, &ev)?;
            return Ok(TriggerOutcome {
                event: Some(id),
                suppress_operation: false,
            });
        }

        // modern path: parsed arguments are cached per trigger
        let tginfo = info.trigger_entry(call.trigger);
        if !tginfo.finalized {
            let parsed = TriggerArgs::parse(call.args, call.op)?;
            tginfo.skip = parsed.skip;
            tginfo.backup = parsed.backup;
            tginfo.deny = parsed.deny;
            tginfo.ignore_list = parsed.ignore_list;
            tginfo.pkey_list = parsed.pkey_list;
            for (field, expr) in &parsed.overrides {
                build_override(tginfo, *field, expr, call, db)?;
            }
            tginfo.finalized = true;
        }

        let skip = tginfo.skip;
        let deny = tginfo.deny;
        let backup = tginfo.backup;
        let ignore_list = tginfo.ignore_list.clone();
        let pkey_override = tginfo.pkey_list.clone();
        let suppress_operation = skip && call.timing == Timing::Before;

        let pkey_list = pkey_override.clone().unwrap_or(table_pkey_list);
        if matches!(call.op, Operation::Update | Operation::Delete) && pkey_list.is_empty() {
            return Err(SchemaError::NoPrimaryKey { table: table_name }.into());
        }

        if skip && call.timing == Timing::After {
            return Err(ConfigError::SkipAfterTrigger.into());
        }

        if deny {
            return Err(ConfigError::ChangeDenied {
                table: table_name,
                queue: queue_name,
                op: call.op.as_str().to_string(),
            }
            .into());
        }

        let filter = ColumnFilter::Names {
            pkey_list: &pkey_list,
            ignore_list: ignore_list.as_deref(),
        };

        let mut ev = ChangeEvent::new(call.op);
        ev.ev_extra1 = Some(table_name.clone());
        ev.ev_type = Some(match flavor {
            TriggerFlavor::Sql | TriggerFlavor::SqlLegacy => call.op.code().to_string(),
            TriggerFlavor::UrlEncoded => {
                if call.op == Operation::Truncate {
                    call.op.code().to_string()
                } else {
                    format!("{}:{}", call.op.code(), pkey_list)
                }
            }
            TriggerFlavor::Json => encode::json_type_field(
                call.op,
                &json_table,
                &pkey_names,
                pkey_override.as_deref(),
            ),
        });

        // backup copy of the pre-change image, if requested
        if backup && call.op == Operation::Update {
            if let Some(old) = call.old {
                ev.ev_extra2 = Some(match flavor {
                    TriggerFlavor::Json => {
                        encode::json_encode_row(call.op, call.columns, old, &filter)
                    }
                    _ => encode::url_encode_row(call.op, call.columns, old, &filter),
                });
            }
        }

        // gate the event and build the payload
        let emit = match flavor {
            TriggerFlavor::Sql | TriggerFlavor::SqlLegacy => {
                match encode::make_sql(call.op, call.columns, call.old, call.new, &filter)? {
                    Some(sql) => {
                        ev.ev_data = Some(sql);
                        true
                    }
                    None => false,
                }
            }
            TriggerFlavor::UrlEncoded | TriggerFlavor::Json => {
                let interesting = match (call.op, call.old, call.new) {
                    (Operation::Update, Some(old), Some(new)) => {
                        interesting_update(call.columns, old, new, &filter)?
                    }
                    _ => true,
                };
                if interesting {
                    let empty = RowImage::new();
                    let row = call.current_row().unwrap_or(&empty);
                    ev.ev_data = Some(if flavor == TriggerFlavor::Json {
                        encode::json_encode_row(call.op, call.columns, row, &filter)
                    } else {
                        encode::url_encode_row(call.op, call.columns, row, &filter)
                    });
                }
                interesting
            }
        };

        if !emit {
            return Ok(TriggerOutcome {
                event: None,
                suppress_operation,
            });
        }

        fill_reserved_columns(&mut ev, call)?;
        run_overrides(&mut ev, tginfo, call, db)?;

        if ev.skip {
            return Ok(TriggerOutcome {
                event: None,
                suppress_operation,
            });
        }

        let id = sink.append(&queue_name, &ev)?;
        Ok(TriggerOutcome {
            event: Some(id),
            suppress_operation,
        })
    }
}

fn check_calling_conventions(
    flavor: TriggerFlavor,
    call: &TriggerCall<'_>,
) -> Result<(), ConfigError> {
    if call.op == Operation::Truncate {
        if call.level != Level::Statement {
            return Err(ConfigError::NotStatementTrigger);
        }
    } else if call.level != Level::Row {
        return Err(ConfigError::NotRowTrigger);
    }
    if flavor == TriggerFlavor::SqlLegacy && call.timing != Timing::After {
        return Err(ConfigError::LegacyNotAfter);
    }
    Ok(())
}

/// Compile one `field=expression` override into its cached builder slot.
///
/// An existing prepared builder is reused as-is; a poisoned one (its last
/// prepare failed) is discarded and rebuilt.
fn build_override(
    tginfo: &mut TriggerInfo,
    field: EventField,
    expr: &str,
    call: &TriggerCall<'_>,
    db: &mut impl QueryEngine,
) -> Result<(), RowlogError> {
    let slot = &mut tginfo.queries[field.index()];
    if let Some(existing) = slot {
        if existing.is_prepared() {
            return Ok(());
        }
        existing.release(db);
        *slot = None;
    }

    let bindings = CallBindings { call };

    // attach first so a failed prepare stays visible for the rebuild path
    *slot = Some(QueryBuilder::new(call.standard_strings));
    let Some(qb) = slot.as_mut() else {
        return Ok(());
    };
    qb.add_raw("select ");
    qb.add_parsed(expr, &bindings)?;
    qb.prepare(&bindings, db)
}

/// Copy reserved `_rowlog_ev_*` column values into their event fields.
fn fill_reserved_columns(
    ev: &mut ChangeEvent,
    call: &TriggerCall<'_>,
) -> Result<(), RowlogError> {
    let Some(row) = call.current_row() else {
        return Ok(());
    };
    for lc in live_columns(call.columns) {
        let name = &lc.column.name;
        let Some(suffix) = name.strip_prefix(RESERVED_COLUMN_PREFIX) else {
            continue;
        };
        let field = EventField::ALL
            .into_iter()
            .find(|f| f.column_suffix() == Some(suffix))
            .ok_or_else(|| ConfigError::UnknownReservedColumn {
                column: name.clone(),
            })?;
        let value = row
            .get(lc.pos)
            .and_then(|v| v.as_ref())
            .map(|v| v.canonical_text());
        if let Some(slot) = ev.field_slot(field) {
            *slot = value;
        }
    }
    Ok(())
}

/// Execute override queries in field-declaration order; the `when` verdict
/// is recorded on the event and applied before the append.
fn run_overrides(
    ev: &mut ChangeEvent,
    tginfo: &TriggerInfo,
    call: &TriggerCall<'_>,
    db: &mut impl QueryEngine,
) -> Result<(), RowlogError> {
    let bindings = CallBindings { call };
    for field in EventField::ALL {
        let Some(query) = &tginfo.queries[field.index()] else {
            continue;
        };

        let rows = query.execute(&bindings, db)?;
        if rows.len() != 1 {
            return Err(ExecError::BadRowCount { rows: rows.len() }.into());
        }
        let row = &rows[0];
        if row.len() != 1 {
            return Err(ExecError::BadColumnCount {
                columns: row.len(),
            }
            .into());
        }
        let value = &row[0];

        if field == EventField::When {
            match value {
                Some(SqlValue::Bool(true)) => {}
                Some(SqlValue::Bool(false)) => ev.skip = true,
                Some(_) => return Err(ExecError::WhenNotBool.into()),
                None => return Err(ExecError::WhenNull.into()),
            }
            continue;
        }

        let text = value.as_ref().map(|v| v.canonical_text());
        if let Some(slot) = ev.field_slot(field) {
            *slot = text;
        }
    }
    Ok(())
}
