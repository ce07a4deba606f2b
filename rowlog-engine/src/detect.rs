//! Change detection for updates.

use crate::classify::{live_columns, ColumnFilter};
use rowlog_core::{Column, RowImage, SchemaError, SqlValue};

/// Equality test for two non-null values of one column.
///
/// Values of the same mapped type compare natively; anything else falls back
/// to comparing canonical text, the way the host compares types without a
/// registered equality operator.
pub fn values_equal(a: &SqlValue, b: &SqlValue) -> bool {
    if a.sql_type() == b.sql_type() {
        a == b
    } else {
        a.canonical_text() == b.canonical_text()
    }
}

/// Decide whether an update is worth an event.
///
/// Scans live columns in order; for each one that actually changed: a
/// primary-key column fails the whole operation, an ignored column is
/// counted, any other column makes the update interesting. If only ignored
/// columns changed the update is dropped; an update where nothing changed at
/// all is still reported so consumers keep their position information.
pub fn interesting_update(
    columns: &[Column],
    old: &RowImage,
    new: &RowImage,
    filter: &ColumnFilter<'_>,
) -> Result<bool, SchemaError> {
    let has_ignores = filter.has_ignores();
    let mut ignore_count = 0;

    for lc in live_columns(columns) {
        let is_pk = filter.is_pkey(lc.column, lc.live_idx);

        // without an ignore list only key columns can change the verdict
        if !is_pk && !has_ignores {
            continue;
        }

        let old_value = old.get(lc.pos).and_then(|v| v.as_ref());
        let new_value = new.get(lc.pos).and_then(|v| v.as_ref());

        match (old_value, new_value) {
            // both NULL: unchanged
            (None, None) => continue,
            (Some(o), Some(n)) if values_equal(o, n) => continue,
            _ => {}
        }

        // the pkey veto outranks ignore-list membership
        if is_pk {
            return Err(SchemaError::PkeyUpdate);
        }

        if filter.should_skip(lc.column, lc.live_idx) {
            ignore_count += 1;
            continue;
        }

        // a non-ignored column has changed
        return Ok(true);
    }

    // only ignored columns changed
    if ignore_count > 0 {
        return Ok(false);
    }

    // do show NOP updates
    Ok(true)
}
