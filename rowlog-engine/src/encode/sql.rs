//! SQL fragment encoder: partial statement bodies for insert/update/delete.

use crate::classify::{live_columns, ColumnFilter};
use rowlog_core::{Column, Operation, RowImage, SchemaError, SqlValue};
use rowlog_sql::{quote_ident, quote_literal};

/// Append one value literal, type-aware: integers stay bare, everything
/// else is single-quoted canonical text.
fn append_literal(buf: &mut String, value: &SqlValue) {
    match value {
        SqlValue::Int2(_) | SqlValue::Int4(_) | SqlValue::Int8(_) => {
            buf.push_str(&value.canonical_text())
        }
        _ => quote_literal(buf, &value.canonical_text()),
    }
}

/// Append `ident=literal` for a key column; NULL keys are a schema error.
fn append_key_eq(
    buf: &mut String,
    ident: &str,
    value: Option<&SqlValue>,
) -> Result<(), SchemaError> {
    let Some(value) = value else {
        return Err(SchemaError::NullKeyValue);
    };
    quote_ident(buf, ident);
    buf.push('=');
    append_literal(buf, value);
    Ok(())
}

/// Append `ident=literal` for a normal column; NULL renders as `NULL`.
fn append_normal_eq(buf: &mut String, ident: &str, value: Option<&SqlValue>) {
    quote_ident(buf, ident);
    buf.push('=');
    match value {
        Some(value) => append_literal(buf, value),
        None => buf.push_str("NULL"),
    }
}

/// `(col,col) values (lit,lit)` over the new row.
fn process_insert(columns: &[Column], new: &RowImage, filter: &ColumnFilter<'_>) -> String {
    let mut sql = String::from("(");

    let mut need_comma = false;
    for lc in live_columns(columns) {
        if filter.should_skip(lc.column, lc.live_idx) {
            continue;
        }
        if need_comma {
            sql.push(',');
        } else {
            need_comma = true;
        }
        quote_ident(&mut sql, &lc.column.name);
    }

    sql.push_str(") values (");

    let mut need_comma = false;
    for lc in live_columns(columns) {
        if filter.should_skip(lc.column, lc.live_idx) {
            continue;
        }
        if need_comma {
            sql.push(',');
        } else {
            need_comma = true;
        }
        match new.get(lc.pos).and_then(|v| v.as_ref()) {
            Some(value) => append_literal(&mut sql, value),
            None => sql.push_str("null"),
        }
    }

    sql.push(')');
    sql
}

/// `col=lit,... where pk=lit and ...`; `Ok(None)` when the update only
/// touched ignored columns and should be dropped.
fn process_update(
    columns: &[Column],
    old: &RowImage,
    new: &RowImage,
    filter: &ColumnFilter<'_>,
) -> Result<Option<String>, SchemaError> {
    let mut sql = String::new();
    let mut need_comma = false;
    let mut ignore_count = 0;

    for lc in live_columns(columns) {
        let old_value = old.get(lc.pos).and_then(|v| v.as_ref());
        let new_value = new.get(lc.pos).and_then(|v| v.as_ref());

        match (old_value, new_value) {
            (None, None) => continue,
            (Some(o), Some(n)) if crate::detect::values_equal(o, n) => continue,
            _ => {}
        }

        if filter.is_pkey(lc.column, lc.live_idx) {
            return Err(SchemaError::PkeyUpdate);
        }

        if filter.should_skip(lc.column, lc.live_idx) {
            ignore_count += 1;
            continue;
        }

        if need_comma {
            sql.push(',');
        } else {
            need_comma = true;
        }
        append_normal_eq(&mut sql, &lc.column.name, new_value);
    }

    // An update can set every column to its old value again. Re-assert the
    // first key column so downstream replay still sees a statement - unless
    // ignored columns absorbed the only real change.
    if !need_comma {
        if ignore_count > 0 {
            return Ok(None);
        }
        if let Some(lc) = live_columns(columns).find(|lc| filter.is_pkey(lc.column, lc.live_idx)) {
            append_key_eq(
                &mut sql,
                &lc.column.name,
                old.get(lc.pos).and_then(|v| v.as_ref()),
            )?;
        }
    }

    sql.push_str(" where ");
    append_pkey_clause(&mut sql, columns, old, filter)?;
    Ok(Some(sql))
}

/// `pk=lit and pk2=lit` over the old row.
fn append_pkey_clause(
    buf: &mut String,
    columns: &[Column],
    old: &RowImage,
    filter: &ColumnFilter<'_>,
) -> Result<(), SchemaError> {
    let mut need_and = false;
    for lc in live_columns(columns) {
        if !filter.is_pkey(lc.column, lc.live_idx) {
            continue;
        }
        if need_and {
            buf.push_str(" and ");
        } else {
            need_and = true;
        }
        append_key_eq(buf, &lc.column.name, old.get(lc.pos).and_then(|v| v.as_ref()))?;
    }
    Ok(())
}

/// Build the partial SQL statement body for one change.
///
/// `Ok(None)` means the change was absorbed by the ignore list and no event
/// should be emitted. Truncate has no payload and encodes as an empty body.
pub fn make_sql(
    op: Operation,
    columns: &[Column],
    old: Option<&RowImage>,
    new: Option<&RowImage>,
    filter: &ColumnFilter<'_>,
) -> Result<Option<String>, SchemaError> {
    let empty = RowImage::new();
    match op {
        Operation::Insert => {
            let new = new.unwrap_or(&empty);
            Ok(Some(process_insert(columns, new, filter)))
        }
        Operation::Update => {
            let old = old.unwrap_or(&empty);
            let new = new.unwrap_or(&empty);
            process_update(columns, old, new, filter)
        }
        Operation::Delete => {
            let old = old.unwrap_or(&empty);
            let mut sql = String::new();
            append_pkey_clause(&mut sql, columns, old, filter)?;
            Ok(Some(sql))
        }
        Operation::Truncate => Ok(Some(String::new())),
    }
}
