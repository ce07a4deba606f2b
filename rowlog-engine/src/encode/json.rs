//! JSON row encoder with type-directed literal formatting.

use crate::classify::{live_columns, ColumnFilter};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rowlog_core::{Column, DateTimeValue, Operation, RowImage, SqlValue};

/// Append one JSON string literal.
///
/// Escapes `"` and `\`, the named control sequences, and any remaining
/// control byte below space as `\u00XX`.
pub fn json_string(buf: &mut String, s: &str) {
    buf.push('"');
    for ch in s.chars() {
        match ch {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\u{8}' => buf.push_str("\\b"),
            '\u{c}' => buf.push_str("\\f"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            c if (c as u32) < 0x20 => buf.push_str(&format!("\\u{:04x}", c as u32)),
            c => buf.push(c),
        }
    }
    buf.push('"');
}

fn date_to_json(buf: &mut String, d: &DateTimeValue<NaiveDate>) {
    match d {
        DateTimeValue::Finite(d) => {
            buf.push('"');
            buf.push_str(&d.format("%Y-%m-%d").to_string());
            buf.push('"');
        }
        DateTimeValue::Infinity => buf.push_str("\"infinity\""),
        DateTimeValue::NegInfinity => buf.push_str("\"-infinity\""),
    }
}

fn timestamp_to_json(buf: &mut String, t: &DateTimeValue<NaiveDateTime>) {
    match t {
        DateTimeValue::Finite(t) => {
            buf.push('"');
            buf.push_str(&t.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
            buf.push('"');
        }
        DateTimeValue::Infinity => buf.push_str("\"infinity\""),
        DateTimeValue::NegInfinity => buf.push_str("\"-infinity\""),
    }
}

fn timestamptz_to_json(buf: &mut String, t: &DateTimeValue<DateTime<FixedOffset>>) {
    match t {
        DateTimeValue::Finite(t) => {
            buf.push('"');
            buf.push_str(&t.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string());
            buf.push('"');
        }
        DateTimeValue::Infinity => buf.push_str("\"infinity\""),
        DateTimeValue::NegInfinity => buf.push_str("\"-infinity\""),
    }
}

/// Append one value: booleans and small integers bare, 64-bit integers as
/// bare canonical text, date/time as quoted ISO-8601, everything else as a
/// JSON-escaped string.
fn value_to_json(buf: &mut String, value: &SqlValue) {
    match value {
        SqlValue::Bool(true) => buf.push_str("true"),
        SqlValue::Bool(false) => buf.push_str("false"),
        SqlValue::Int2(n) => buf.push_str(&n.to_string()),
        SqlValue::Int4(n) => buf.push_str(&n.to_string()),
        SqlValue::Int8(n) => buf.push_str(&n.to_string()),
        SqlValue::Date(d) => date_to_json(buf, d),
        SqlValue::Timestamp(t) => timestamp_to_json(buf, t),
        SqlValue::TimestampTz(t) => timestamptz_to_json(buf, t),
        SqlValue::Text(s) => json_string(buf, s),
        SqlValue::Other(s) => json_string(buf, s),
    }
}

/// Encode a row as a JSON object; key order follows column order.
/// Truncate has no row and encodes as `{}`.
pub fn encode_row(
    op: Operation,
    columns: &[Column],
    row: &RowImage,
    filter: &ColumnFilter<'_>,
) -> String {
    if op == Operation::Truncate {
        return "{}".to_string();
    }

    let mut buf = String::from("{");
    let mut first = true;
    for lc in live_columns(columns) {
        if filter.should_skip(lc.column, lc.live_idx) {
            continue;
        }
        if first {
            first = false;
        } else {
            buf.push(',');
        }

        json_string(&mut buf, &lc.column.name);
        buf.push(':');

        match row.get(lc.pos).and_then(|v| v.as_ref()) {
            None => buf.push_str("null"),
            Some(value) => value_to_json(&mut buf, value),
        }
    }
    buf.push('}');
    buf
}

/// Build the JSON `ev_type` object: operation name, table and pkey arrays.
///
/// `pkey_override` replaces the catalog-derived key names when the trigger
/// configured its own list.
pub fn json_type_field(
    op: Operation,
    json_table: &str,
    pkey_names: &[String],
    pkey_override: Option<&str>,
) -> String {
    let mut buf = format!("{{\"op\":\"{}\",", op.as_str());
    buf.push_str(json_table);
    buf.push_str(",\"pkey\":[");
    match pkey_override {
        Some(list) => {
            for (i, name) in list.split(',').enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                json_string(&mut buf, name);
            }
        }
        None => {
            for (i, name) in pkey_names.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                json_string(&mut buf, name);
            }
        }
    }
    buf.push_str("]}");
    buf
}
