//! URL-encoded row encoder.

use crate::classify::{live_columns, ColumnFilter};
use rowlog_core::{Column, Operation, RowImage};

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Percent-encode one string in the queue URL style: space becomes `+`,
/// alphanumerics and `_.-` pass through, every other byte becomes `%xx`.
pub fn urlencode(buf: &mut String, value: &str) {
    for &c in value.as_bytes() {
        match c {
            b' ' => buf.push('+'),
            b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'.' | b'-' => buf.push(c as char),
            _ => {
                buf.push('%');
                buf.push(HEX[(c >> 4) as usize] as char);
                buf.push(HEX[(c & 15) as usize] as char);
            }
        }
    }
}

/// Encode a row as `name=value&...`.
///
/// A NULL value is represented as a bare `name` with no `=`. Truncate has
/// no row and encodes to the empty string.
pub fn encode_row(
    op: Operation,
    columns: &[Column],
    row: &RowImage,
    filter: &ColumnFilter<'_>,
) -> String {
    let mut buf = String::new();
    if op == Operation::Truncate {
        return buf;
    }

    let mut first = true;
    for lc in live_columns(columns) {
        if filter.should_skip(lc.column, lc.live_idx) {
            continue;
        }
        if first {
            first = false;
        } else {
            buf.push('&');
        }

        urlencode(&mut buf, &lc.column.name);

        if let Some(value) = row.get(lc.pos).and_then(|v| v.as_ref()) {
            buf.push('=');
            urlencode(&mut buf, &value.canonical_text());
        }
    }
    buf
}
