//! Column classification: which columns are keys, which are skipped.

use rowlog_core::Column;

/// Reserved prefix for columns that feed event fields directly.
///
/// Columns named `_rowlog_ev_<field>` never appear in encoded payloads;
/// their values are copied into the named event field instead.
pub const RESERVED_COLUMN_PREFIX: &str = "_rowlog_ev_";

/// Whether a column name carries the reserved event-field prefix.
pub fn is_reserved_column(name: &str) -> bool {
    name.starts_with(RESERVED_COLUMN_PREFIX)
}

/// Find a name in a comma-separated list, matching whole tokens only.
///
/// Tokens cannot contain embedded whitespace; surrounding whitespace is
/// tolerated. `"bb"` is found in `"a,bb,c"` but `"b"` is not.
pub fn strlist_contains(list: &str, name: &str) -> bool {
    list.split(',').any(|tok| tok.trim() == name)
}

/// One live (non-dropped) column together with its positions.
#[derive(Debug, Clone, Copy)]
pub struct LiveColumn<'a> {
    /// Position in the full attribute list (row image index).
    pub pos: usize,
    /// Position counting live columns only (column-kind string index).
    pub live_idx: usize,
    pub column: &'a Column,
}

/// Iterate live columns in ascending position order.
pub fn live_columns(columns: &[Column]) -> impl Iterator<Item = LiveColumn<'_>> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.dropped)
        .enumerate()
        .map(|(live_idx, (pos, column))| LiveColumn {
            pos,
            live_idx,
            column,
        })
}

/// Column classification strategy.
///
/// The legacy positional mode and the name-list mode answer the same two
/// questions, so every encoder takes the enum instead of branching on the
/// trigger style itself.
#[derive(Debug, Clone)]
pub enum ColumnFilter<'a> {
    /// Fixed-length column-kind string: position `i` holds `'k'` (key),
    /// `'i'` (ignore), anything else is a normal column. Positions past the
    /// end of the string are skipped.
    Legacy { attkind: &'a str },
    /// Explicit pkey name list (trigger override or catalog-derived) and an
    /// optional ignore list.
    Names {
        pkey_list: &'a str,
        ignore_list: Option<&'a str>,
    },
}

impl ColumnFilter<'_> {
    /// Is this column part of the primary key?
    pub fn is_pkey(&self, column: &Column, live_idx: usize) -> bool {
        match self {
            ColumnFilter::Legacy { attkind } => attkind.as_bytes().get(live_idx) == Some(&b'k'),
            ColumnFilter::Names { pkey_list, .. } => {
                if column.dropped || is_reserved_column(&column.name) {
                    return false;
                }
                strlist_contains(pkey_list, &column.name)
            }
        }
    }

    /// Should this column be left out of encoded payloads?
    pub fn should_skip(&self, column: &Column, live_idx: usize) -> bool {
        if column.dropped {
            return true;
        }
        if is_reserved_column(&column.name) {
            return true;
        }
        match self {
            ColumnFilter::Legacy { attkind } => match attkind.as_bytes().get(live_idx) {
                None => true,
                Some(&k) => k == b'i',
            },
            ColumnFilter::Names { ignore_list, .. } => {
                ignore_list.is_some_and(|list| strlist_contains(list, &column.name))
            }
        }
    }

    /// Whether this filter can ignore any column at all. When it cannot,
    /// the change detector only needs to look at key columns.
    pub fn has_ignores(&self) -> bool {
        match self {
            ColumnFilter::Legacy { attkind } => attkind.contains('i'),
            ColumnFilter::Names { ignore_list, .. } => ignore_list.is_some(),
        }
    }
}
