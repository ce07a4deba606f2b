//! SQL identifier and literal quoting for the SQL fragment encoder.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Keywords that force identifier quoting. Unreserved keywords are usable as
/// bare column names and are deliberately absent.
static RESERVED_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // fully reserved
        "all",
        "analyse",
        "analyze",
        "and",
        "any",
        "array",
        "as",
        "asc",
        "asymmetric",
        "both",
        "case",
        "cast",
        "check",
        "collate",
        "column",
        "constraint",
        "create",
        "current_catalog",
        "current_date",
        "current_role",
        "current_time",
        "current_timestamp",
        "current_user",
        "default",
        "deferrable",
        "desc",
        "distinct",
        "do",
        "else",
        "end",
        "except",
        "false",
        "fetch",
        "for",
        "foreign",
        "from",
        "grant",
        "group",
        "having",
        "in",
        "initially",
        "intersect",
        "into",
        "lateral",
        "leading",
        "limit",
        "localtime",
        "localtimestamp",
        "not",
        "null",
        "offset",
        "on",
        "only",
        "or",
        "order",
        "placing",
        "primary",
        "references",
        "returning",
        "select",
        "session_user",
        "some",
        "symmetric",
        "table",
        "then",
        "to",
        "trailing",
        "true",
        "union",
        "unique",
        "user",
        "using",
        "variadic",
        "when",
        "where",
        "window",
        "with",
        // reserved except in function or type names
        "authorization",
        "binary",
        "collation",
        "concurrently",
        "cross",
        "current_schema",
        "freeze",
        "full",
        "ilike",
        "inner",
        "is",
        "isnull",
        "join",
        "left",
        "like",
        "natural",
        "notnull",
        "outer",
        "overlaps",
        "right",
        "similar",
        "tablesample",
        "verbose",
        // usable as function names but not as bare column names
        "between",
        "bigint",
        "bit",
        "boolean",
        "char",
        "character",
        "coalesce",
        "dec",
        "decimal",
        "exists",
        "extract",
        "float",
        "greatest",
        "grouping",
        "inout",
        "int",
        "integer",
        "interval",
        "least",
        "national",
        "nchar",
        "none",
        "nullif",
        "numeric",
        "out",
        "overlay",
        "position",
        "precision",
        "real",
        "row",
        "setof",
        "smallint",
        "substring",
        "time",
        "timestamp",
        "treat",
        "trim",
        "values",
        "varchar",
        "xmlattributes",
        "xmlconcat",
        "xmlelement",
        "xmlexists",
        "xmlforest",
        "xmlparse",
        "xmlpi",
        "xmlroot",
        "xmlserialize",
    ]
    .into_iter()
    .collect()
});

/// Whether an identifier collides with a keyword that needs quoting.
pub fn is_reserved_keyword(ident: &str) -> bool {
    RESERVED_KEYWORDS.contains(ident)
}

/// Append an identifier, quoting only if needed.
///
/// Quoting is avoided when the identifier starts with a lowercase letter or
/// underscore, contains only lowercase letters, digits and underscores, and
/// is not a reserved keyword.
pub fn quote_ident(buf: &mut String, ident: &str) {
    let bytes = ident.as_bytes();
    let safe = bytes
        .first()
        .is_some_and(|&c| c.is_ascii_lowercase() || c == b'_')
        && bytes
            .iter()
            .all(|&c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == b'_')
        && !is_reserved_keyword(ident);

    if safe {
        buf.push_str(ident);
        return;
    }

    buf.push('"');
    for ch in ident.chars() {
        if ch == '"' {
            buf.push('"');
        }
        buf.push(ch);
    }
    buf.push('"');
}

/// Append a value literal, single-quoted.
///
/// Embedded quotes are doubled; the presence of a backslash switches the
/// whole literal to the escape-string `E'...'` form with doubled backslashes.
pub fn quote_literal(buf: &mut String, value: &str) {
    if value.contains('\\') {
        buf.push('E');
    }
    buf.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => buf.push_str("''"),
            '\\' => buf.push_str("\\\\"),
            c => buf.push(c),
        }
    }
    buf.push('\'');
}
