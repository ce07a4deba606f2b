//! Error types for rowlog operations.
//!
//! One enum per failure domain; all fold into [`RowlogError`]. None of these
//! are retried internally - a fatal condition aborts the current invocation
//! before any event is appended.

use thiserror::Error;

/// Bad trigger arguments or a disallowed combination of options.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("trigger must have destination queue as first argument")]
    MissingQueue,

    #[error("bad trigger argument: {arg}")]
    BadArgument { arg: String },

    #[error("legacy trigger must be used with 2 or 3 arguments")]
    BadLegacyArgCount,

    #[error("{option} does not make sense for truncate trigger")]
    InvalidForTruncate { option: String },

    #[error("SKIP does not work in AFTER trigger")]
    SkipAfterTrigger,

    #[error("ins/upd/del trigger must be fired FOR EACH ROW")]
    NotRowTrigger,

    #[error("truncate trigger must be fired FOR EACH STATEMENT")]
    NotStatementTrigger,

    #[error("legacy trigger must be fired AFTER")]
    LegacyNotAfter,

    #[error("table '{table}' to queue '{queue}': change not allowed ({op})")]
    ChangeDenied {
        table: String,
        queue: String,
        op: String,
    },

    #[error("unknown reserved column: {column}")]
    UnknownReservedColumn { column: String },
}

/// Schema-level violations detected while assembling an event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("cannot resolve table {table}: {reason}")]
    TableLookup { table: u32, reason: String },

    #[error("update/delete on table '{table}' without primary key")]
    NoPrimaryKey { table: String },

    #[error("primary key update not allowed")]
    PkeyUpdate,

    #[error("need at least one key column")]
    NoKeyColumn,

    #[error("key column does not exist")]
    KeyColumnMissing,

    #[error("unexpected NULL key value")]
    NullKeyValue,
}

/// Malformed override expression; fatal at first use.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated block comment")]
    UnterminatedComment,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated quoted identifier")]
    UnterminatedIdent,

    #[error("unterminated dollar-quoted string")]
    UnterminatedDollarQuote,

    #[error("stray dollar sign")]
    StrayDollar,

    #[error("standalone dot")]
    StrayDot,

    #[error("too many query parameters (max {max})")]
    TooManyParams { max: usize },
}

/// Override query could not be prepared or produced an unusable result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("query not prepared yet")]
    NotPrepared,

    #[error("prepare failed: {reason}")]
    PrepareFailed { reason: String },

    #[error("override query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("expected 1 row from override query, got {rows}")]
    BadRowCount { rows: usize },

    #[error("expected 1 column from override query, got {columns}")]
    BadColumnCount { columns: usize },

    #[error("when= query result must be boolean")]
    WhenNotBool,

    #[error("when= result must not be NULL")]
    WhenNull,
}

/// Destination queue rejected the event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppendError {
    #[error("unknown queue: {queue}")]
    UnknownQueue { queue: String },

    #[error("queue '{queue}' rejected the event: {reason}")]
    Rejected { queue: String, reason: String },
}

/// Master error type for all rowlog failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowlogError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("exec error: {0}")]
    Exec(#[from] ExecError),

    #[error("append error: {0}")]
    Append(#[from] AppendError),
}

/// Result type alias for rowlog operations.
pub type RowlogResult<T> = Result<T, RowlogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::BadArgument {
            arg: "frobnicate".to_string(),
        };
        assert!(format!("{}", err).contains("frobnicate"));
    }

    #[test]
    fn test_schema_error_display_pkey() {
        let err = SchemaError::PkeyUpdate;
        assert!(format!("{}", err).contains("primary key update"));
    }

    #[test]
    fn test_exec_error_display_row_count() {
        let err = ExecError::BadRowCount { rows: 3 };
        let msg = format!("{}", err);
        assert!(msg.contains("1 row"));
        assert!(msg.contains("got 3"));
    }

    #[test]
    fn test_rowlog_error_from_variants() {
        let config = RowlogError::from(ConfigError::MissingQueue);
        assert!(matches!(config, RowlogError::Config(_)));

        let schema = RowlogError::from(SchemaError::PkeyUpdate);
        assert!(matches!(schema, RowlogError::Schema(_)));

        let parse = RowlogError::from(ParseError::StrayDot);
        assert!(matches!(parse, RowlogError::Parse(_)));

        let exec = RowlogError::from(ExecError::NotPrepared);
        assert!(matches!(exec, RowlogError::Exec(_)));

        let append = RowlogError::from(AppendError::UnknownQueue {
            queue: "q".to_string(),
        });
        assert!(matches!(append, RowlogError::Append(_)));
    }
}
