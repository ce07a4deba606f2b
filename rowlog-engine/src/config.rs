//! Trigger argument parsing.

use rowlog_core::{ConfigError, EventField, Operation, SchemaError};
use serde::{Deserialize, Serialize};

/// Parsed modern-style trigger arguments.
///
/// The first argument names the destination queue; the rest are flags,
/// name lists and `field=expression` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerArgs {
    pub queue_name: String,
    pub skip: bool,
    pub backup: bool,
    pub deny: bool,
    pub ignore_list: Option<String>,
    pub pkey_list: Option<String>,
    /// Override expressions in argument order.
    pub overrides: Vec<(EventField, String)>,
}

impl TriggerArgs {
    pub fn parse(args: &[String], op: Operation) -> Result<Self, ConfigError> {
        let Some(queue_name) = args.first() else {
            return Err(ConfigError::MissingQueue);
        };

        let mut parsed = TriggerArgs {
            queue_name: queue_name.clone(),
            ..TriggerArgs::default()
        };

        for arg in &args[1..] {
            if arg == "SKIP" {
                parsed.skip = true;
            } else if let Some(list) = arg.strip_prefix("ignore=") {
                parsed.ignore_list = Some(list.to_string());
            } else if let Some(list) = arg.strip_prefix("pkey=") {
                parsed.pkey_list = Some(list.to_string());
            } else if arg == "backup" {
                parsed.backup = true;
            } else if arg == "deny" {
                parsed.deny = true;
            } else if let Some((field, expr)) = parse_override(arg) {
                parsed.overrides.push((field, expr.to_string()));
            } else {
                return Err(ConfigError::BadArgument { arg: arg.clone() });
            }
        }

        if op == Operation::Truncate {
            if parsed.ignore_list.is_some() {
                return Err(ConfigError::InvalidForTruncate {
                    option: "column ignore".to_string(),
                });
            }
            if parsed.pkey_list.is_some() {
                return Err(ConfigError::InvalidForTruncate {
                    option: "custom pkey list".to_string(),
                });
            }
            if parsed.backup {
                return Err(ConfigError::InvalidForTruncate {
                    option: "backup".to_string(),
                });
            }
            if !parsed.overrides.is_empty() {
                return Err(ConfigError::InvalidForTruncate {
                    option: "custom expressions".to_string(),
                });
            }
        }

        Ok(parsed)
    }
}

fn parse_override(arg: &str) -> Option<(EventField, &str)> {
    for field in EventField::ALL {
        let prefix = field.arg_name();
        if let Some(rest) = arg.strip_prefix(prefix) {
            if let Some(expr) = rest.strip_prefix('=') {
                return Some((field, expr));
            }
        }
    }
    None
}

/// Legacy argument form: queue name, column-kind string, optional explicit
/// table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyArgs {
    pub queue_name: String,
    pub attkind: String,
    pub table_name: Option<String>,
}

impl LegacyArgs {
    pub fn parse(args: &[String]) -> Result<Self, ConfigError> {
        if args.is_empty() {
            return Err(ConfigError::MissingQueue);
        }
        if args.len() < 2 || args.len() > 3 {
            return Err(ConfigError::BadLegacyArgCount);
        }
        Ok(LegacyArgs {
            queue_name: args[0].clone(),
            attkind: args[1].clone(),
            table_name: args.get(2).cloned(),
        })
    }

    /// The kind string must address at least one key column among the live
    /// columns of the relation.
    pub fn validate(&self, live_column_count: usize) -> Result<(), SchemaError> {
        let Some(last_key) = self.attkind.rfind('k') else {
            return Err(SchemaError::NoKeyColumn);
        };
        if last_key >= live_column_count {
            return Err(SchemaError::KeyColumnMissing);
        }
        Ok(())
    }
}
