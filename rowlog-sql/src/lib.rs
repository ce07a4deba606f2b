//! Rowlog SQL - tokenizer, quoting and the override-expression compiler.
//!
//! A hand-written tokenizer scans SQL-like expression fragments (flex/bison
//! would be overkill here); [`QueryBuilder`] re-lexes an override expression,
//! rewrites column references to positional parameters and prepares the
//! result through the host's query engine.

pub mod builder;
pub mod lexer;
pub mod quote;

pub use builder::{PlanState, QueryBuilder, MAX_QUERY_ARGS};
pub use lexer::{next_token, SqlTokenizer, Token, TokenKind};
pub use quote::{is_reserved_keyword, quote_ident, quote_literal};
