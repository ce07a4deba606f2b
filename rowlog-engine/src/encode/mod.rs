//! Row encoders for the three wire formats.
//!
//! All three share column iteration order (ascending live-column position)
//! and the classifier's skip decision; only the literal formatting differs.

pub mod json;
pub mod sql;
pub mod url;

pub use json::{encode_row as json_encode_row, json_string, json_type_field};
pub use sql::make_sql;
pub use url::{encode_row as url_encode_row, urlencode};
