//! Fuzz test for the SQL fragment tokenizer
//!
//! Feeds arbitrary byte sequences to the tokenizer to find:
//! - Panics or crashes
//! - Infinite loops
//! - Broken span accounting
//!
//! Run with: cargo +nightly fuzz run tokenizer_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use rowlog_sql::SqlTokenizer;

fuzz_target!(|data: &[u8]| {
    // The tokenizer takes UTF-8; skip inputs that are not
    if let Ok(input) = std::str::from_utf8(data) {
        for standard_strings in [false, true] {
            let mut consumed = String::new();
            let mut errored = false;
            for token in SqlTokenizer::new(input, standard_strings) {
                match token {
                    Ok(t) => {
                        // Tokens are never empty; that would loop forever
                        assert!(!t.text.is_empty(), "empty token");
                        consumed.push_str(t.text);
                    }
                    Err(_) => {
                        errored = true;
                        break;
                    }
                }
            }
            // On a clean lex, concatenated spans rebuild the input exactly
            if !errored {
                assert_eq!(consumed, input, "token spans must cover the input");
            }
        }
    }
});
