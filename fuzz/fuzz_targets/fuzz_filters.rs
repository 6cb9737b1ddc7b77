//! Fuzz testing for query parameter validation and SOQL rendering.
//!
//! This fuzz target feeds arbitrary strings through the filter validation
//! pipeline and the SOQL literal escaper. It ensures that:
//!
//! - Validation never panics on any input
//! - Every accepted filter set renders to a SOQL string
//! - Escaped literals never leave a bare single quote behind
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! # Install cargo-fuzz (requires nightly)
//! cargo +nightly install cargo-fuzz
//!
//! # Run the filter fuzz target
//! cargo +nightly fuzz run fuzz_filters
//!
//! # Run with a time limit (e.g., 60 seconds)
//! cargo +nightly fuzz run fuzz_filters -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use unit_proxy::config::Config;
use unit_proxy::filters::{RawUnitQuery, validate};
use unit_proxy::soql::escape_literal;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let config = Config::default();

    // Each parameter gets the raw input on its own so a rejection in one
    // validator cannot mask a panic in another
    let single_field: &[fn(&mut RawUnitQuery, String)] = &[
        |raw, v| raw.unit_id = Some(v),
        |raw, v| raw.status = Some(v),
        |raw, v| raw.sub_status = Some(v),
        |raw, v| raw.model = Some(v),
        |raw, v| raw.offline = Some(v),
        |raw, v| raw.modified_since = Some(v),
        |raw, v| raw.from = Some(v),
        |raw, v| raw.to = Some(v),
        |raw, v| raw.fields = Some(v),
        |raw, v| raw.limit = Some(v),
        |raw, v| raw.offset = Some(v),
        |raw, v| raw.next_cursor = Some(v),
    ];
    for set in single_field {
        let mut raw = RawUnitQuery::default();
        set(&mut raw, s.to_string());
        if let Ok(filters) = validate(raw, &config) {
            // Anything that passed validation must render
            let _ = filters.to_soql().render();
        }
    }

    // Same input spread across every filter at once
    let mut raw = RawUnitQuery::default();
    for set in &single_field[..single_field.len() - 1] {
        set(&mut raw, s.to_string());
    }
    if let Ok(filters) = validate(raw, &config) {
        let _ = filters.to_soql().render();
    }

    // Escaping never panics and never leaves an unescaped quote
    let escaped = escape_literal(s);
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else {
            assert_ne!(c, '\'');
        }
    }
});
