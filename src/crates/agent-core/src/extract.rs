//! Structured extraction from free-form model output.
//!
//! Models rarely answer with bare JSON. A reply may wrap the object in a
//! markdown fence, lead with an explanation, or trail off with commentary.
//! [`extract_json`] recovers the object anyway:
//!
//! 1. Scan left to right for a `{`.
//! 2. Walk forward counting brace depth, ignoring braces inside string
//!    literals (escape-aware), until the depth returns to zero.
//! 3. Parse that balanced substring. If it is a JSON object, it wins.
//!    Otherwise resume scanning after the candidate's closing `}`.
//!
//! Only top-level candidates are tried: an object nested inside a failed
//! candidate is never returned on its own, and a `{` that never closes ends
//! the scan, since everything after it is inside it. Each byte is visited
//! once, so the scan is linear in the input.
//!
//! The first balanced substring that parses as an object is returned, so
//! `{"a":1} {"b":2}` yields `{"a":1}`. Nothing here panics or returns an
//! error; failure is `None`.
//!
//! ```rust
//! use agent_core::extract::{extract_field, extract_json};
//!
//! let reply = "Sure! Here you go:\n```json\n{\"search_query\": \"capital of France\"}\n```";
//! let object = extract_json(reply).unwrap();
//! assert_eq!(object["search_query"], "capital of France");
//!
//! assert_eq!(extract_field(reply, "search_query").as_deref(), Some("capital of France"));
//! assert!(extract_json("no structure here").is_none());
//! ```

use serde_json::{Map, Value};
use tracing::trace;

/// A JSON object recovered from model output
pub type StructuredObject = Map<String, Value>;

/// Extract the first well-formed JSON object embedded in `text`
pub fn extract_json(text: &str) -> Option<StructuredObject> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;

        let Some(end) = balanced_end(text, start) else {
            trace!(start, "Unclosed brace; no top-level object follows");
            return None;
        };

        let candidate = &text[start..=end];
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(object)) => return Some(object),
            Ok(_) => {}
            Err(e) => {
                trace!(start, end, error = %e, "Skipping unparseable brace-balanced candidate");
            }
        }

        // '}' is one byte, so end + 1 is always a char boundary
        search_from = end + 1;
    }

    None
}

/// Extract `key` from the first embedded object, if it holds a string
pub fn extract_field(text: &str, key: &str) -> Option<String> {
    extract_json(text)?
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Byte index of the `}` closing the object that opens at `start`
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }

    None
}
