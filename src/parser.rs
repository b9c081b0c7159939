//! Pulls the JSON array of records out of a model's free-text answer.
//!
//! Vision models are asked to answer with a bare JSON array, but they wrap it
//! in prose, markdown fences or a `{"items": [...]}` object often enough that
//! the answer has to be searched rather than parsed directly.

use log::debug;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{ExtractError, Result};
use crate::model::MenuItem;

fn outer_array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy: first '[' up to the last ']'. Infallible pattern.
    RE.get_or_init(|| Regex::new(r"\[[\s\S]*\]").expect("valid regex"))
}

/// Extract the first syntactically valid JSON array from `text`.
///
/// The widest bracketed span is tried first. When that does not parse (two
/// arrays separated by prose, a stray `]` in a trailing sentence), every
/// balanced `[...]` span is tried in order of its opening bracket.
pub fn extract_json_array(text: &str) -> Result<Vec<Value>> {
    debug!("Text received for extraction: {} bytes", text.len());

    let widest = outer_array_regex()
        .find(text)
        .ok_or_else(|| ExtractError::Parse("No JSON array found in the response".to_string()))?;

    let first_error = match serde_json::from_str::<Value>(widest.as_str()) {
        Ok(Value::Array(items)) => return Ok(items),
        Ok(_) => "The JSON found is not an array".to_string(),
        Err(e) => e.to_string(),
    };

    for candidate in balanced_arrays(text) {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(candidate) {
            debug!("Recovered array from balanced span of {} bytes", candidate.len());
            return Ok(items);
        }
    }

    Err(ExtractError::Parse(first_error))
}

/// Extract and convert straight to items with fresh identifiers.
pub fn parse_items(text: &str) -> Result<Vec<MenuItem>> {
    let records = extract_json_array(text)?;
    MenuItem::from_records(&records)
}

/// Every `[...]` span whose brackets balance, ignoring brackets inside JSON
/// strings. Spans are yielded by opening position, outermost first.
fn balanced_arrays(text: &str) -> impl Iterator<Item = &str> {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'[')
        .filter_map(move |(start, _)| matching_close(bytes, start).map(|end| &text[start..=end]))
}

fn matching_close(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array() {
        let items = extract_json_array(r#"[{"name":"Coxinha","price":"8"}]"#).unwrap();
        assert_eq!(items, vec![json!({"name": "Coxinha", "price": "8"})]);
    }

    #[test]
    fn test_array_inside_object() {
        let items = extract_json_array(r#"{"items": [{"name": "Suco"}]}"#).unwrap();
        assert_eq!(items, vec![json!({"name": "Suco"})]);
    }

    #[test]
    fn test_no_array() {
        let err = extract_json_array("I could not read this image.").unwrap_err();
        assert!(err.to_string().contains("No JSON array found"));
    }

    #[test]
    fn test_unclosed_array() {
        let err = extract_json_array(r#"[{"name": "Pastel""#).unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }

    #[test]
    fn test_trailing_bracket_in_prose_recovered() {
        let text = r#"Here: [{"name": "A"}] (see note [1])"#;
        let items = extract_json_array(text).unwrap();
        assert_eq!(items, vec![json!({"name": "A"})]);
    }

    #[test]
    fn test_brackets_inside_strings() {
        let text = r#"Result: [{"name": "Combo [P]", "description": "x ] y"}] ok [end"#;
        let items = extract_json_array(text).unwrap();
        assert_eq!(items[0]["name"], "Combo [P]");
        assert_eq!(items[0]["description"], "x ] y");
    }

    #[test]
    fn test_matching_close_skips_escaped_quotes() {
        let text = r#"["a \" ]", "b"]"#;
        assert_eq!(matching_close(text.as_bytes(), 0), Some(text.len() - 1));
    }

    #[test]
    fn test_parse_items_assigns_ids() {
        let items = parse_items(r#"[{"name":"A"},{"name":"B"}]"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_ne!(items[0].id, items[1].id);
    }
}
