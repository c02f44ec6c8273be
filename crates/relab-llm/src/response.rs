//! JSON extraction from free-text responses
//!
//! Models wrap JSON in prose and markdown fences no matter how firmly the
//! prompt forbids it. Extraction order:
//! 1. the whole response parses as-is
//! 2. the first ```json fenced block
//! 3. the first fenced block of any language
//! 4. the first balanced `{...}` or `[...]` region
//!
//! The extracted value is syntactically valid JSON only; schema validation
//! belongs to the caller.

use crate::error::ResponseError;
use serde_json::Value;

/// Extract the first syntactically valid JSON value from `response`
///
/// # Errors
/// - `ResponseError::NoJson` when no candidate region exists
/// - `ResponseError::Syntax` when the best candidate fails to parse
pub fn extract_first_json(response: &str) -> Result<Value, ResponseError> {
    let trimmed = response.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(block) = fenced_block(trimmed, "```json") {
        if let Ok(value) = serde_json::from_str::<Value>(block) {
            return Ok(value);
        }
    }

    if let Some(block) = fenced_block(trimmed, "```") {
        if let Ok(value) = serde_json::from_str::<Value>(block) {
            return Ok(value);
        }
    }

    match balanced_region(trimmed) {
        Some(region) => serde_json::from_str::<Value>(region).map_err(ResponseError::Syntax),
        None => Err(ResponseError::NoJson),
    }
}

/// First fenced code block opened by `fence`, without the fence lines
fn fenced_block<'a>(text: &'a str, fence: &str) -> Option<&'a str> {
    let start = text.find(fence)? + fence.len();
    let rest = &text[start..];
    // skip the rest of the opening fence line (e.g. "```json\n")
    let body_start = rest.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &rest[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// First balanced `{...}` or `[...]` region, respecting string literals
fn balanced_region(text: &str) -> Option<&str> {
    let open = text.find(|c| c == '{' || c == '[')?;
    let bytes = text.as_bytes();
    let (open_ch, close_ch) = if bytes[open] == b'{' {
        (b'{', b'}')
    } else {
        (b'[', b']')
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open_ch => depth += 1,
            _ if b == close_ch => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open..=i]);
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
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn extracts_bare_json() {
        let value = extract_first_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn extracts_from_json_fence() {
        let response = "Here is the result:\n```json\n{\"cells\": []}\n```\nDone.";
        let value = extract_first_json(response).unwrap();
        assert_eq!(value, json!({"cells": []}));
    }

    #[test]
    fn extracts_from_anonymous_fence() {
        let response = "```\n[1, 2, 3]\n```";
        let value = extract_first_json(response).unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn extracts_embedded_object_with_prose() {
        let response = "Sure! The answer is {\"ok\": true} as requested.";
        let value = extract_first_json(response).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn braces_inside_strings_do_not_terminate() {
        let response = r#"prefix {"text": "a } inside", "n": 2} suffix"#;
        let value = extract_first_json(response).unwrap();
        assert_eq!(value["n"], json!(2));
    }

    #[test]
    fn extracts_array_value() {
        let response = "cells follow: [{\"cell_type\": \"code\"}]";
        let value = extract_first_json(response).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn no_json_reports_no_json() {
        let err = extract_first_json("nothing structured here").unwrap_err();
        assert!(matches!(err, ResponseError::NoJson));
    }

    #[test]
    fn unbalanced_region_reports_no_json() {
        let err = extract_first_json("broken { \"a\": ").unwrap_err();
        assert!(matches!(err, ResponseError::NoJson));
    }
}
