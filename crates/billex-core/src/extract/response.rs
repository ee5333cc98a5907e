//! Interpretation of the raw text returned by the line structurer.

use serde_json::Value;

use crate::error::ResponseError;
use crate::models::fields::{FieldGuess, FieldValue};

/// Parse a model reply into scalar field guesses.
///
/// Code fences and a `json` language tag are stripped, then the remainder
/// must be exactly one JSON object. Non-scalar members (objects, arrays,
/// booleans, nulls) are dropped. The text is only ever parsed as data.
pub fn parse_response(raw: &str) -> Result<Vec<FieldGuess>, ResponseError> {
    let body = strip_fences(raw);
    if body.is_empty() {
        return Err(ResponseError::Empty);
    }

    let value: Value = serde_json::from_str(body)?;
    let Value::Object(map) = value else {
        return Err(ResponseError::NotAnObject);
    };

    Ok(map
        .iter()
        .filter_map(|(key, value)| {
            FieldValue::from_json(value).map(|v| FieldGuess::new(key.clone(), v))
        })
        .collect())
}

fn strip_fences(raw: &str) -> &str {
    let mut body = raw.trim();

    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim_start();
        if let Some(rest) = body.strip_prefix("json") {
            body = rest;
        }
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_object() {
        let guesses = parse_response(r#"{ "installation_charge": 150.00 }"#).unwrap();
        assert_eq!(
            guesses,
            vec![FieldGuess::new("installation_charge", FieldValue::Float(150.0))]
        );
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{ \"due_date\": \"12/28/15\" }\n```";
        let guesses = parse_response(raw).unwrap();
        assert_eq!(
            guesses,
            vec![FieldGuess::new("due_date", FieldValue::Text("12/28/15".into()))]
        );
    }

    #[test]
    fn test_key_containing_json_survives() {
        let guesses = parse_response(r#"{"json_ref": 12}"#).unwrap();
        assert_eq!(guesses[0].key, "json_ref");
    }

    #[test]
    fn test_trailing_commentary_is_malformed() {
        let raw = r#"{ "total_bill_amount": 499.99 } Hope this helps!"#;
        assert!(matches!(parse_response(raw), Err(ResponseError::Malformed(_))));
    }

    #[test]
    fn test_python_literal_is_malformed() {
        assert!(matches!(
            parse_response("{'monthly_rental': 1200}"),
            Err(ResponseError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(parse_response("[1, 2]"), Err(ResponseError::NotAnObject)));
        assert!(matches!(parse_response("42"), Err(ResponseError::NotAnObject)));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(parse_response("  ``` ```  "), Err(ResponseError::Empty)));
        assert!(matches!(parse_response(""), Err(ResponseError::Empty)));
    }

    #[test]
    fn test_nested_values_dropped() {
        let raw = r#"{"total": 12, "items": [1, 2], "meta": {"a": 1}, "paid": true, "note": null}"#;
        let guesses = parse_response(raw).unwrap();
        assert_eq!(guesses, vec![FieldGuess::new("total", FieldValue::Int(12))]);
    }
}
