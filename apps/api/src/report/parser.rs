//! Response Parser: recovers a JSON object from model text that is supposed to be
//! pure JSON but sometimes arrives wrapped in code fences or prose.
//!
//! Algorithm: trim; strip a leading ```/```json fence and its closing fence; take the
//! span from the first `{` to the last `}` and decode it.
//!
//! Known limitation: this is not a tokenizer. Braces in the prose around the object
//! (or a stray unbalanced brace inside a string) widen the span and the decode fails.
//! Prompts tell the model to emit bare JSON, which keeps that case rare.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("No JSON object found in response")]
    NoObject,

    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

/// Raised when a step's model output holds no decodable JSON object.
#[derive(Debug, Error)]
#[error("Failed to parse {step} from model response: {reason}")]
pub struct ParseError {
    pub step: String,
    pub reason: ParseFailure,
}

/// Extracts the JSON object embedded in `raw`. `step` names the caller in errors.
pub fn parse_json_object(raw: &str, step: &str) -> Result<Map<String, Value>, ParseError> {
    let fail = |reason: ParseFailure| ParseError {
        step: step.to_string(),
        reason,
    };

    let cleaned = strip_code_fence(raw.trim());
    let span = brace_span(cleaned).ok_or_else(|| fail(ParseFailure::NoObject))?;

    serde_json::from_str::<Map<String, Value>>(span).map_err(|e| fail(ParseFailure::Decode(e)))
}

/// Strips ```json ... ``` or ``` ... ``` from already-trimmed text.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };

    let rest = rest.trim();
    rest.strip_suffix("```").unwrap_or(rest)
}

/// First `{` through last `}`, inclusive.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn parse(raw: &str) -> Value {
        Value::Object(parse_json_object(raw, "gap analysis").unwrap())
    }

    #[test]
    fn test_parses_bare_object() {
        assert_eq!(parse(r#"{"roleFitScore": 72}"#), json!({"roleFitScore": 72}));
    }

    #[test]
    fn test_strips_json_tagged_fence() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(parse(input), json!({"key": "value"}));
    }

    #[test]
    fn test_strips_untagged_fence() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(parse(input), json!({"key": "value"}));
    }

    #[test]
    fn test_strips_uppercase_tag_and_surrounding_whitespace() {
        let input = "\n\n  ```JSON\n{\"key\": [1, 2]}\n```  \n";
        assert_eq!(parse(input), json!({"key": [1, 2]}));
    }

    #[test]
    fn test_extracts_object_from_prose() {
        let input = "Sure! Here is the analysis:\n{\"summary\": \"PM with ML depth\"}\nLet me know.";
        assert_eq!(parse(input), json!({"summary": "PM with ML depth"}));
    }

    #[test]
    fn test_keeps_nested_objects_intact() {
        let input = r#"Result: {"skills": {"technical": ["Rust"], "soft": []}, "atsScore": 80}"#;
        assert_eq!(
            parse(input),
            json!({"skills": {"technical": ["Rust"], "soft": []}, "atsScore": 80})
        );
    }

    #[test]
    fn test_no_object_names_step() {
        let err = parse_json_object("I cannot help with that.", "strategy plan").unwrap_err();
        assert!(matches!(err.reason, ParseFailure::NoObject));
        assert_eq!(err.step, "strategy plan");
        assert_eq!(
            err.to_string(),
            "Failed to parse strategy plan from model response: No JSON object found in response"
        );
    }

    #[test]
    fn test_reversed_braces_are_not_an_object() {
        let err = parse_json_object("} nothing here {", "resume analysis").unwrap_err();
        assert!(matches!(err.reason, ParseFailure::NoObject));
    }

    #[test]
    fn test_invalid_json_span_reports_decode_error() {
        let err = parse_json_object("{summary: unquoted}", "resume analysis").unwrap_err();
        assert!(matches!(err.reason, ParseFailure::Decode(_)));
        assert!(err.to_string().starts_with("Failed to parse resume analysis"));
    }

    #[test]
    fn test_braces_in_trailing_prose_break_extraction() {
        // Documented limitation: the greedy span swallows the prose brace.
        let input = r#"{"a": 1} and also {note}"#;
        assert!(parse_json_object(input, "interview prep").is_err());
    }

    fn json_object() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            "[a-zA-Z0-9 ,.:{}\\[\\]]{0,16}".prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ];
        let value = leaf.prop_recursive(2, 12, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        });
        prop::collection::btree_map("[a-zA-Z]{1,10}", value, 0..6)
            .prop_map(|m| Value::Object(m.into_iter().collect()))
    }

    proptest! {
        /// Property: an object inside a fence is recovered exactly.
        #[test]
        fn fenced_object_is_recovered(object in json_object(), tagged in any::<bool>(), pretty in any::<bool>()) {
            let body = if pretty {
                serde_json::to_string_pretty(&object).unwrap()
            } else {
                serde_json::to_string(&object).unwrap()
            };
            let fence = if tagged { "```json" } else { "```" };
            let raw = format!("{fence}\n{body}\n```");

            let parsed = parse_json_object(&raw, "cover letter").unwrap();
            prop_assert_eq!(Value::Object(parsed), object);
        }

        /// Property: an object surrounded by brace-free prose is recovered exactly.
        #[test]
        fn object_in_prose_is_recovered(
            object in json_object(),
            before in "[a-zA-Z0-9 ,.:!\n]{0,40}",
            after in "[a-zA-Z0-9 ,.:!\n]{0,40}",
        ) {
            let raw = format!("{before}{}{after}", serde_json::to_string(&object).unwrap());

            let parsed = parse_json_object(&raw, "gap analysis").unwrap();
            prop_assert_eq!(Value::Object(parsed), object);
        }
    }
}
