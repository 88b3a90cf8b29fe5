use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON object pattern compiles"));

/// Removes a leading ```json (or bare ```) fence and a trailing ``` fence.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Reads a JSON value out of model output.
///
/// The fenced/trimmed text is tried whole first, then the widest `{...}` span.
/// `None` means the attempt should be retried.
pub fn extract_json(text: &str) -> Option<Value> {
    let body = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str(body) {
        return Some(value);
    }
    JSON_OBJECT
        .find(body)
        .and_then(|found| serde_json::from_str(found.as_str()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    const BODY: &str = r#"{"tag_id": "COW-001", "species": "cow", "current_weight_kg": 500}"#;

    #[test_case(BODY ; "bare object")]
    #[test_case("```json\n{\"tag_id\": \"COW-001\", \"species\": \"cow\", \"current_weight_kg\": 500}\n```" ; "json fence")]
    #[test_case("```\n{\"tag_id\": \"COW-001\", \"species\": \"cow\", \"current_weight_kg\": 500}```" ; "bare fence")]
    #[test_case("  Here you go:\n{\"tag_id\": \"COW-001\",\n \"species\": \"cow\", \"current_weight_kg\": 500}\nThanks!" ; "surrounding prose")]
    fn extracts_the_same_object(raw: &str) {
        assert_eq!(
            extract_json(raw),
            Some(json!({"tag_id": "COW-001", "species": "cow", "current_weight_kg": 500}))
        );
    }

    #[test_case("" ; "empty")]
    #[test_case("no json here" ; "prose")]
    #[test_case("{\"tag_id\": \"COW-001\"" ; "unterminated")]
    #[test_case("{broken} and {also broken}" ; "invalid span")]
    fn unparseable_output_is_none(raw: &str) {
        assert_eq!(extract_json(raw), None);
    }

    #[test]
    fn fence_stripping_leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json{\"a\": 1}```"), "{\"a\": 1}");
    }
}
