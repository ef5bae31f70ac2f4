//! Cleanup and strict parsing of raw model output. The fence stripping is
//! purely cosmetic; everything semantic is left to serde and the validator.

use crate::rag::schema::{RagAnswer, SchemaError};

const SNIPPET_LIMIT: usize = 200;

/// Drop a surrounding triple-backtick fence, if any. Idempotent; text without
/// a leading fence is returned unchanged.
pub fn strip_markdown_fences(raw: &str) -> String {
    let mut s = raw.trim();

    if s.starts_with("```") {
        if let Some(newline) = s.find('\n') {
            s = &s[newline + 1..];
        }
        s = s.strip_suffix("```").unwrap_or(s);
        s = s.trim();
    }

    s.to_string()
}

/// Strip, parse, validate. Any parse failure carries a bounded snippet of the
/// cleaned text, never the full payload.
pub fn parse_answer(raw: &str) -> Result<RagAnswer, SchemaError> {
    let cleaned = strip_markdown_fences(raw);

    let answer: RagAnswer =
        serde_json::from_str(&cleaned).map_err(|e| SchemaError::InvalidJson {
            reason: e.to_string(),
            snippet: cleaned.chars().take(SNIPPET_LIMIT).collect(),
        })?;

    answer.validate()?;
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        assert_eq!(
            strip_markdown_fences("```json\n{\"a\":1}\n```"),
            "{\"a\":1}"
        );
    }

    #[test]
    fn unfenced_text_is_unchanged() {
        assert_eq!(strip_markdown_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_markdown_fences("  plain text  "), "plain text");
    }

    #[test]
    fn stripping_is_idempotent() {
        let once = strip_markdown_fences("```json\n{\"a\":1}\n```");
        assert_eq!(strip_markdown_fences(&once), once);
    }

    #[test]
    fn fence_without_language_tag() {
        assert_eq!(strip_markdown_fences("```\n{}\n```"), "{}");
    }

    #[test]
    fn parse_failure_carries_bounded_snippet() {
        let garbage = format!("```json\n{}\n```", "x".repeat(400));
        match parse_answer(&garbage) {
            Err(SchemaError::InvalidJson { snippet, .. }) => {
                assert_eq!(snippet.chars().count(), 200);
            }
            other => panic!("expected InvalidJson, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn truncated_json_is_an_invalid_json_error() {
        let truncated = "{\"product_assessment\": {\"product_type\": \"minuman\"";
        assert!(matches!(
            parse_answer(truncated),
            Err(SchemaError::InvalidJson { .. })
        ));
    }

    #[test]
    fn fenced_valid_answer_parses() {
        let raw = r#"```json
{
  "product_assessment": {
    "product_type": "minuman",
    "is_safe": true,
    "reasons": ["gula rendah"],
    "summary": "Aman dikonsumsi."
  },
  "recommendations": [],
  "summary": "Tidak ada alternatif yang sesuai."
}
```"#;
        let answer = parse_answer(raw).expect("fenced answer should parse");
        assert!(answer.recommendations.is_empty());
    }
}
