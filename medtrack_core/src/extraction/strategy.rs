//! Candidate payload strategies.
//!
//! Each strategy looks at the raw response text and either returns the slice
//! it believes holds the JSON object or `None`. The parser asks them in order
//! and decodes the first candidate it gets.

use std::sync::OnceLock;

/// Field name that marks an object as a medication payload.
pub const MEDICATION_KEY: &str = "\"medication\"";

pub trait CandidateStrategy: Send + Sync {
    /// Name used in debug logs.
    fn name(&self) -> &'static str;

    fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str>;
}

static FENCE_PATTERN: OnceLock<regex::Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn fence_pattern() -> &'static regex::Regex {
    FENCE_PATTERN.get_or_init(|| {
        regex::Regex::new(r"(?is)```(?:json)?\s*(\{.*?\})\s*```")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Object literal inside a ```` ```json ```` fence. The tag may be omitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FencedBlock;

impl CandidateStrategy for FencedBlock {
    fn name(&self) -> &'static str {
        "fenced-block"
    }

    fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str> {
        fence_pattern()
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Smallest balanced `{ ... }` span that mentions the `"medication"` key.
///
/// Handles answers where the object is surrounded by prose but not fenced.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketObject;

impl CandidateStrategy for BracketObject {
    fn name(&self) -> &'static str {
        "bracket-object"
    }

    fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let mut best: Option<(usize, usize)> = None;

        for (open, _) in raw.match_indices('{') {
            let Some(close) = matching_close(raw, open) else {
                continue;
            };
            if !raw[open..=close].contains(MEDICATION_KEY) {
                continue;
            }
            if best.is_none_or(|(start, end)| close - open < end - start) {
                best = Some((open, close));
            }
        }

        best.map(|(start, end)| &raw[start..=end])
    }
}

/// Byte index of the `}` closing the `{` at `open`, skipping braces that sit
/// inside JSON string literals.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[open..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// The whole response, trimmed. Last resort for bare JSON answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeText;

impl CandidateStrategy for WholeText {
    fn name(&self) -> &'static str {
        "whole-text"
    }

    fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_extracts_body() {
        let raw = "Here it is:\n```json\n{\"medication\": \"A\"}\n```\nThanks";
        assert_eq!(FencedBlock.candidate(raw), Some("{\"medication\": \"A\"}"));
    }

    #[test]
    fn fenced_block_accepts_uppercase_and_missing_tag() {
        assert_eq!(
            FencedBlock.candidate("```JSON {\"a\":1} ```"),
            Some("{\"a\":1}")
        );
        assert_eq!(FencedBlock.candidate("```\n{\"a\":1}\n```"), Some("{\"a\":1}"));
    }

    #[test]
    fn fenced_block_keeps_nested_objects() {
        let raw = "```json\n{\"medication\": \"A\", \"extra\": {\"k\": 1}}\n```";
        assert_eq!(
            FencedBlock.candidate(raw),
            Some("{\"medication\": \"A\", \"extra\": {\"k\": 1}}")
        );
    }

    #[test]
    fn fenced_block_ignores_other_languages() {
        assert_eq!(FencedBlock.candidate("```python\n{\"a\":1}\n```"), None);
        assert_eq!(FencedBlock.candidate("no fences here"), None);
    }

    #[test]
    fn bracket_object_requires_medication_key() {
        assert_eq!(BracketObject.candidate("{\"dosage\": \"5mg\"}"), None);
        assert_eq!(
            BracketObject.candidate("Result: {\"medication\": \"A\"} done"),
            Some("{\"medication\": \"A\"}")
        );
    }

    #[test]
    fn bracket_object_prefers_smallest_span() {
        let raw = "{\"data\": {\"medication\": \"A\", \"dosage\": \"1mg\"}, \"ok\": true}";
        assert_eq!(
            BracketObject.candidate(raw),
            Some("{\"medication\": \"A\", \"dosage\": \"1mg\"}")
        );
    }

    #[test]
    fn bracket_object_skips_braces_in_strings() {
        let raw = "x {\"medication\": \"A}\", \"dosage\": \"{2mg\"} y";
        assert_eq!(
            BracketObject.candidate(raw),
            Some("{\"medication\": \"A}\", \"dosage\": \"{2mg\"}")
        );
    }

    #[test]
    fn bracket_object_rejects_unbalanced() {
        assert_eq!(BracketObject.candidate("{\"medication\": \"A\""), None);
    }

    #[test]
    fn whole_text_trims_and_rejects_blank() {
        assert_eq!(WholeText.candidate("  {}\n"), Some("{}"));
        assert_eq!(WholeText.candidate(" \n\t"), None);
    }
}
