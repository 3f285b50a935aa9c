//! Label response parsing.
//!
//! Turns the free-form answer of a vision model into a medication candidate.
//! Recovery runs in two tiers:
//! - structural: find and decode a JSON object, or fail with [`ParseFailure`]
//! - per field: anything missing or unusable is replaced by a sentinel and
//!   listed in [`Extraction::gaps`]
//!
//! Everything here is pure; no I/O and no shared state.

mod coerce;
pub mod report;
pub mod strategy;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use strategy::{BracketObject, CandidateStrategy, FencedBlock, WholeText};

/// Placeholder for text fields the model did not provide.
pub const UNKNOWN: &str = "Unknown";

/// Medication fields the vision model is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Medication,
    Dosage,
    TimesPerDay,
    TimesToTake,
}

impl Field {
    pub const ALL: [Self; 4] = [
        Self::Medication,
        Self::Dosage,
        Self::TimesPerDay,
        Self::TimesToTake,
    ];

    /// Key of the field in the model's JSON answer.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Medication => "medication",
            Self::Dosage => "dosage",
            Self::TimesPerDay => "timesPerDay",
            Self::TimesToTake => "timesToTake",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A medication as read off a label, before it belongs to anyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMedication {
    pub medication: String,
    pub dosage: String,
    pub times_per_day: u32,
    pub times_to_take: String,
}

/// Successful parse: a complete candidate plus the fields that were defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub medication: ExtractedMedication,
    /// Fields that could not be determined and hold a sentinel value.
    pub gaps: Vec<Field>,
}

impl Extraction {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }

    #[must_use]
    pub fn is_defaulted(&self, field: Field) -> bool {
        self.gaps.contains(&field)
    }
}

/// No decodable object in the response. Keeps the text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub raw_text: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no medication object found in response ({} bytes)",
            self.raw_text.len()
        )
    }
}

impl std::error::Error for ParseFailure {}

pub type ExtractionResult = Result<Extraction, ParseFailure>;

/// Ordered chain of candidate strategies followed by decode and coercion.
pub struct LabelParser {
    strategies: Vec<Box<dyn CandidateStrategy>>,
}

impl Default for LabelParser {
    /// Fenced block, then bracket matching, then the whole text.
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(FencedBlock),
                Box::new(BracketObject),
                Box::new(WholeText),
            ],
        }
    }
}

impl LabelParser {
    /// Parser with no strategies; every input fails until some are added.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy, consulted after the existing ones.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl CandidateStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn parse(&self, raw_text: &str) -> ExtractionResult {
        let failure = || ParseFailure {
            raw_text: raw_text.to_string(),
        };

        let candidate = self
            .strategies
            .iter()
            .find_map(|strategy| {
                strategy.candidate(raw_text).inspect(|candidate| {
                    debug!(
                        "Candidate from {} strategy ({} bytes)",
                        strategy.name(),
                        candidate.len()
                    );
                })
            })
            .ok_or_else(failure)?;

        let object: Map<String, Value> = serde_json::from_str(candidate).map_err(|e| {
            debug!("Candidate is not a JSON object: {e}");
            failure()
        })?;

        Ok(coerce_object(&object))
    }
}

/// Parse with the default strategy chain.
pub fn parse_label_response(raw_text: &str) -> ExtractionResult {
    LabelParser::default().parse(raw_text)
}

fn coerce_object(object: &Map<String, Value>) -> Extraction {
    let mut gaps = Vec::new();
    let mut text = |field: Field| {
        coerce::text(object.get(field.key())).unwrap_or_else(|| {
            gaps.push(field);
            UNKNOWN.to_string()
        })
    };

    let medication = text(Field::Medication);
    let dosage = text(Field::Dosage);
    let times_to_take = text(Field::TimesToTake);

    let times_per_day = coerce::count(object.get(Field::TimesPerDay.key())).unwrap_or_else(|| {
        gaps.push(Field::TimesPerDay);
        0
    });

    gaps.sort_by_key(|field| Field::ALL.iter().position(|f| f == field));

    Extraction {
        medication: ExtractedMedication {
            medication,
            dosage,
            times_per_day,
            times_to_take,
        },
        gaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> Extraction {
        match parse_label_response(raw) {
            Ok(extraction) => extraction,
            Err(failure) => panic!("expected extraction, got {failure}"),
        }
    }

    #[test]
    fn fenced_payload_with_all_fields() {
        let raw = "```json\n{\"medication\":\"Amoxicillin\",\"dosage\":\"500mg\",\"timesPerDay\":3,\"timesToTake\":\"With meals\"}\n```";
        let extraction = parsed(raw);

        assert_eq!(
            extraction.medication,
            ExtractedMedication {
                medication: "Amoxicillin".to_string(),
                dosage: "500mg".to_string(),
                times_per_day: 3,
                times_to_take: "With meals".to_string(),
            }
        );
        assert!(extraction.is_complete());
    }

    #[test]
    fn unfenced_object_with_missing_fields_is_defaulted() {
        let extraction =
            parsed("Here you go: {\"medication\":\"Ibuprofen\",\"dosage\":\"200mg\"}");

        assert_eq!(extraction.medication.medication, "Ibuprofen");
        assert_eq!(extraction.medication.dosage, "200mg");
        assert_eq!(extraction.medication.times_per_day, 0);
        assert_eq!(extraction.medication.times_to_take, UNKNOWN);
        assert_eq!(extraction.gaps, vec![Field::TimesPerDay, Field::TimesToTake]);
    }

    #[test]
    fn times_per_day_string_is_coerced() {
        let extraction = parsed(
            "{\"medication\":\"Lisinopril\",\"dosage\":\"10mg\",\"timesPerDay\":\"2\",\"timesToTake\":\"Morning and evening\"}",
        );
        assert_eq!(extraction.medication.times_per_day, 2);
        assert!(!extraction.is_defaulted(Field::TimesPerDay));
    }

    #[test]
    fn prose_without_object_fails() {
        let raw = "Sorry, I cannot read this label.";
        let Err(failure) = parse_label_response(raw) else {
            panic!("prose must not parse");
        };
        assert_eq!(failure.raw_text, raw);
    }

    #[test]
    fn empty_input_fails() {
        assert_eq!(
            parse_label_response(""),
            Err(ParseFailure {
                raw_text: String::new()
            })
        );
        assert!(parse_label_response("   \n").is_err());
    }

    #[test]
    fn non_object_json_fails() {
        assert!(parse_label_response("42").is_err());
        assert!(parse_label_response("[1, 2, 3]").is_err());
        assert!(parse_label_response("\"medication\"").is_err());
    }

    #[test]
    fn malformed_bracket_candidate_fails_without_fallback() {
        let raw = "Result: {\"medication\": \"Ibuprofen\", dosage: 200mg}";
        assert!(parse_label_response(raw).is_err());
    }

    #[test]
    fn fence_and_bracket_forms_agree() {
        let body = "{\"medication\":\"Metformin\",\"dosage\":\"850mg\",\"timesPerDay\":2,\"timesToTake\":\"With breakfast and dinner\"}";
        let fenced = parsed(&format!("Label says:\n```json\n{body}\n```"));
        let bare = parsed(&format!("Label says: {body}. Hope this helps!"));
        let whole = parsed(body);

        assert_eq!(fenced, bare);
        assert_eq!(bare, whole);
    }

    #[test]
    fn bare_object_without_medication_key_uses_whole_text() {
        let extraction = parsed("  {\"dosage\": \"5mg\"}  ");
        assert_eq!(extraction.medication.medication, UNKNOWN);
        assert_eq!(extraction.medication.dosage, "5mg");
        assert_eq!(
            extraction.gaps,
            vec![Field::Medication, Field::TimesPerDay, Field::TimesToTake]
        );
    }

    #[test]
    fn empty_strings_and_nulls_are_gaps() {
        let extraction = parsed(
            "{\"medication\":\"\",\"dosage\":null,\"timesPerDay\":\"unknown\",\"timesToTake\":\"  \"}",
        );
        assert_eq!(extraction.gaps, Field::ALL.to_vec());
        assert_eq!(extraction.medication.medication, UNKNOWN);
        assert_eq!(extraction.medication.dosage, UNKNOWN);
        assert_eq!(extraction.medication.times_per_day, 0);
        assert_eq!(extraction.medication.times_to_take, UNKNOWN);
    }

    #[test]
    fn explicit_zero_is_not_a_gap() {
        let extraction = parsed("{\"medication\":\"Vitamin D\",\"timesPerDay\":0}");
        assert_eq!(extraction.medication.times_per_day, 0);
        assert!(!extraction.is_defaulted(Field::TimesPerDay));
    }

    #[test]
    fn fractional_count_truncates() {
        let extraction = parsed("{\"medication\":\"X\",\"timesPerDay\":2.8}");
        assert_eq!(extraction.medication.times_per_day, 2);
    }

    #[test]
    fn parsing_is_idempotent() {
        let inputs = [
            "```json\n{\"medication\":\"A\",\"timesPerDay\":\"1\"}\n```",
            "noise {\"medication\":\"B\"} noise",
            "nothing useful",
            "",
        ];
        for raw in inputs {
            assert_eq!(parse_label_response(raw), parse_label_response(raw));
        }
    }

    struct LastLine;

    impl CandidateStrategy for LastLine {
        fn name(&self) -> &'static str {
            "last-line"
        }

        fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str> {
            raw.lines().last()
        }
    }

    #[test]
    fn custom_strategy_can_be_appended() {
        let parser = LabelParser::empty().with_strategy(LastLine);
        let Ok(extraction) = parser.parse("header\n{\"medication\":\"Aspirin\"}") else {
            panic!("last line is an object");
        };
        assert_eq!(extraction.medication.medication, "Aspirin");

        assert!(LabelParser::empty().parse("{\"medication\":\"A\"}").is_err());
    }
}
