//! Tagged JSON form of an extraction result, as handed to presentation code.

use serde_json::{Value, json};

use super::ExtractionResult;

/// `{"ok": true, ...fields, "gaps": [...]}` or
/// `{"ok": false, "kind": "ParseFailure", "rawText": ...}`.
///
/// The failure form carries the raw model text; log it, do not show it.
#[must_use]
pub fn to_json(result: &ExtractionResult) -> Value {
    match result {
        Ok(extraction) => {
            let medication = &extraction.medication;
            json!({
                "ok": true,
                "medication": medication.medication,
                "dosage": medication.dosage,
                "timesPerDay": medication.times_per_day,
                "timesToTake": medication.times_to_take,
                "gaps": extraction.gaps,
            })
        }
        Err(failure) => json!({
            "ok": false,
            "kind": "ParseFailure",
            "rawText": failure.raw_text,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::parse_label_response;

    #[test]
    fn success_is_flat_and_tagged() {
        let result = parse_label_response("{\"medication\":\"Ibuprofen\",\"dosage\":\"200mg\"}");
        assert_eq!(
            to_json(&result),
            json!({
                "ok": true,
                "medication": "Ibuprofen",
                "dosage": "200mg",
                "timesPerDay": 0,
                "timesToTake": "Unknown",
                "gaps": ["timesPerDay", "timesToTake"],
            })
        );
    }

    #[test]
    fn failure_keeps_raw_text() {
        let result = parse_label_response("Sorry, I cannot read this label.");
        assert_eq!(
            to_json(&result),
            json!({
                "ok": false,
                "kind": "ParseFailure",
                "rawText": "Sorry, I cannot read this label.",
            })
        );
    }
}
