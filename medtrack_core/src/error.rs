use thiserror::Error;

use crate::extraction::ParseFailure;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a label scan, from input validation through parsing.
///
/// Missing or malformed individual fields are not represented here; the
/// parser defaults them and reports them as gaps on the extraction.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No image data provided")]
    MissingInput,

    #[error("API key for the vision service is missing")]
    MissingCredential,

    #[error("Vision service request failed{}: {body}", format_status(.status_code))]
    Upstream {
        status_code: Option<u16>,
        body: String,
    },

    #[error("Vision service returned no text response")]
    NoTextResponse,

    /// The raw text is kept for logging; it is never part of the message.
    #[error("Failed to parse medication data from response")]
    ParseFailure { raw_text: String },
}

impl Error {
    /// Short machine-readable name of the failure.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingInput => "MissingInput",
            Self::MissingCredential => "MissingCredential",
            Self::Upstream { .. } => "UpstreamError",
            Self::NoTextResponse => "NoTextResponse",
            Self::ParseFailure { .. } => "ParseFailure",
        }
    }
}

impl From<ParseFailure> for Error {
    fn from(failure: ParseFailure) -> Self {
        Self::ParseFailure {
            raw_text: failure.raw_text,
        }
    }
}

#[allow(clippy::ref_option)]
fn format_status(status_code: &Option<u16>) -> String {
    status_code.map_or_else(String::new, |code| format!(" (status {code})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_includes_status_when_known() {
        let err = Error::Upstream {
            status_code: Some(503),
            body: "overloaded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Vision service request failed (status 503): overloaded"
        );

        let err = Error::Upstream {
            status_code: None,
            body: "operation timed out".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Vision service request failed: operation timed out"
        );
    }

    #[test]
    fn parse_failure_message_hides_raw_text() {
        let err = Error::from(ParseFailure {
            raw_text: "Sorry, I cannot read this label.".to_string(),
        });
        assert!(!err.to_string().contains("Sorry"));
        assert_eq!(err.kind(), "ParseFailure");
    }
}
