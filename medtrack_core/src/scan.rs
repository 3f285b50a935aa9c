//! Label scan: image in, parsed medication out.
//!
//! One request per call. Nothing is retried here; a failed scan is reported
//! to the caller, which decides whether the user should try again.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::extraction::{Extraction, LabelParser};
use crate::vision::{GenerationConfig, VisionClient, VisionRequest};

/// Instruction sent alongside the label photo.
pub const LABEL_PROMPT: &str = r#"Analyze this image of a medication label and extract the following information:
1. Medication name
2. Dosage (including units)
3. Times per day to take
4. Specific times to take (e.g., morning, evening, etc.)

Return the information in JSON format with these exact keys:
{
  "medication": "medication name",
  "dosage": "dosage with units",
  "timesPerDay": number,
  "timesToTake": "description of when to take"
}"#;

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Base64 encoded label photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelImage {
    pub data_base64: String,
    pub mime_type: String,
}

impl LabelImage {
    pub fn new(data_base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data_base64: data_base64.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn jpeg(data_base64: impl Into<String>) -> Self {
        Self::new(data_base64, DEFAULT_MIME_TYPE)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data_base64.trim().is_empty()
    }
}

pub struct LabelScanner<C> {
    client: C,
    api_key: String,
    generation: GenerationConfig,
    parser: LabelParser,
}

impl<C: VisionClient> LabelScanner<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            generation: GenerationConfig::default(),
            parser: LabelParser::default(),
        }
    }

    #[must_use]
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: LabelParser) -> Self {
        self.parser = parser;
        self
    }

    /// Read the medication details off a label photo.
    ///
    /// Fields the model leaves out come back as sentinels and are listed in
    /// [`Extraction::gaps`].
    pub async fn scan(&self, image: &LabelImage) -> Result<Extraction> {
        if image.is_empty() {
            return Err(Error::MissingInput);
        }

        if self.api_key.trim().is_empty() {
            error!("Vision API key is not configured");
            return Err(Error::MissingCredential);
        }

        info!(
            "Sending label image to vision service: model={}, mime_type={}, {} bytes",
            self.client.model(),
            image.mime_type,
            image.data_base64.len()
        );

        let request = VisionRequest {
            api_key: &self.api_key,
            prompt: LABEL_PROMPT,
            image,
            generation: self.generation,
        };

        let text = self.client.generate(request).await.inspect_err(|e| {
            error!("Error processing medication image: {e}");
        })?;

        match self.parser.parse(&text) {
            Ok(extraction) => {
                info!(
                    "Successfully extracted medication information: medication={}, dosage={}, times_per_day={}, times_to_take={}, gaps={:?}",
                    extraction.medication.medication,
                    extraction.medication.dosage,
                    extraction.medication.times_per_day,
                    extraction.medication.times_to_take,
                    extraction.gaps
                );
                Ok(extraction)
            }
            Err(failure) => {
                error!(
                    "Failed to parse JSON from vision response: {}",
                    failure.raw_text
                );
                Err(failure.into())
            }
        }
    }
}
