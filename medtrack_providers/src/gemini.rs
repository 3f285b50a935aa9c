use async_trait::async_trait;
use medtrack_core::{Error, VisionClient, VisionRequest};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini `generateContent` client for label images.
///
/// Every request is bounded by a timeout; a timeout is reported like any
/// other transport failure.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        info!("Creating GeminiProvider (timeout={}s)", timeout.as_secs());
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// JSON body for one prompt plus one inline image.
fn request_body(request: &VisionRequest<'_>) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": request.prompt },
                {
                    "inline_data": {
                        "mime_type": request.image.mime_type,
                        "data": request.image.data_base64,
                    }
                }
            ]
        }],
        "generationConfig": {
            "temperature": request.generation.temperature,
            "maxOutputTokens": request.generation.max_output_tokens,
        }
    })
}

/// `candidates[0].content.parts[0].text`, if present and non-empty.
fn first_text(response: &Value) -> Option<&str> {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .filter(|text| !text.is_empty())
}

fn transport_error(err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        warn!("Gemini API request timed out: {err}");
    } else {
        error!("Gemini API request failed: {err}");
    }
    Error::Upstream {
        status_code: err.status().map(|s| s.as_u16()),
        body: err.to_string(),
    }
}

#[async_trait]
impl VisionClient for GeminiProvider {
    async fn generate(&self, request: VisionRequest<'_>) -> medtrack_core::error::Result<String> {
        let body = request_body(&request);

        info!("Sending request to Gemini API: model={}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", request.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "Gemini API request failed: status={}, error={}",
                status.as_u16(),
                error_text
            );
            return Err(Error::Upstream {
                status_code: Some(status.as_u16()),
                body: error_text,
            });
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| transport_error(&e))?;

        let text = first_text(&payload).ok_or_else(|| {
            error!("No text response received from Gemini API");
            Error::NoTextResponse
        })?;

        info!("Received response from Gemini API ({} bytes)", text.len());
        Ok(text.to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
