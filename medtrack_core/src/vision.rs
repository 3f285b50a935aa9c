use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scan::LabelImage;

/// Sampling settings sent with every vision request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    pub api_key: &'a str,
    pub prompt: &'a str,
    pub image: &'a LabelImage,
    pub generation: GenerationConfig,
}

/// A multimodal text generation service.
///
/// Implementations return the first text part of the answer. Transport
/// failures, timeouts and non-2xx responses map to [`crate::Error::Upstream`];
/// an answer without text maps to [`crate::Error::NoTextResponse`].
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn generate(&self, request: VisionRequest<'_>) -> Result<String>;

    fn model(&self) -> &str;
}
