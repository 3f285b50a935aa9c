//! Label photo loading for the scan command.

use anyhow::Context;
use base64::{Engine, engine::general_purpose::STANDARD};
use medtrack_core::LabelImage;
use std::path::Path;

/// MIME type of an image file by extension. Unknown extensions are sent as
/// JPEG, which the vision service accepts for most camera output.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "image/jpeg",
    }
}

pub fn encode(bytes: &[u8], mime_type: &str) -> LabelImage {
    LabelImage::new(STANDARD.encode(bytes), mime_type)
}

/// Read a label photo from disk as base64.
pub fn load_label_image(path: &Path, mime_override: Option<&str>) -> anyhow::Result<LabelImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image file: {}", path.display()))?;
    let mime_type = mime_override.unwrap_or_else(|| detect_mime_type(path));
    Ok(encode(&bytes, mime_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(detect_mime_type(Path::new("label.PNG")), "image/png");
        assert_eq!(detect_mime_type(Path::new("label.webp")), "image/webp");
        assert_eq!(detect_mime_type(Path::new("label.jpeg")), "image/jpeg");
        assert_eq!(detect_mime_type(Path::new("label")), "image/jpeg");
    }

    #[test]
    fn encode_produces_base64() {
        let image = encode(b"hello", "image/png");
        assert_eq!(image.data_base64, "aGVsbG8=");
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn empty_file_encodes_to_empty_image() {
        assert!(encode(b"", "image/jpeg").is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_label_image(Path::new("/nonexistent/label.jpg"), None).is_err());
    }
}
