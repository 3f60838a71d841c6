use crate::domain::model::EncodedImage;
use crate::utils::error::{EtlError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use glob::Pattern;
use std::path::Path;

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Glob file-name filter, e.g. `img_*.jpg` or `img_[0-9].jpg`.
#[derive(Debug, Clone)]
pub struct ImagePattern {
    pattern: Pattern,
}

impl ImagePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Pattern::new(pattern).map_err(|e| EtlError::InvalidConfigValueError {
            field: "image_pattern".to_string(),
            value: pattern.to_string(),
            reason: format!("Invalid glob pattern: {}", e),
        })?;

        Ok(Self { pattern })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches(file_name)
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// 依檔名字典序排序，確保每次執行的列順序一致
pub fn select_images<I>(file_names: I, pattern: &ImagePattern) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut selected: Vec<String> = file_names
        .into_iter()
        .filter(|name| pattern.matches(name))
        .collect();
    selected.sort();
    selected
}

pub fn mime_type_for(file_name: &str, default_mime: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg".to_string(),
        Some("png") => "image/png".to_string(),
        Some("gif") => "image/gif".to_string(),
        Some("webp") => "image/webp".to_string(),
        _ => default_mime.to_string(),
    }
}

pub fn encode_image(file_name: &str, bytes: &[u8], default_mime: &str) -> EncodedImage {
    EncodedImage {
        name: file_name.to_string(),
        mime_type: mime_type_for(file_name, default_mime),
        data: STANDARD.encode(bytes),
    }
}
