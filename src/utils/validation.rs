use crate::utils::error::{EtlError, Result};
use glob::Pattern;
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 檔名樣式必須是合法的 glob，並以影像副檔名結尾，例如 `img_*.jpg`
pub fn validate_image_pattern(
    field_name: &str,
    pattern: &str,
    allowed_extensions: &[&str],
) -> Result<()> {
    validate_non_empty_string(field_name, pattern)?;

    if pattern.contains('/') || pattern.contains('\\') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: pattern.to_string(),
            reason: "Pattern must match file names, not paths".to_string(),
        });
    }

    if let Err(e) = Pattern::new(pattern) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: pattern.to_string(),
            reason: format!("Invalid glob pattern: {}", e),
        });
    }

    let allowed: HashSet<&str> = allowed_extensions.iter().copied().collect();
    let extension = pattern
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if allowed.contains(ext.as_str()) || ext == "*" => Ok(()),
        Some(ext) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: pattern.to_string(),
            reason: format!(
                "Unsupported image extension: {}. Allowed extensions: {}",
                ext,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: pattern.to_string(),
            reason: "Pattern has no file extension".to_string(),
        }),
    }
}

pub fn validate_delimiter(field_name: &str, delimiter: char) -> Result<()> {
    if !delimiter.is_ascii() || delimiter == '"' || delimiter == '\n' || delimiter == '\r' {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: delimiter.escape_default().to_string(),
            reason: "Delimiter must be a single ASCII character other than quote or newline"
                .to_string(),
        });
    }
    Ok(())
}

/// 分隔符號設定值必須剛好一個字元，`\t` 視為 tab
pub fn parse_delimiter(field_name: &str, raw: &str) -> Result<u8> {
    let delimiter = if raw == "\\t" {
        '\t'
    } else {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: raw.to_string(),
                    reason: "Delimiter must be exactly one character".to_string(),
                })
            }
        }
    };

    validate_delimiter(field_name, delimiter)?;
    Ok(delimiter as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api_endpoint", "https://api.openai.com/v1/chat/completions").is_ok());
        assert!(validate_url("api_endpoint", "http://localhost:8080").is_ok());
        assert!(validate_url("api_endpoint", "").is_err());
        assert!(validate_url("api_endpoint", "invalid-url").is_err());
        assert!(validate_url("api_endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("max_tokens", 300, 1).is_ok());
        assert!(validate_positive_number("max_tokens", 0, 1).is_err());
    }

    #[test]
    fn test_validate_image_pattern() {
        let allowed = ["jpg", "jpeg", "png"];
        assert!(validate_image_pattern("pattern", "img_*.jpg", &allowed).is_ok());
        assert!(validate_image_pattern("pattern", "*.PNG", &allowed).is_ok());
        assert!(validate_image_pattern("pattern", "img_*.*", &allowed).is_ok());
        assert!(validate_image_pattern("pattern", "img_[0-9].jpg", &allowed).is_ok());
        assert!(validate_image_pattern("pattern", "img_[0-9.jpg", &allowed).is_err());
        assert!(validate_image_pattern("pattern", "img_*.txt", &allowed).is_err());
        assert!(validate_image_pattern("pattern", "img_*", &allowed).is_err());
        assert!(validate_image_pattern("pattern", "cards/*.jpg", &allowed).is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert!(validate_delimiter("delimiter", ',').is_ok());
        assert!(validate_delimiter("delimiter", '\t').is_ok());
        assert!(validate_delimiter("delimiter", '"').is_err());
        assert!(validate_delimiter("delimiter", '、').is_err());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("delimiter", ",").unwrap(), b',');
        assert_eq!(parse_delimiter("delimiter", "\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter("delimiter", "\t").unwrap(), b'\t');
        assert!(parse_delimiter("delimiter", ";;").is_err());
        assert!(parse_delimiter("delimiter", "").is_err());
        assert!(parse_delimiter("delimiter", "\"").is_err());
        assert!(parse_delimiter("delimiter", "、").is_err());
    }
}
