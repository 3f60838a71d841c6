use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Model request failed with status {status}: {message}")]
    ModelError { status: u16, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Transport,
    Io,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::ApiError(_) | EtlError::ModelError { .. } => ErrorCategory::Transport,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    /// 設定錯誤在處理任何影像前就會中止，視為最嚴重
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Transport | ErrorCategory::Io => ErrorSeverity::High,
            ErrorCategory::Data => ErrorSeverity::Medium,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::MissingConfigError { field } => {
                format!("Set {} (environment variable or config file) and retry", field)
            }
            EtlError::InvalidConfigValueError { field, .. }
            | EtlError::ConfigValidationError { field, .. } => {
                format!("Check the value of '{}' in your configuration", field)
            }
            EtlError::ConfigError { .. } => "Check the configuration file syntax".to_string(),
            EtlError::ApiError(e) if e.is_timeout() => {
                "The model request timed out; raise the timeout or retry later".to_string()
            }
            EtlError::ApiError(_) => {
                "Check network connectivity and the model API endpoint".to_string()
            }
            EtlError::ModelError { status, .. } if *status == 401 || *status == 403 => {
                "Check that the API key is valid and has access to the model".to_string()
            }
            EtlError::ModelError { status, .. } if *status == 429 => {
                "Rate limited by the model API; wait and rerun the batch".to_string()
            }
            EtlError::ModelError { .. } => {
                "Check the model name and request limits, then rerun the batch".to_string()
            }
            EtlError::IoError(_) => {
                "Check that the image directory is readable and the output path is writable"
                    .to_string()
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "Check the output delimiter and the data being written".to_string()
            }
            EtlError::ProcessingError { .. } | EtlError::ValidationError { .. } => {
                "Inspect the input images and rerun with --verbose".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Transport => {
                format!("Text recognition failed, no output was written: {}", self)
            }
            ErrorCategory::Io => format!("File access failed: {}", self),
            ErrorCategory::Data => format!("Could not process card data: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_critical() {
        let err = EtlError::MissingConfigError {
            field: "OPENAI_API_KEY".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.recovery_suggestion().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_model_error_is_transport() {
        let err = EtlError::ModelError {
            status: 401,
            message: "invalid api key".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("API key"));
        assert!(err.user_friendly_message().contains("no output was written"));
    }
}
