use crate::utils::error::{EtlError, Result};
use std::fmt;

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// API key for the model endpoint, read once at startup.
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn from_env(var_name: &str) -> Result<Self> {
        match std::env::var(var_name) {
            Ok(value) if !value.trim().is_empty() => Ok(Self::new(value.trim())),
            _ => Err(EtlError::MissingConfigError {
                field: var_name.to_string(),
            }),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

// 不要把金鑰印進日誌
impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env() {
        std::env::set_var("CARD_ETL_TEST_KEY_PRESENT", "sk-test");
        let credentials = ApiCredentials::from_env("CARD_ETL_TEST_KEY_PRESENT").unwrap();
        assert_eq!(credentials.api_key(), "sk-test");
        std::env::remove_var("CARD_ETL_TEST_KEY_PRESENT");
    }

    #[test]
    fn test_missing_or_blank_key_is_config_error() {
        let err = ApiCredentials::from_env("CARD_ETL_TEST_KEY_MISSING").unwrap_err();
        assert!(matches!(err, EtlError::MissingConfigError { ref field } if field == "CARD_ETL_TEST_KEY_MISSING"));

        std::env::set_var("CARD_ETL_TEST_KEY_BLANK", "  ");
        assert!(ApiCredentials::from_env("CARD_ETL_TEST_KEY_BLANK").is_err());
        std::env::remove_var("CARD_ETL_TEST_KEY_BLANK");
    }

    #[test]
    fn test_debug_redacts_key() {
        let credentials = ApiCredentials::new("sk-secret");
        assert!(!format!("{:?}", credentials).contains("sk-secret"));
    }
}
