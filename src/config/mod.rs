pub mod cli;
pub mod credentials;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::adapters::image_source::SUPPORTED_EXTENSIONS;
#[cfg(feature = "cli")]
use crate::adapters::openai::{ModelSettings, DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::Schema;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "card-etl")]
#[command(about = "Extract customer card fields from photos into a CSV file")]
pub struct CliConfig {
    /// Directory holding the card photos
    #[arg(long, default_value = ".")]
    pub image_dir: String,

    /// Glob file-name pattern, e.g. `img_*.jpg` or `img_[0-9].jpg`
    #[arg(long, default_value = "img_*.jpg")]
    pub pattern: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "customer_cards.csv")]
    pub output_file: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub api_endpoint: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Environment variable holding the API key
    #[arg(long, default_value = credentials::DEFAULT_API_KEY_ENV)]
    pub api_key_env: String,

    /// Override the card schema, e.g. `--fields NO,氏名,住所`
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Output delimiter, a single character or `\t` for TSV
    #[arg(long, default_value = ",")]
    pub delimiter: String,

    #[arg(long, default_value = "image/jpeg")]
    pub default_mime_type: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU/memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            endpoint: self.api_endpoint.clone(),
            model: self.model.clone(),
            timeout_seconds: self.timeout_seconds,
        }
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn image_pattern(&self) -> &str {
        &self.pattern
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_file(&self) -> &str {
        &self.output_file
    }

    fn delimiter(&self) -> crate::utils::error::Result<u8> {
        validation::parse_delimiter("delimiter", &self.delimiter)
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn default_mime_type(&self) -> &str {
        &self.default_mime_type
    }

    fn schema_fields(&self) -> &[String] {
        &self.fields
    }

    fn prompt_instruction(&self) -> Option<&str> {
        None
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        validation::validate_path("image_dir", &self.image_dir)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_path("output_file", &self.output_file)?;
        validation::validate_image_pattern("pattern", &self.pattern, &SUPPORTED_EXTENSIONS)?;
        validation::validate_url("api_endpoint", &self.api_endpoint)?;
        validation::validate_non_empty_string("model", &self.model)?;
        validation::validate_positive_number("max_tokens", self.max_tokens as usize, 1)?;
        validation::validate_non_empty_string("api_key_env", &self.api_key_env)?;
        self.delimiter()?;
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_range("timeout_seconds", timeout, 1, 600)?;
        }
        Schema::from_fields_or_default(&self.fields)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let config = CliConfig::parse_from(["card-etl"]);
        assert_eq!(config.pattern, "img_*.jpg");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, 300);
        assert_eq!(config.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.delimiter().unwrap(), b',');
        assert!(config.schema_fields().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides() {
        let config = CliConfig::parse_from([
            "card-etl",
            "--image-dir",
            "./cards",
            "--fields",
            "NO,氏名,住所",
            "--delimiter",
            "\t",
            "--timeout-seconds",
            "30",
        ]);
        assert_eq!(config.schema_fields().len(), 3);
        assert_eq!(config.delimiter().unwrap(), b'\t');
        assert_eq!(config.model_settings().timeout_seconds, Some(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_validation_errors() {
        let config = CliConfig::parse_from(["card-etl", "--max-tokens", "0"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["card-etl", "--fields", "NO,NO"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["card-etl", "--pattern", "img_*.txt"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["card-etl", "--delimiter", ";;"]);
        assert!(config.delimiter().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_escaped_tab_delimiter() {
        // 殼層輸入的 `\t` 是兩個字元
        let config = CliConfig::parse_from(["card-etl", "--delimiter", "\\t"]);
        assert_eq!(config.delimiter().unwrap(), b'\t');
        assert!(config.validate().is_ok());
    }
}
