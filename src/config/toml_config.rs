use crate::adapters::image_source::SUPPORTED_EXTENSIONS;
use crate::adapters::openai::{ModelSettings, DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::config::credentials::DEFAULT_API_KEY_ENV;
use crate::core::ConfigProvider;
use crate::domain::model::Schema;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub image_dir: String,
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_mime_type")]
    pub default_mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub name: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    pub timeout_seconds: Option<u64>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    #[serde(default = "default_output_file")]
    pub filename: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

fn default_pattern() -> String {
    "img_*.jpg".to_string()
}

fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_output_file() -> String {
    "customer_cards.csv".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            name: default_model(),
            max_tokens: default_max_tokens(),
            timeout_seconds: None,
            api_key_env: default_api_key_env(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CARD_DIR})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            endpoint: self.model.endpoint.clone(),
            model: self.model.name.clone(),
            timeout_seconds: self.model.timeout_seconds,
        }
    }

    pub fn image_dir(&self) -> &str {
        &self.source.image_dir
    }

    pub fn api_key_env(&self) -> &str {
        &self.model.api_key_env
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validation::validate_path("source.image_dir", &self.source.image_dir)?;
        validation::validate_image_pattern(
            "source.pattern",
            &self.source.pattern,
            &SUPPORTED_EXTENSIONS,
        )?;
        validation::validate_url("model.endpoint", &self.model.endpoint)?;
        validation::validate_non_empty_string("model.name", &self.model.name)?;
        validation::validate_positive_number("model.max_tokens", self.model.max_tokens as usize, 1)?;
        validation::validate_non_empty_string("model.api_key_env", &self.model.api_key_env)?;
        if let Some(timeout) = self.model.timeout_seconds {
            validation::validate_range("model.timeout_seconds", timeout, 1, 600)?;
        }
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_path("load.filename", &self.load.filename)?;
        self.delimiter()?;
        Schema::from_fields_or_default(&self.schema.fields)?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn image_pattern(&self) -> &str {
        &self.source.pattern
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_file(&self) -> &str {
        &self.load.filename
    }

    fn delimiter(&self) -> Result<u8> {
        validation::parse_delimiter("load.delimiter", &self.load.delimiter)
    }

    fn max_tokens(&self) -> u32 {
        self.model.max_tokens
    }

    fn default_mime_type(&self) -> &str {
        &self.source.default_mime_type
    }

    fn schema_fields(&self) -> &[String] {
        &self.schema.fields
    }

    fn prompt_instruction(&self) -> Option<&str> {
        self.prompt.instruction.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
