pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::openai::{ModelSettings, OpenAiClient};
pub use config::{cli::LocalStorage, credentials::ApiCredentials, toml_config::TomlConfig};
pub use core::{
    aggregate::Aggregator, etl::EtlEngine, parser::parse_reply, pipeline::CardPipeline,
};
pub use domain::model::{AggregateTable, Record, Schema};
pub use utils::error::{EtlError, Result};
