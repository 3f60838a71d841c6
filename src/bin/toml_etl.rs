use card_etl::adapters::image_source::{select_images, ImagePattern};
use card_etl::core::{ConfigProvider, Storage};
use card_etl::utils::error::{EtlError, ErrorSeverity};
use card_etl::utils::monitor::SystemMonitor;
use card_etl::utils::{logger, validation::Validate};
use card_etl::{
    ApiCredentials, CardPipeline, EtlEngine, LocalStorage, OpenAiClient, Schema, TomlConfig,
};
use clap::Parser;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Customer card extraction driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "card-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Dry run - list the images that would be sent to the model
    #[arg(long)]
    dry_run: bool,
}

fn fail(context: &str, e: EtlError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // 初始化日誌
    logger::init_logger(args.verbose, args.log_json);

    tracing::info!("🚀 Starting TOML-based card extraction");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(3);
        }
    };

    if let Err(e) = config.validate() {
        fail("Configuration validation failed", e);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No model requests will be made");
        if let Err(e) = perform_dry_run(&config).await {
            fail("Dry run failed", e);
        }
        return;
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let credentials = match ApiCredentials::from_env(config.api_key_env()) {
        Ok(credentials) => credentials,
        Err(e) => fail("Missing API credentials", e),
    };

    let model = match OpenAiClient::new(config.model_settings(), credentials) {
        Ok(model) => model,
        Err(e) => fail("Failed to build model client", e),
    };

    let images = LocalStorage::new(config.image_dir().to_string());
    let output = LocalStorage::new(config.output_path().to_string());
    let monitor = Arc::new(SystemMonitor::new(monitor_enabled));
    let pipeline = match CardPipeline::new(images, output, model, config) {
        Ok(pipeline) => pipeline.with_monitor(Arc::clone(&monitor)),
        Err(e) => fail("Failed to build pipeline", e),
    };

    let engine = EtlEngine::with_monitor(pipeline, monitor);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Card extraction completed successfully!");
            println!("✅ Card extraction completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => fail("Card extraction failed", e),
    }
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Configuration Summary:");
    tracing::info!("  Pipeline: {}", config.pipeline.name);
    if let Some(description) = &config.pipeline.description {
        tracing::info!("  Description: {}", description);
    }
    tracing::info!(
        "  Images: {}/{}",
        config.image_dir(),
        config.image_pattern()
    );
    tracing::info!(
        "  Model: {} (max_tokens = {})",
        config.model.name,
        config.max_tokens()
    );
    tracing::info!(
        "  Fields: {}",
        if config.schema_fields().is_empty() {
            "default customer card".to_string()
        } else {
            config.schema_fields().join(", ")
        }
    );
    tracing::info!(
        "  Output: {}/{}",
        config.output_path(),
        config.output_file()
    );
}

async fn perform_dry_run(config: &TomlConfig) -> card_etl::Result<()> {
    let schema = Schema::from_fields_or_default(config.schema_fields())?;
    let pattern = ImagePattern::new(config.image_pattern())?;
    let storage = LocalStorage::new(config.image_dir().to_string());
    let images = select_images(storage.list_files().await?, &pattern);

    println!("🔍 Dry run for pipeline '{}'", config.pipeline.name);
    println!("  Columns ({}): {}", schema.len(), schema.fields().join(", "));
    println!("  {} image(s) would be processed in this order:", images.len());
    for (index, name) in images.iter().enumerate() {
        println!("    {:>3}. {}", index + 1, name);
    }
    println!(
        "  Output would be written to {}/{}",
        config.output_path(),
        config.output_file()
    );

    Ok(())
}
