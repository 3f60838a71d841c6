use card_etl::utils::error::{EtlError, ErrorSeverity};
use card_etl::utils::monitor::SystemMonitor;
use card_etl::utils::{logger, validation::Validate};
use card_etl::{ApiCredentials, CardPipeline, CliConfig, EtlEngine, LocalStorage, OpenAiClient};
use clap::Parser;
use std::sync::Arc;

fn exit_code(e: &EtlError) -> i32 {
    match e.severity() {
        ErrorSeverity::High => 1,     // 辨識或檔案錯誤
        ErrorSeverity::Medium => 2,   // 資料處理錯誤
        ErrorSeverity::Critical => 3, // 設定錯誤
    }
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
    std::process::exit(exit_code(&e));
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, config.log_json);

    tracing::info!("Starting card-etl");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        fail("Configuration validation failed", e);
    }

    // 金鑰只在啟動時讀取一次，缺少就不處理任何影像
    let credentials = match ApiCredentials::from_env(&config.api_key_env) {
        Ok(credentials) => credentials,
        Err(e) => fail("Missing API credentials", e),
    };

    let model = match OpenAiClient::new(config.model_settings(), credentials) {
        Ok(model) => model,
        Err(e) => fail("Failed to build model client", e),
    };

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let images = LocalStorage::new(config.image_dir.clone());
    let output = LocalStorage::new(config.output_path.clone());
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
