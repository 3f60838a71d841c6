use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::sync::Arc;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: Arc<SystemMonitor>,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self::with_monitor(pipeline, Arc::new(SystemMonitor::new(monitor_enabled)))
    }

    /// 與 pipeline 共用同一個監控器，峰值記憶體只統計一次
    pub fn with_monitor(pipeline: P, monitor: Arc<SystemMonitor>) -> Self {
        Self { pipeline, monitor }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn monitor(&self) -> &Arc<SystemMonitor> {
        &self.monitor
    }

    /// 先辨識完所有影像才寫出，途中任何錯誤都不會留下輸出檔
    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting card extraction");
        self.monitor.log_stats("Start");

        // Extract
        let images = self.pipeline.extract().await?;
        tracing::info!("Discovered {} images", images.len());
        self.monitor.log_stats("Extract");

        // Transform
        let result = self.pipeline.transform(images).await?;
        tracing::info!("Recognized {} cards", result.table.len());
        self.monitor.log_stats("Transform");

        // Load
        let output_path = self.pipeline.load(result).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
