use crate::adapters::image_source::{encode_image, select_images, ImagePattern};
use crate::core::aggregate::Aggregator;
use crate::core::export::render_table;
use crate::core::parser::parse_reply_detailed;
use crate::core::prompt::build_prompt;
use crate::core::{ConfigProvider, Pipeline, Storage, TransformResult, VisionModel};
use crate::domain::model::{Schema, VisionRequest};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::sync::Arc;

/// 顧客卡片批次處理：列出影像、逐張送模型辨識、解析回覆、彙整成表格並輸出
pub struct CardPipeline<S: Storage, M: VisionModel, C: ConfigProvider> {
    images: S,
    output: S,
    model: M,
    config: C,
    schema: Schema,
    pattern: ImagePattern,
    prompt: String,
    delimiter: u8,
    monitor: Option<Arc<SystemMonitor>>,
}

impl<S: Storage, M: VisionModel, C: ConfigProvider> CardPipeline<S, M, C> {
    /// `images` is the directory holding the card photos, `output` the export target.
    pub fn new(images: S, output: S, model: M, config: C) -> Result<Self> {
        let schema = Schema::from_fields_or_default(config.schema_fields())?;
        let pattern = ImagePattern::new(config.image_pattern())?;
        let delimiter = config.delimiter()?;
        let prompt = build_prompt(&schema, config.prompt_instruction());

        Ok(Self {
            images,
            output,
            model,
            config,
            schema,
            pattern,
            prompt,
            delimiter,
            monitor: None,
        })
    }

    pub fn with_monitor(mut self, monitor: Arc<SystemMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn monitor(&self) -> Option<&Arc<SystemMonitor>> {
        self.monitor.as_ref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

#[async_trait::async_trait]
impl<S: Storage, M: VisionModel, C: ConfigProvider> Pipeline for CardPipeline<S, M, C> {
    async fn extract(&self) -> Result<Vec<String>> {
        let listed = self.images.list_files().await?;
        let listed_count = listed.len();
        let images = select_images(listed, &self.pattern);

        tracing::info!(
            "🔍 Found {} card images matching '{}' ({} files listed)",
            images.len(),
            self.pattern.as_str(),
            listed_count
        );
        if images.is_empty() {
            tracing::warn!("📭 No images matched, output will contain only the header row");
        }

        Ok(images)
    }

    async fn transform(&self, images: Vec<String>) -> Result<TransformResult> {
        let total = images.len();
        let mut aggregator = Aggregator::new(self.schema.clone());

        for (index, name) in images.iter().enumerate() {
            tracing::info!("🖼️ [{}/{}] Reading {}", index + 1, total, name);

            let bytes = self.images.read_file(name).await?;
            let image = encode_image(name, &bytes, self.config.default_mime_type());

            // 任何一張失敗都中止整批，不輸出部分結果
            let reply = self
                .model
                .complete(VisionRequest {
                    prompt: &self.prompt,
                    image: &image,
                    max_tokens: self.config.max_tokens(),
                })
                .await
                .inspect_err(|e| tracing::error!("❌ Recognition failed for {}: {}", name, e))?;

            let outcome = parse_reply_detailed(&self.schema, &reply);
            tracing::debug!(
                "Parsed {}: {} matched, {} unknown, {} malformed",
                name,
                outcome.stats.matched,
                outcome.stats.unknown,
                outcome.stats.malformed
            );

            aggregator.append(outcome.record);

            if let Some(monitor) = &self.monitor {
                monitor.log_progress(index + 1, total);
            }
        }

        Ok(TransformResult {
            table: aggregator.finalize(),
            images,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_file = self.config.output_file();
        let data = render_table(&result.table, self.delimiter)?;

        tracing::debug!(
            "Writing {} rows ({} bytes) to {}",
            result.table.len(),
            data.len(),
            output_file
        );
        self.output.write_file(output_file, &data).await?;

        let output_path = format!(
            "{}/{}",
            self.config.output_path().trim_end_matches('/'),
            output_file
        );
        tracing::info!("💾 Saved {} card rows to {}", result.table.len(), output_path);
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;
    use async_trait::async_trait;
    use crate::core::etl::EtlEngine;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        listing: Vec<String>,
    }

    impl MockStorage {
        fn with_images(images: &[(&str, &str)]) -> Self {
            let files = images
                .iter()
                .map(|(name, data)| (name.to_string(), data.as_bytes().to_vec()))
                .collect();
            Self {
                files: Arc::new(Mutex::new(files)),
                listing: images.iter().map(|(name, _)| name.to_string()).collect(),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn list_files(&self) -> Result<Vec<String>> {
            Ok(self.listing.clone())
        }
    }

    /// Replies keyed by the image's base64 payload; records call order.
    struct MockModel {
        replies: HashMap<String, String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockModel {
        fn new(replies: &[(&str, &str)]) -> Self {
            use base64::Engine;
            let replies = replies
                .iter()
                .map(|(content, reply)| {
                    (
                        base64::engine::general_purpose::STANDARD.encode(content.as_bytes()),
                        reply.to_string(),
                    )
                })
                .collect();
            Self {
                replies,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl VisionModel for MockModel {
        async fn complete(&self, request: VisionRequest<'_>) -> Result<String> {
            self.calls.lock().await.push(request.image.name.clone());
            self.replies
                .get(&request.image.data)
                .cloned()
                .ok_or_else(|| EtlError::ModelError {
                    status: 500,
                    message: format!("no reply for {}", request.image.name),
                })
        }
    }

    struct MockConfig {
        fields: Vec<String>,
        delimiter: String,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                fields: vec!["NO".to_string(), "氏名".to_string(), "住所".to_string()],
                delimiter: ",".to_string(),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn image_pattern(&self) -> &str {
            "*.jpg"
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn output_file(&self) -> &str {
            "cards.csv"
        }

        fn delimiter(&self) -> Result<u8> {
            crate::utils::validation::parse_delimiter("delimiter", &self.delimiter)
        }

        fn max_tokens(&self) -> u32 {
            300
        }

        fn default_mime_type(&self) -> &str {
            "image/jpeg"
        }

        fn schema_fields(&self) -> &[String] {
            &self.fields
        }

        fn prompt_instruction(&self) -> Option<&str> {
            None
        }
    }

    #[tokio::test]
    async fn test_extract_filters_and_sorts() {
        let images = MockStorage::with_images(&[
            ("b.jpg", "b"),
            ("readme.txt", "x"),
            ("a.jpg", "a"),
        ]);
        let pipeline = CardPipeline::new(
            images,
            MockStorage::default(),
            MockModel::new(&[]),
            MockConfig::new(),
        )
        .unwrap();

        let result = pipeline.extract().await.unwrap();
        assert_eq!(result, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_transform_keeps_processing_order() {
        let images = MockStorage::with_images(&[("b.jpg", "card-b"), ("a.jpg", "card-a")]);
        let model = MockModel::new(&[
            ("card-a", "NO：1, 氏名：山田太郎, foo：bar"),
            ("card-b", "NO：2, 住所：大阪府, NO：3"),
        ]);
        let calls = model.calls.clone();
        let pipeline =
            CardPipeline::new(images, MockStorage::default(), model, MockConfig::new()).unwrap();

        let listed = pipeline.extract().await.unwrap();
        let result = pipeline.transform(listed).await.unwrap();

        assert_eq!(*calls.lock().await, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
        assert_eq!(result.images, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
        assert_eq!(result.table.len(), 2);

        let schema = pipeline.schema();
        assert_eq!(
            result.table.row(0).unwrap(),
            schema.record_from_pairs([("NO", "1"), ("氏名", "山田太郎")])
        );
        assert_eq!(
            result.table.row(1).unwrap(),
            schema.record_from_pairs([("NO", "3"), ("住所", "大阪府")])
        );
    }

    #[tokio::test]
    async fn test_model_failure_aborts_and_writes_nothing() {
        let images = MockStorage::with_images(&[("a.jpg", "card-a"), ("b.jpg", "card-b")]);
        let model = MockModel::new(&[("card-a", "NO：1")]);
        let output = MockStorage::default();
        let pipeline =
            CardPipeline::new(images, output.clone(), model, MockConfig::new()).unwrap();

        let listed = pipeline.extract().await.unwrap();
        let result = pipeline.transform(listed).await;

        assert!(matches!(result, Err(EtlError::ModelError { .. })));
        assert!(output.get_file("cards.csv").await.is_none());
    }

    #[tokio::test]
    async fn test_load_writes_csv() {
        let images = MockStorage::with_images(&[("a.jpg", "card-a")]);
        let model = MockModel::new(&[("card-a", "NO：1, 氏名：山田太郎, 住所：東京都港区")]);
        let output = MockStorage::default();
        let pipeline =
            CardPipeline::new(images, output.clone(), model, MockConfig::new()).unwrap();

        let listed = pipeline.extract().await.unwrap();
        let result = pipeline.transform(listed).await.unwrap();
        let path = pipeline.load(result).await.unwrap();

        assert_eq!(path, "test_output/cards.csv");
        let written = String::from_utf8(output.get_file("cards.csv").await.unwrap()).unwrap();
        assert_eq!(written, "NO,氏名,住所\n1,山田太郎,東京都港区\n");
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let mut config = MockConfig::new();
        config.fields.push("NO".to_string());

        let result = CardPipeline::new(
            MockStorage::default(),
            MockStorage::default(),
            MockModel::new(&[]),
            config,
        );
        assert!(matches!(
            result,
            Err(EtlError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_invalid_delimiter_is_rejected() {
        for bad in [";;", "\"", "、", ""] {
            let mut config = MockConfig::new();
            config.delimiter = bad.to_string();

            let result = CardPipeline::new(
                MockStorage::default(),
                MockStorage::default(),
                MockModel::new(&[]),
                config,
            );
            assert!(
                matches!(result, Err(EtlError::InvalidConfigValueError { .. })),
                "delimiter {:?} should be rejected",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_escaped_tab_delimiter_writes_tsv() {
        let images = MockStorage::with_images(&[("a.jpg", "card-a")]);
        let model = MockModel::new(&[("card-a", "NO：1, 氏名：山田太郎")]);
        let output = MockStorage::default();
        let mut config = MockConfig::new();
        config.delimiter = "\\t".to_string();
        let pipeline = CardPipeline::new(images, output.clone(), model, config).unwrap();

        let listed = pipeline.extract().await.unwrap();
        let result = pipeline.transform(listed).await.unwrap();
        pipeline.load(result).await.unwrap();

        let written = String::from_utf8(output.get_file("cards.csv").await.unwrap()).unwrap();
        assert_eq!(written, "NO\t氏名\t住所\n1\t山田太郎\t\n");
    }

    #[tokio::test]
    async fn test_engine_and_pipeline_share_one_monitor() {
        let images = MockStorage::with_images(&[("a.jpg", "card-a")]);
        let model = MockModel::new(&[("card-a", "NO：1")]);
        let monitor = Arc::new(SystemMonitor::new(true));
        let pipeline = CardPipeline::new(images, MockStorage::default(), model, MockConfig::new())
            .unwrap()
            .with_monitor(Arc::clone(&monitor));

        let engine = EtlEngine::with_monitor(pipeline, Arc::clone(&monitor));

        assert!(Arc::ptr_eq(engine.monitor(), &monitor));
        assert!(Arc::ptr_eq(engine.pipeline().monitor().unwrap(), &monitor));
        assert_eq!(Arc::strong_count(&monitor), 3);

        let path = engine.run().await.unwrap();
        assert_eq!(path, "test_output/cards.csv");
    }
}
