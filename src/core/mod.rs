pub mod aggregate;
pub mod etl;
pub mod export;
pub mod parser;
pub mod pipeline;
pub mod prompt;

pub use crate::domain::model::{AggregateTable, Record, Schema, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, VisionModel};
pub use crate::utils::error::Result;
