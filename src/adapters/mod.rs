// Adapters layer: concrete implementations of the external boundaries (model API, image files).

pub mod image_source;
pub mod openai;
