mod file_cache;
mod model_client;

pub use file_cache::FileCache;
pub use model_client::{GeminiClient, ModelClient, ModelError};
