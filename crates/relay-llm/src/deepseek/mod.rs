mod client;

pub use client::{normalize_model_name, DeepSeekAdapter, DEEPSEEK_DEFAULT_BASE_URL, DEEPSEEK_DEFAULT_MODEL};
