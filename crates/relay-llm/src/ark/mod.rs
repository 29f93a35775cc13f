mod client;

pub use client::{ArkAdapter, ARK_DEFAULT_BASE_URL};
