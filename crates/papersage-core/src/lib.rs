//! PaperSage Core — error taxonomy, configuration, compute resources, memo cache.

pub mod cache;
pub mod capabilities;
pub mod config;
pub mod error;

pub use cache::MemoCache;
pub use capabilities::ComputeResources;
pub use config::{CachePolicy, CatalogConfig, IndexBackend, ModelConfig, PaperSageConfig};
pub use error::{Error, Result};
