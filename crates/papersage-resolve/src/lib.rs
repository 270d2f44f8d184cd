//! Search orchestration over the embedder, vector index and metadata fetcher.
//!
//! `PaperSearch` runs a query in one retrieval mode, compares all modes, or
//! escalates through modes until enough results clear the "good" threshold.

pub mod demo;
pub mod engine;
pub mod modes;
pub mod select;
pub mod types;

pub use engine::{EngineStats, PaperSearch};
pub use modes::SearchMode;
pub use select::{select_best_mode, select_smart_mode};
pub use types::*;
