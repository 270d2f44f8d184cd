//! PaperSage Catalog — bibliographic metadata for search hits.
//!
//! `MetadataCatalog` is the remote source (arXiv via `ArxivClient`);
//! `MetadataFetcher` memoizes it by canonical identifier and never fails.

pub mod arxiv;
pub mod atom;
pub mod fetcher;
pub mod ids;
pub mod types;

pub use arxiv::ArxivClient;
pub use fetcher::{FetcherStats, MetadataFetcher};
pub use ids::{canonical_id, id_from_entry_url};
pub use types::{MetadataCatalog, PaperMetadata};
