//! PaperSage Store — vector collections with cosine search.
//!
//! `VectorIndex` is the contract the search layer relies on. `MemoryIndex`
//! keeps collections in process; `SqliteIndex` persists points and searches a
//! matrix loaded from disk. Both score through `Collection`, which supports
//! exact float search and int8 candidate generation with optional rescoring.

pub mod collection;
pub mod embedding;
pub mod index;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use collection::Collection;
pub use index::VectorIndex;
pub use memory::MemoryIndex;
pub use sqlite::SqliteIndex;
pub use types::*;
