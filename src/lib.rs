//! qldoc: documentation sites for Qilletni libraries.
//!
//! Each library is parsed from its `.ql` sources, rendered to HTML and
//! stored in a binary cache. Extension functions a library declares on
//! another library's entities are spliced into that library's cached
//! documentation in a second pass.

pub mod cache;
pub mod codec;
pub mod error;
pub mod generator;
pub mod library;
pub mod metadata;
pub mod model;
pub mod parser;
pub mod render;
pub mod resolve;
pub mod types;

pub use cache::CacheStore;
pub use error::{CacheError, CorruptCacheError};
pub use generator::{DocGenerator, RunReport, SpliceOutcome};
pub use library::LibraryDocs;
pub use metadata::LibraryMetadata;
pub use render::anchor::Links;
