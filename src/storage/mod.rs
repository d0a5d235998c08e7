//! Durable storage for engine state
//!
//! Three independent blobs live behind the [`BlobStore`] seam: encrypted key
//! material, bounded audit history, and compliance records. Callers inject a
//! store per engine; the file implementation guarantees atomic replace.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use traits::{blob_names, BlobStore};
