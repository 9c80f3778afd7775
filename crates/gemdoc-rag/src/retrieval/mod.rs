//! Vector index and query-time retrieval

pub mod index;
pub mod retriever;

pub use index::{IndexEntry, VectorIndex};
pub use retriever::Retriever;
