pub mod document;
pub mod embed;
pub mod engine;
pub mod index;
pub mod keywords;
pub mod rerank;

pub use embed::Embedder;
pub use engine::{SearchConfig, SearchEngine, SearchHit, SearchRequest};
pub use index::{MemoryVectorIndex, VectorHit, VectorIndex, VectorMetadata};
