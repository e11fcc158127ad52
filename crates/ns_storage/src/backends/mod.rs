pub mod memory;
pub mod pinecone;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use memory::InMemoryIndex;
pub use pinecone::PineconeIndex;
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantIndex;
