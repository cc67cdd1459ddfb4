pub mod blocks;
pub mod chunk;
pub mod generator;
mod noise;
mod prng;

pub use chunk::{Chunk, ChunkError, CHUNK_BYTES, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};
pub use generator::{generate_chunk, generate_many};
pub use prng::ChunkRng;
pub use strata17_types::{ChunkPos, Dimension};
