//! Persistence: saving and restoring whole tile worlds.
//!
//! # Invariants
//! - A load either returns exactly the saved world or fails; corrupted
//!   payloads and unknown schema versions are never partially applied.
//! - Decoded worlds are structurally checked before their state hash is
//!   recomputed, so a well-hashed but malformed save is an error, not a panic.
//! - Writes replace files atomically.

mod memory;
mod snapshot;
mod store;

use std::path::PathBuf;
use tilescape_kernel::{World, WorldError};

pub use memory::MemoryStore;
pub use snapshot::Snapshot;
pub use store::{WORLD_SCHEMA_VERSION, WorldMeta, WorldStore};

/// Errors from persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("no saved world at {}", .0.display())]
    NotFound(PathBuf),
    #[error("decoded world is unusable: {0}")]
    Malformed(#[from] WorldError),
}

/// A place a world can be saved to and loaded from.
pub trait WorldPersistence {
    /// Persist `world`, replacing any earlier save.
    fn save(&mut self, world: &World) -> Result<(), StoreError>;
    /// Return the last saved world, checked for integrity and structure.
    fn load(&self) -> Result<World, StoreError>;
}
