//! Developer Tooling: world and cache inspector.
//!
//! # Invariants
//! - Inspection never mutates the world or the cache.

mod inspector;

pub use inspector::{CacheSummary, EntityInfo, WorldInspector, WorldSummary};
