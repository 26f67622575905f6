use crate::snapshot::Snapshot;
use crate::store::{cbor_deserialize, cbor_serialize};
use crate::{StoreError, WorldPersistence};
use tilescape_kernel::World;

/// In-memory persistence. Worlds go through the same CBOR encoding as the
/// file store, so a load never aliases the saved world.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Option<Vec<u8>>,
    saves: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saves so far.
    pub fn saves(&self) -> u32 {
        self.saves
    }
}

impl WorldPersistence for MemoryStore {
    fn save(&mut self, world: &World) -> Result<(), StoreError> {
        self.saved = Some(cbor_serialize(&Snapshot::capture(world))?);
        self.saves += 1;
        tracing::debug!(saves = self.saves, "world saved in memory");
        Ok(())
    }

    fn load(&self) -> Result<World, StoreError> {
        let bytes = self
            .saved
            .as_deref()
            .ok_or_else(|| StoreError::NotFound("memory".into()))?;
        let snap: Snapshot = cbor_deserialize(bytes)?;
        snap.world.check_consistency()?;
        if !snap.verify() {
            return Err(StoreError::IntegrityMismatch {
                expected: format!("{:016x}", snap.state_hash),
                actual: format!("{:016x}", snap.world.state_hash()),
            });
        }
        Ok(snap.restore())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescape_common::{CellCoord, TileId};
    use tilescape_kernel::WorldConfig;

    #[test]
    fn empty_store_has_nothing_to_load() {
        assert!(matches!(
            MemoryStore::new().load(),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn load_returns_the_saved_state() {
        let mut store = MemoryStore::new();
        let mut world = World::generate(&WorldConfig::default()).unwrap();
        store.save(&world).unwrap();
        let saved_hash = world.state_hash();

        world.set_terrain(CellCoord::new(1, 1, 0), TileId(4), false);
        let loaded = store.load().unwrap();
        assert_eq!(loaded.state_hash(), saved_hash);
        assert_ne!(loaded.state_hash(), world.state_hash());
        assert_eq!(store.saves(), 1);
    }
}
