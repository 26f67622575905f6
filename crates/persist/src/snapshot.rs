use serde::{Deserialize, Serialize};
use tilescape_kernel::World;

/// A saved world together with the state hash it had when captured.
///
/// The hash is recomputed after decoding; a snapshot whose content no
/// longer matches it is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub state_hash: u64,
    pub world: World,
}

impl Snapshot {
    /// Clone `world` and record its current state hash.
    pub fn capture(world: &World) -> Self {
        Self {
            state_hash: world.state_hash(),
            world: world.clone(),
        }
    }

    /// Whether the world still hashes to the captured value.
    pub fn verify(&self) -> bool {
        self.world.state_hash() == self.state_hash
    }

    /// Take the world out of the snapshot. Callers drop any cached rendering
    /// of the previous world.
    pub fn restore(self) -> World {
        self.world
    }
}
