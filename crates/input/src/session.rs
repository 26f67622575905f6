use serde::{Deserialize, Serialize};
use tilescape_assets::Atlas;
use tilescape_common::{CellCoord, EntityId, TileId};
use tilescape_kernel::{PlacementError, World, WorldConfig, WorldError};
use tilescape_persist::{StoreError, WorldPersistence};
use tilescape_render::{Frame, Scene, ViewConfig};

use crate::command::Command;

/// Everything needed to start a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub world: WorldConfig,
    pub view: ViewConfig,
    pub player_name: String,
    pub player_tile: TileId,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            view: ViewConfig::default(),
            player_name: "Player Entity".to_string(),
            player_tile: TileId(3),
        }
    }
}

/// Errors that end a command instead of merely refusing it.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("player could not be placed: {0}")]
    Placement(#[from] PlacementError),
}

/// A running view of one world: the scene, the player entity the view
/// follows, and where saves go.
pub struct Session {
    scene: Scene,
    player: EntityId,
    player_name: String,
    player_tile: TileId,
    store: Box<dyn WorldPersistence>,
}

impl Session {
    /// Start on a freshly generated world.
    pub fn new(
        config: &SessionConfig,
        atlas: Atlas,
        store: Box<dyn WorldPersistence>,
    ) -> Result<Self, SessionError> {
        let world = World::generate(&config.world)?;
        Self::with_world(world, config, atlas, store)
    }

    /// Start on an existing world. The player is found by name, or spawned
    /// at the world center if the world has none.
    pub fn with_world(
        mut world: World,
        config: &SessionConfig,
        atlas: Atlas,
        store: Box<dyn WorldPersistence>,
    ) -> Result<Self, SessionError> {
        let player = adopt_player(&mut world, &config.player_name, config.player_tile)?;
        Ok(Self {
            scene: Scene::new(world, atlas, &config.view),
            player,
            player_name: config.player_name.clone(),
            player_tile: config.player_tile,
            store,
        })
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    /// The cell the view is centered on: the player, or the world center if
    /// the player has no position.
    pub fn focal(&self) -> CellCoord {
        let world = self.scene.world();
        world
            .entity(self.player)
            .and_then(|e| e.position())
            .unwrap_or_else(|| world.center())
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Apply one command. Returns whether the view changed and needs a
    /// redraw. Blocked moves and zooming past either end are not errors.
    pub fn handle(&mut self, command: Command) -> Result<bool, SessionError> {
        tracing::debug!(?command, "handle");
        let applied = match command {
            Command::Move(dir) => {
                match self.scene.world_mut().move_entity(self.player, dir.delta()) {
                    Ok(_) => true,
                    Err(
                        PlacementError::OutOfBounds(_)
                        | PlacementError::Impassable(_)
                        | PlacementError::Unchanged(_),
                    ) => false,
                    Err(e) => return Err(e.into()),
                }
            }
            Command::ZoomIn => self.scene.zoom_in(),
            Command::ZoomOut => self.scene.zoom_out(),
            Command::ToggleOverlay => {
                self.scene.toggle_overlay();
                true
            }
            Command::Save => {
                self.store.save(self.scene.world())?;
                true
            }
            Command::Load => {
                let mut world = self.store.load()?;
                let player = adopt_player(&mut world, &self.player_name, self.player_tile)?;
                self.scene.replace_world(world);
                self.player = player;
                true
            }
        };
        Ok(applied && command.requires_render())
    }

    /// Render the view centered on [`Session::focal`].
    pub fn render(&mut self) -> Frame {
        let focal = self.focal();
        self.scene.render(focal)
    }
}

fn adopt_player(world: &mut World, name: &str, tile: TileId) -> Result<EntityId, SessionError> {
    let id = match world.entity_id(name) {
        Some(id) => id,
        None => world.spawn_entity(name, tile)?,
    };
    let placed = world.entity(id).and_then(|e| e.position()).is_some();
    if !placed {
        let at = world.center();
        world.place_entity(id, at)?;
        tracing::info!(player = name, %at, "player placed");
    }
    Ok(id)
}
