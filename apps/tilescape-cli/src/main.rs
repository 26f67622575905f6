use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use glam::UVec2;
use std::path::{Path, PathBuf};
use tilescape_assets::{Atlas, Tileset};
use tilescape_common::CellCoord;
use tilescape_input::{Command, KeyMap, Session, SessionConfig, parse_keys};
use tilescape_kernel::World;
use tilescape_persist::{StoreError, WorldPersistence, WorldStore};
use tilescape_tools::WorldInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tilescape", about = "Chunked tile world generator and viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the saved world
    #[arg(long, default_value = "world_data")]
    data_dir: PathBuf,

    /// JSON session config (world, view and player settings)
    #[arg(long)]
    config: Option<PathBuf>,

    /// PNG sprite sheet; the built-in palette is used if omitted
    #[arg(long)]
    tiles: Option<PathBuf>,

    /// Unscaled tile edge in pixels
    #[arg(long)]
    tile_size: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new world with the player at its center and save it
    New(NewArgs),
    /// Print a summary of the saved world
    Info {
        /// Also list every entity
        #[arg(long)]
        entities: bool,
    },
    /// Render one viewport to a PNG
    Render(RenderArgs),
    /// Drive the player with a key script, then save
    Play(PlayArgs),
}

#[derive(Args)]
struct NewArgs {
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    layers: Option<u32>,
    /// Cells per chunk edge
    #[arg(long)]
    chunk_side: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    /// Overwrite an existing saved world
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct RenderArgs {
    /// Output PNG path
    #[arg(short, long, default_value = "view.png")]
    out: PathBuf,
    /// Zoom level; the configured initial zoom if omitted
    #[arg(short, long)]
    zoom: Option<u32>,
    /// Focal cell as x,y,z; the player (or world center) if omitted
    #[arg(long, value_parser = parse_cell)]
    at: Option<CellCoord>,
    /// Output size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_bounds)]
    bounds: Option<UVec2>,
    /// Draw chunk and cell grid lines
    #[arg(long)]
    overlay: bool,
}

#[derive(Args)]
struct PlayArgs {
    /// Keys separated by spaces or commas, e.g. "d d s = f3"
    #[arg(short, long)]
    keys: String,
    /// Write a PNG for every frame that changed the view
    #[arg(long)]
    frames_dir: Option<PathBuf>,
    /// Final frame output
    #[arg(short, long, default_value = "view.png")]
    out: PathBuf,
    /// Do not save the world when the script ends
    #[arg(long)]
    no_save: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(edge) = cli.tile_size {
        config.view.tile_size = UVec2::splat(edge);
    }

    match cli.command {
        Commands::New(args) => {
            let world_cfg = &mut config.world;
            world_cfg.width_chunks = args.width.unwrap_or(world_cfg.width_chunks);
            world_cfg.height_chunks = args.height.unwrap_or(world_cfg.height_chunks);
            world_cfg.depth_layers = args.layers.unwrap_or(world_cfg.depth_layers);
            world_cfg.chunk_side = args.chunk_side.unwrap_or(world_cfg.chunk_side);
            world_cfg.seed = args.seed.unwrap_or(world_cfg.seed);

            let store = WorldStore::open(&cli.data_dir)?;
            if store.exists() && !args.force {
                anyhow::bail!(
                    "{} already holds a world; pass --force to replace it",
                    cli.data_dir.display()
                );
            }
            let atlas = load_atlas(cli.tiles.as_deref(), &config)?;
            let mut session = Session::new(&config, atlas, Box::new(store))?;
            session.handle(Command::Save)?;
            println!("{}", WorldInspector::summary(session.scene().world()));
            println!("saved to {}", cli.data_dir.display());
        }
        Commands::Info { entities } => {
            let store = WorldStore::open(&cli.data_dir)?;
            let world = store.load().with_context(|| {
                format!("loading world from {}", cli.data_dir.display())
            })?;
            let meta = store.meta()?;
            println!("tilescape v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "store: schema v{} saves={} sha256={}",
                meta.schema_version, meta.save_count, meta.sha256
            );
            println!("{}", WorldInspector::summary(&world));
            for (tile, count) in WorldInspector::terrain_histogram(&world) {
                println!("  terrain {}: {count} cells", tile.0);
            }
            if entities {
                for id in WorldInspector::list_entities(&world) {
                    if let Some(info) = WorldInspector::inspect_entity(&world, id) {
                        println!("  {info}");
                    }
                }
            }
        }
        Commands::Render(args) => {
            if let Some(bounds) = args.bounds {
                config.view.bounds = bounds;
            }
            if let Some(zoom) = args.zoom {
                anyhow::ensure!(
                    config.view.zoom_levels.contains(&zoom),
                    "zoom {zoom} is not one of {:?}",
                    config.view.zoom_levels
                );
                config.view.initial_zoom = zoom;
            }
            let store = WorldStore::open(&cli.data_dir)?;
            let world = load_or_generate(&store, &config)?;
            let atlas = load_atlas(cli.tiles.as_deref(), &config)?;
            let mut session = Session::with_world(world, &config, atlas, Box::new(store))?;
            if args.overlay {
                session.scene_mut().toggle_overlay();
            }
            let focal = args.at.unwrap_or_else(|| session.focal());
            let frame = session.scene_mut().render(focal);
            frame.surface.save_png(&args.out)?;
            println!("{}", WorldInspector::pass_report(&frame.stats));
            println!("wrote {}", args.out.display());
        }
        Commands::Play(args) => {
            let keys = parse_keys(&args.keys)?;
            let keymap = KeyMap::default();
            let store = WorldStore::open(&cli.data_dir)?;
            let world = load_or_generate(&store, &config)?;
            let atlas = load_atlas(cli.tiles.as_deref(), &config)?;
            let mut session = Session::with_world(world, &config, atlas, Box::new(store))?;
            if let Some(dir) = &args.frames_dir {
                std::fs::create_dir_all(dir)?;
            }

            let mut frames = 0usize;
            for key in keys {
                let Some(command) = keymap.command(key) else {
                    tracing::warn!(%key, "unbound key");
                    continue;
                };
                if !session.handle(command)? {
                    continue;
                }
                if let Some(dir) = &args.frames_dir {
                    let frame = session.render();
                    let path = dir.join(format!("frame_{frames:04}.png"));
                    frame.surface.save_png(&path)?;
                    tracing::debug!(path = %path.display(), "frame written");
                    frames += 1;
                }
            }

            let frame = session.render();
            frame.surface.save_png(&args.out)?;
            println!("{}", WorldInspector::pass_report(&frame.stats));
            println!("{}", WorldInspector::cache_summary(session.scene().cache()));
            println!("player at {}", session.focal());
            if !args.no_save {
                session.handle(Command::Save)?;
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening config {}", path.display()))?;
    let config = serde_json::from_reader(file)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

fn load_atlas(tiles: Option<&Path>, config: &SessionConfig) -> anyhow::Result<Atlas> {
    let tile_size = config.view.tile_size;
    let base = match tiles {
        Some(path) => Tileset::load(path, tile_size)?,
        None => Tileset::builtin(tile_size)?,
    };
    Ok(Atlas::prescale(&base, &config.view.zoom_levels))
}

/// Load the saved world; only a missing world falls back to generation.
/// Corrupt or incompatible saves are reported, never overwritten.
fn load_or_generate(store: &WorldStore, config: &SessionConfig) -> anyhow::Result<World> {
    match store.load() {
        Ok(world) => Ok(world),
        Err(StoreError::NotFound(path)) => {
            tracing::warn!(path = %path.display(), "no saved world, generating one");
            Ok(World::generate(&config.world)?)
        }
        Err(e) => {
            Err(e).with_context(|| format!("loading world from {}", store.root().display()))
        }
    }
}

fn parse_cell(s: &str) -> Result<CellCoord, String> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y] => Ok(CellCoord::new(*x, *y, 0)),
        [x, y, z] => Ok(CellCoord::new(*x, *y, *z)),
        _ => Err(format!("expected x,y or x,y,z, got {s:?}")),
    }
}

fn parse_bounds(s: &str) -> Result<UVec2, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("width {w:?}: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("height {h:?}: {e}"))?;
    if w == 0 || h == 0 {
        return Err("bounds must be positive".into());
    }
    Ok(UVec2::new(w, h))
}
