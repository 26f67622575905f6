use std::hint::black_box;
use std::time::Instant;

use glam::IVec3;
use tilescape_assets::Tileset;
use tilescape_common::{CellCoord, TileId};
use tilescape_kernel::{World, WorldConfig};
use tilescape_render::{Scene, ViewConfig};

fn make_scene(width_chunks: u32, zoom: u32) -> (Scene, CellCoord) {
    let cfg = WorldConfig {
        width_chunks,
        height_chunks: width_chunks,
        ..WorldConfig::default()
    };
    let world = World::generate(&cfg).expect("valid world config");
    let view = ViewConfig {
        zoom_levels: vec![zoom],
        initial_zoom: zoom,
        ..ViewConfig::default()
    };
    let tiles = Tileset::builtin(view.tile_size).expect("default tile size");
    let center = world.center();
    (Scene::from_tileset(world, &tiles, &view), center)
}

fn bench_cold(zoom: u32, iterations: usize) {
    let (mut scene, focal) = make_scene(8, zoom);
    let start = Instant::now();
    for _ in 0..iterations {
        let world = scene.world().clone();
        scene.replace_world(world);
        black_box(scene.render(black_box(focal)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  cold viewport (zoom {zoom}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_warm(zoom: u32, iterations: usize) {
    let (mut scene, focal) = make_scene(8, zoom);
    scene.render(focal);
    let start = Instant::now();
    for _ in 0..iterations {
        black_box(scene.render(black_box(focal)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  warm viewport (zoom {zoom}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_walk(zoom: u32, steps: usize) {
    let (mut scene, focal) = make_scene(16, zoom);
    let id = scene.world_mut().spawn_entity("walker", TileId(3)).expect("fresh name");
    scene.world_mut().place_entity(id, focal).expect("center is passable");
    scene.render(focal);

    let start = Instant::now();
    for i in 0..steps {
        let dx = if (i / 32) % 2 == 0 { 1 } else { -1 };
        let _ = scene.world_mut().move_entity(id, IVec3::new(dx, 0, 0));
        let at = scene.world().entity(id).and_then(|e| e.position()).unwrap_or(focal);
        black_box(scene.render(black_box(at)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / steps as u32;
    println!("  walking entity (zoom {zoom}, {steps} steps): {per_iter:?}/step, total {elapsed:?}");
}

fn main() {
    println!("=== Viewport Benchmarks ===\n");
    println!("Default bounds {:?}\n", ViewConfig::default().bounds);

    println!("Cold pass (every chunk rendered):");
    bench_cold(1, 20);
    bench_cold(2, 10);
    bench_cold(4, 5);

    println!("\nWarm pass (every chunk cached):");
    bench_warm(1, 200);
    bench_warm(2, 100);
    bench_warm(4, 50);

    println!("\nWalking entity (one or two chunks dirty per pass):");
    bench_walk(2, 200);

    println!("\n=== Done ===");
}
