use arcade_bonk::*;
use glam::Vec2;
use std::time::Instant;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f32 {
    lcg(seed) as f32 / u32::MAX as f32
}

fn main() -> Result<(), PhysicsError> {
    let _ = simple_logger::SimpleLogger::new().env().init();

    let mut world = PhysicsWorld::new(WorldConfig {
        bounds: Rect::new(0.0, 0.0, 4000.0, 4000.0),
        quadtree: QuadTreeConfig { max_objects: 10, max_depth: 6, ..Default::default() },
        enable_timing: true,
        ..Default::default()
    })?;

    let n = 20_000u64; // number of bodies
    let mut seed = 1u32;
    let mut handles = Vec::with_capacity(n as usize);
    for i in 0..n {
        let x = unit(&mut seed) * 3990.0;
        let y = unit(&mut seed) * 3990.0;
        let v = Vec2::new(unit(&mut seed) * 120.0 - 60.0, unit(&mut seed) * 120.0 - 60.0);
        let body = if i % 2 == 0 { Body::new(x, y, 8.0, 8.0) } else { Body::circle(x, y, 4.0) };
        handles.push(world.register_body(i, body.with_velocity(v).with_bounce(Vec2::ONE).collide_world_bounds()));
    }

    for frame in 0..10 {
        let t0 = Instant::now();
        let tick = world.tick(1.0 / 60.0);
        let pairs = world.collide(&handles, &handles)?;
        let total = t0.elapsed();
        let s = world.stats();
        match world.timing() {
            Some(t) => println!(
                "frame={} N={} integrated={} tick={:.3}ms (integrate={:.3}ms rebuild={:.3}ms) \
                 query={:.3}ms narrow={:.3}ms nodes={} depth={} candidates={} unique={} pairs={}",
                frame,
                n,
                tick.integrated,
                t.tick_ms,
                t.tick_integrate_ms,
                t.tick_rebuild_ms,
                t.query_ms,
                t.query_narrowphase_ms,
                s.tree_nodes,
                s.tree_depth,
                s.candidate_pairs,
                s.unique_pairs,
                pairs.len()
            ),
            None => println!("frame={} N={} total={:?} pairs={}", frame, n, total, pairs.len()),
        }
    }
    Ok(())
}
