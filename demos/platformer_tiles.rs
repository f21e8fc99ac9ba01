use arcade_bonk::*;
use glam::Vec2;

const LEVEL: &[&str] = &[
    "####################",
    "#..................#",
    "#..................#",
    "#.........####.....#",
    "#..................#",
    "#....###...........#",
    "#..................#",
    "####################",
];

fn main() -> Result<(), PhysicsError> {
    let _ = simple_logger::SimpleLogger::new().env().init();

    let tiles = TileLayer::from_rows(Vec2::ZERO, Vec2::splat(16.0), LEVEL)?;
    let mut world = PhysicsWorld::new(WorldConfig {
        bounds: tiles.bounds(),
        gravity: Vec2::new(0.0, 600.0),
        ..Default::default()
    })?;

    let player = world.register_body(
        1,
        Body::new(24.0, 40.0, 12.0, 14.0)
            .with_drag(Vec2::new(400.0, 0.0))
            .with_max_velocity(Vec2::new(120.0, 500.0)),
    );
    let crate_body = world.register_body(2, Body::new(200.0, 40.0, 14.0, 14.0).with_mass(2.0));
    let actors = [player, crate_body];

    for frame in 0..360 {
        // Run right, jump whenever grounded.
        {
            let p = world.body_mut(player)?;
            p.acceleration.x = 300.0;
            if p.on_floor() && frame % 45 == 0 {
                p.velocity.y = -260.0;
            }
        }

        world.tick(1.0 / 60.0);
        world.collide_tiles(&actors, &tiles)?;
        let pushed = world.collide(&[player], &[crate_body])?;
        world.collide_tiles(&[crate_body], &tiles)?;

        if frame % 30 == 0 || !pushed.is_empty() {
            let p = world.body(player)?;
            let c = world.body(crate_body)?;
            println!(
                "frame {:3}: player ({:6.1},{:6.1}) v=({:6.1},{:6.1}) floor={} wall={} | crate ({:6.1},{:6.1}){}",
                frame,
                p.position.x,
                p.position.y,
                p.velocity.x,
                p.velocity.y,
                p.on_floor(),
                p.on_wall(),
                c.position.x,
                c.position.y,
                if pushed.is_empty() { "" } else { " pushed" }
            );
        }
    }
    Ok(())
}
