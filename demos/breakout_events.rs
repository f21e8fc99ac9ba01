use arcade_bonk::*;
use glam::Vec2;

const BRICK_KEY: EntityKey = 1000;

fn main() -> Result<(), PhysicsError> {
    let _ = simple_logger::SimpleLogger::new().env().init();

    let mut world = PhysicsWorld::new(WorldConfig {
        bounds: Rect::new(0.0, 0.0, 320.0, 240.0),
        ..Default::default()
    })?;

    let ball = world.register_body(
        1,
        Body::circle(150.0, 150.0, 4.0)
            .with_velocity(Vec2::new(90.0, -160.0))
            .with_bounce(Vec2::ONE)
            .collide_world_bounds(),
    );
    let paddle = world.register_body(2, Body::new(130.0, 220.0, 60.0, 8.0).immovable());

    let mut bricks = Vec::new();
    for row in 0..4 {
        for col in 0..8 {
            let key = BRICK_KEY + row * 8 + col;
            let brick = Body::new(16.0 + col as f32 * 36.0, 20.0 + row as f32 * 14.0, 32.0, 10.0)
                .immovable()
                .with_bounce(Vec2::ONE);
            bricks.push(world.register_body(key, brick));
        }
    }
    println!("Inserted ball={:?} paddle={:?} bricks={}", ball, paddle, bricks.len());

    for frame in 0..1200 {
        world.tick(1.0 / 60.0);
        world.collide(&[ball], &[paddle])?;

        // Bricks in the bottom row only break when hit from below.
        let hits = world.collide_with(&[ball], &bricks, |ball, brick| {
            brick.entity() < BRICK_KEY + 24 || ball.velocity.y < 0.0
        })?;
        for (_, brick) in hits {
            let removed = world.unregister_body(brick)?;
            bricks.retain(|h| *h != brick);
            let b = world.body(ball)?;
            println!(
                "frame {}: brick {} destroyed, ball at ({:.1},{:.1}) v=({:.1},{:.1}) touching={:?}",
                frame,
                removed.entity(),
                b.position.x,
                b.position.y,
                b.velocity.x,
                b.velocity.y,
                b.touching()
            );
        }

        if world.body(ball)?.blocked().contains(Side::Down) {
            println!("frame {}: ball hit the floor", frame);
        }
        if bricks.is_empty() {
            println!("frame {}: cleared", frame);
            break;
        }
    }
    println!("{} bricks left", bricks.len());
    Ok(())
}
