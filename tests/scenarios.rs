use arcade_bonk::*;
use glam::Vec2;
use std::collections::BTreeSet;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f32 {
    lcg(seed) as f32 / u32::MAX as f32
}

fn scatter(world: &mut PhysicsWorld, n: u64, seed: u32) -> Vec<BodyHandle> {
    let mut seed = seed;
    (0..n)
        .map(|i| {
            let x = unit(&mut seed) * 380.0;
            let y = unit(&mut seed) * 380.0;
            let v = Vec2::new(unit(&mut seed) * 80.0 - 40.0, unit(&mut seed) * 80.0 - 40.0);
            let body = if i % 3 == 0 { Body::circle(x, y, 6.0) } else { Body::new(x, y, 12.0, 9.0) };
            world.register_body(i, body.with_velocity(v).with_bounce(Vec2::splat(0.5)).collide_world_bounds())
        })
        .collect()
}

fn cfg(straddle: StraddlePolicy) -> WorldConfig {
    WorldConfig {
        bounds: Rect::new(0.0, 0.0, 400.0, 400.0),
        gravity: Vec2::new(0.0, 30.0),
        quadtree: QuadTreeConfig { max_objects: 4, max_depth: 5, straddle },
        ..Default::default()
    }
}

#[test]
fn gravity_accumulates_over_ten_ticks() {
    let mut w = PhysicsWorld::new(WorldConfig { gravity: Vec2::new(0.0, 10.0), ..Default::default() }).unwrap();
    let h = w.register_body(1, Body::new(100.0, 100.0, 4.0, 4.0));
    for _ in 0..10 {
        w.tick(0.1);
    }
    let b = w.body(h).unwrap();
    assert!((b.velocity.y - 10.0).abs() < 1e-4);
    assert!(b.position.y > 100.0);
}

#[test]
fn equal_bodies_split_penetration_and_bounce() {
    let mut w = PhysicsWorld::new(WorldConfig::default()).unwrap();
    let a = w.register_body(
        1,
        Body::new(0.0, 0.0, 10.0, 10.0).with_velocity(Vec2::new(5.0, 0.0)).with_bounce(Vec2::splat(0.5)),
    );
    let b = w.register_body(2, Body::new(12.0, 0.0, 10.0, 10.0).with_bounce(Vec2::splat(0.5)));
    w.tick(1.0);
    assert_eq!(w.collide(&[a], &[b]).unwrap(), vec![(a, b)]);
    assert_eq!(w.body(a).unwrap().position.x, 3.5);
    assert_eq!(w.body(b).unwrap().position.x, 13.5);
    assert_eq!(w.body(a).unwrap().velocity.x, -2.5);
    // Resolved pairs no longer overlap.
    assert!(w.overlap(&[a], &[b]).unwrap().is_empty());
}

#[test]
fn overlap_matches_brute_force() {
    for straddle in [StraddlePolicy::Duplicate, StraddlePolicy::KeepAtParent] {
        let mut w = PhysicsWorld::new(cfg(straddle)).unwrap();
        let hs = scatter(&mut w, 300, 7);
        w.tick(1.0 / 60.0);

        let got: BTreeSet<(u32, u32)> = w
            .overlap(&hs, &hs)
            .unwrap()
            .into_iter()
            .map(|(a, b)| (a.index.min(b.index), a.index.max(b.index)))
            .collect();

        let mut expected = BTreeSet::new();
        for (i, &ha) in hs.iter().enumerate() {
            for &hb in &hs[i + 1..] {
                let sa = w.body(ha).unwrap().shape();
                let sb = w.body(hb).unwrap().shape();
                if Narrowphase::overlap_shapes(sa, sb).is_some() {
                    expected.insert((ha.index, hb.index));
                }
            }
        }
        assert_eq!(got, expected, "{:?}", straddle);
        assert_eq!(w.stats().reported_pairs, expected.len());
    }
}

#[test]
fn simulation_is_deterministic() {
    let run = || {
        let mut w = PhysicsWorld::new(cfg(StraddlePolicy::Duplicate)).unwrap();
        let hs = scatter(&mut w, 150, 42);
        let mut reported = Vec::new();
        for _ in 0..120 {
            w.tick(1.0 / 60.0);
            reported.extend(w.collide(&hs, &hs).unwrap());
        }
        let state: Vec<_> = w
            .bodies()
            .map(|(_, b)| (b.position.x.to_bits(), b.position.y.to_bits(), b.velocity.x.to_bits()))
            .collect();
        (reported, state)
    };
    assert_eq!(run(), run());
}

#[test]
fn group_versus_self_reports_each_pair_once() {
    let mut w = PhysicsWorld::new(cfg(StraddlePolicy::Duplicate)).unwrap();
    let hs = scatter(&mut w, 200, 3);
    w.tick(1.0 / 60.0);
    let pairs = w.collide(&hs, &hs).unwrap();
    let unique: BTreeSet<_> = pairs.iter().map(|(a, b)| (a.index.min(b.index), a.index.max(b.index))).collect();
    assert_eq!(unique.len(), pairs.len());
    assert!(pairs.iter().all(|(a, b)| a != b));
}

#[test]
fn immovable_wall_holds_a_crowd() {
    let mut w = PhysicsWorld::new(cfg(StraddlePolicy::Duplicate)).unwrap();
    let wall = w.register_body(999, Body::new(180.0, 0.0, 40.0, 400.0).immovable());
    let hs = scatter(&mut w, 100, 11);
    for _ in 0..60 {
        w.tick(1.0 / 60.0);
        w.collide(&hs, &hs).unwrap();
        w.collide(&hs, &[wall]).unwrap();
        assert_eq!(w.body(wall).unwrap().position, Vec2::new(180.0, 0.0));
        assert_eq!(w.body(wall).unwrap().velocity, Vec2::ZERO);
    }
}

#[test]
fn unknown_handle_leaves_world_untouched() {
    let mut w = PhysicsWorld::new(cfg(StraddlePolicy::Duplicate)).unwrap();
    let hs = scatter(&mut w, 20, 5);
    w.tick(1.0 / 60.0);
    let stale = hs[3];
    w.unregister_body(stale).unwrap();
    let live: Vec<_> = hs.iter().copied().filter(|h| *h != stale).collect();
    let before: Vec<_> = w.bodies().map(|(_, b)| b.position).collect();

    assert_eq!(w.collide(&live, &hs), Err(PhysicsError::UnknownBody(stale)));
    assert_eq!(w.collide(&hs, &live), Err(PhysicsError::UnknownBody(stale)));
    let after: Vec<_> = w.bodies().map(|(_, b)| b.position).collect();
    assert_eq!(before, after);
    assert_eq!(w.len(), 19);
}

#[test]
fn faulted_body_does_not_poison_neighbours() {
    let mut w = PhysicsWorld::new(cfg(StraddlePolicy::Duplicate)).unwrap();
    let hs = scatter(&mut w, 50, 9);
    w.body_mut(hs[10]).unwrap().acceleration = Vec2::new(f32::INFINITY, 0.0);
    let stats = w.tick(1.0 / 60.0);
    assert_eq!(stats.faulted, 1);
    assert_eq!(stats.integrated, 49);
    w.collide(&hs, &hs).unwrap();
    for (_, b) in w.bodies() {
        assert!(b.position.is_finite());
        assert!(b.velocity.is_finite());
    }
}

#[test]
fn runs_across_a_tile_floor_without_snagging() {
    let tiles = TileLayer::from_rows(
        Vec2::ZERO,
        Vec2::splat(16.0),
        &[
            "................", //
            "................", //
            "................", //
            "################", //
        ],
    )
    .unwrap();
    let mut w = PhysicsWorld::new(WorldConfig {
        bounds: tiles.bounds(),
        gravity: Vec2::new(0.0, 500.0),
        ..Default::default()
    })
    .unwrap();
    let h = w.register_body(1, Body::new(4.0, 30.0, 12.0, 12.0).with_velocity(Vec2::new(90.0, 0.0)));
    for _ in 0..150 {
        w.tick(1.0 / 60.0);
        w.collide_tiles(&[h], &tiles).unwrap();
        let b = w.body(h).unwrap();
        assert!(!b.blocked().contains(Side::Right), "snagged at x={}", b.position.x);
    }
    let b = w.body(h).unwrap();
    assert!(b.on_floor());
    assert!((b.aabb().bottom() - 48.0).abs() < 1e-3);
    assert!(b.position.x > 200.0);
}

#[test]
fn config_loads_from_json_with_defaults() {
    let cfg: WorldConfig =
        serde_json::from_str(r#"{ "gravity": [0.0, 300.0], "quadtree": { "straddle": "KeepAtParent" } }"#).unwrap();
    assert_eq!(cfg.gravity, Vec2::new(0.0, 300.0));
    assert_eq!(cfg.quadtree.straddle, StraddlePolicy::KeepAtParent);
    assert_eq!(cfg.quadtree.max_objects, 10);
    assert_eq!(cfg.bounds, WorldConfig::default().bounds);
    assert!(PhysicsWorld::new(cfg).is_ok());
}
