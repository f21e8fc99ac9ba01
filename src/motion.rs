//! Steering helpers for gameplay code. Angles are radians, measured from +X toward +Y.

use glam::Vec2;

use crate::body::Body;

pub fn velocity_from_angle(angle: f32, speed: f32) -> Vec2 {
    Vec2::from_angle(angle) * speed
}

pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

pub fn distance_between(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Point the body's velocity at `target` (measured from its centre).
///
/// With `arrive_in` set to a positive duration the speed is chosen so the centre
/// reaches the target in that time, overriding `speed`. Returns the heading.
pub fn move_towards(body: &mut Body, target: Vec2, speed: f32, arrive_in: Option<f32>) -> f32 {
    let from = body.center();
    let angle = angle_between(from, target);
    let speed = match arrive_in {
        Some(t) if t > 0.0 => distance_between(from, target) / t,
        _ => speed,
    };
    body.velocity = velocity_from_angle(angle, speed);
    angle
}

/// Accelerate the body toward `target`, capping its speed per axis. Returns the heading.
pub fn accelerate_towards(body: &mut Body, target: Vec2, acceleration: f32, max_speed: Vec2) -> f32 {
    let angle = angle_between(body.center(), target);
    body.acceleration = velocity_from_angle(angle, acceleration);
    body.max_velocity = max_speed;
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_velocity_from_angle() {
        let v = velocity_from_angle(FRAC_PI_2, 10.0);
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_angle_and_distance() {
        assert_eq!(angle_between(Vec2::ZERO, Vec2::new(5.0, 0.0)), 0.0);
        assert!((angle_between(Vec2::ZERO, Vec2::new(0.0, -3.0)) + FRAC_PI_2).abs() < 1e-6);
        assert_eq!(distance_between(Vec2::new(1.0, 1.0), Vec2::new(4.0, 5.0)), 5.0);
    }

    #[test]
    fn test_move_towards_arrives_in_time() {
        let mut b = Body::new(0.0, 0.0, 2.0, 2.0);
        move_towards(&mut b, Vec2::new(31.0, 1.0), 999.0, Some(2.0));
        assert!((b.velocity.x - 15.0).abs() < 1e-4);
        assert!(b.velocity.y.abs() < 1e-4);

        move_towards(&mut b, Vec2::new(1.0, 41.0), 4.0, None);
        assert!((b.velocity.y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_accelerate_towards_sets_cap() {
        let mut b = Body::new(0.0, 0.0, 2.0, 2.0);
        accelerate_towards(&mut b, Vec2::new(-9.0, 1.0), 50.0, Vec2::splat(20.0));
        assert!((b.acceleration.x + 50.0).abs() < 1e-3);
        assert_eq!(b.max_velocity, Vec2::splat(20.0));
    }
}
