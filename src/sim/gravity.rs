//! Uniform and pairwise gravity
//!
//! Both act directly on velocity with a unit time step: the engine has no
//! notion of dt, one tick is one step.

use glam::Vec2;

use super::body::Body;
use crate::consts::MIN_GRAVITY_DISTANCE;

/// Add the same gravity vector to every body
pub fn apply_uniform(bodies: &mut [Body], gravity: Vec2) {
    if gravity == Vec2::ZERO {
        return;
    }
    for body in bodies {
        body.velocity += gravity;
    }
}

/// Newtonian attraction between every pair of bodies: F = G·m1·m2 / r².
///
/// Each unordered pair is visited once and both bodies get their half of the
/// interaction (equal magnitude, opposite direction), which is the same net
/// result as visiting every ordered pair. Pairs closer than
/// `MIN_GRAVITY_DISTANCE` are skipped. Returns the number of skipped pairs.
pub fn apply_pairwise(bodies: &mut [Body], constant: f32) -> usize {
    if constant == 0.0 {
        return 0;
    }

    let mut skipped = 0;
    for i in 0..bodies.len() {
        let (head, tail) = bodies.split_at_mut(i + 1);
        let p = &mut head[i];
        for c in tail.iter_mut() {
            let offset = c.position - p.position;
            let distance = offset.length();
            if distance < MIN_GRAVITY_DISTANCE || !distance.is_finite() {
                skipped += 1;
                continue;
            }
            let force = constant * p.mass() * c.mass() / (distance * distance);
            let impulse = offset / distance * force;
            p.velocity += impulse;
            c.velocity -= impulse;
        }
    }
    skipped
}
