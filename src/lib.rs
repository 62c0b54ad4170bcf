//! Arena Phys - real-time 2D physics for a rectangular arcade arena
//!
//! Core modules:
//! - `sim`: Simulation (bodies, collision, gravity, the per-frame tick)
//! - `config`: Data-driven engine tunables and presets
//! - `error`: Input validation errors

pub mod config;
pub mod error;
pub mod sim;

pub use config::{PenaltyMode, TunablePreset, Tunables};
pub use error::{PhysicsError, Result};
pub use sim::{Arena, Body, BodyId, Contact, Edge, Edges, PhysicsEngine};

use glam::Vec2;

/// Engine constants
pub mod consts {
    /// Pairs closer than this are skipped by pairwise gravity (avoids 1/r² blowup)
    pub const MIN_GRAVITY_DISTANCE: f32 = 1e-3;
    /// Default velocity transfer ratio between colliding bodies
    pub const DEFAULT_TRANSFER: f32 = 0.5;
    /// Default pairwise gravity constant (body-to-body gravity is opt-in)
    pub const DEFAULT_GRAVITY_CONSTANT: f32 = 0.0;
    /// Default body mass
    pub const DEFAULT_MASS: f32 = 1.0;
}

/// Wrap an angle to [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Angle of a direction vector, wrapped to [0, 2π)
#[inline]
pub fn angle_of(dir: Vec2) -> f32 {
    wrap_angle(dir.y.atan2(dir.x))
}
