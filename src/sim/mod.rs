//! Simulation module
//!
//! Everything that moves lives here. This module must stay free of rendering
//! and platform code:
//! - One tick is one unit time step
//! - Stable iteration order (insertion order of bodies)
//! - Listeners run synchronously, inside the tick

pub mod body;
pub mod collision;
pub mod contact;
pub mod engine;
pub mod gravity;

pub use body::{Body, BodyId, BodySnapshot, Bounds, CollisionListener};
pub use collision::{
    boundary_edges, broad_phase, overlap, reflect, transfer_velocity, transfer_velocity_weighted,
};
pub use contact::{Contact, Edge, Edges};
pub use engine::{Arena, PhysicsEngine};
