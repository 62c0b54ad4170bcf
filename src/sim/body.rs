//! Simulated bodies
//!
//! A body is a point mass with an axis-aligned rectangular extent. The engine
//! only ever looks at its position, velocity, mass and bounds.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::contact::Contact;
use crate::consts::DEFAULT_MASS;
use crate::error::{PhysicsError, Result};

/// Engine-assigned body identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    /// Id carried by a body that has not been added to an engine yet
    pub const UNASSIGNED: BodyId = BodyId(0);
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Axis-aligned bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap on both axes (touching edges do not count)
    #[inline]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// Collision listener
pub type CollisionListener = Box<dyn FnMut(&Contact)>;

/// A simulated body
pub struct Body {
    pub(crate) id: BodyId,
    /// Human-readable identifier for lookup and logging
    pub label: String,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Half width / half height of the bounding rectangle
    pub half_extents: Vec2,
    mass: f32,
    listeners: Vec<CollisionListener>,
}

impl Body {
    /// Create a zero-size body (a point) with unit mass
    pub fn new(label: impl Into<String>, position: Vec2) -> Self {
        Self {
            id: BodyId::UNASSIGNED,
            label: label.into(),
            position,
            velocity: Vec2::ZERO,
            half_extents: Vec2::ZERO,
            mass: DEFAULT_MASS,
            listeners: Vec::new(),
        }
    }

    /// Create a square body centered on `position`
    pub fn square(label: impl Into<String>, position: Vec2, size: f32) -> Self {
        Self::rect(label, position, size, size)
    }

    /// Create a rectangular body centered on `position`
    pub fn rect(label: impl Into<String>, position: Vec2, width: f32, height: f32) -> Self {
        let mut body = Self::new(label, position);
        body.half_extents = Vec2::new(width.abs(), height.abs()) * 0.5;
        body
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder-style mass setter; rejects zero, negative and non-finite masses
    pub fn with_mass(mut self, mass: f32) -> Result<Self> {
        self.set_mass(mass)?;
        Ok(self)
    }

    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(PhysicsError::InvalidMass {
                label: self.label.clone(),
                mass,
            });
        }
        self.mass = mass;
        Ok(())
    }

    #[inline]
    pub fn id(&self) -> BodyId {
        self.id
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Bounding rectangle at the current position
    #[inline]
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min: self.position - self.half_extents,
            max: self.position + self.half_extents,
        }
    }

    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    /// Register a listener called on every delivered collision
    pub fn add_collision_callback<F>(&mut self, listener: F)
    where
        F: FnMut(&Contact) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver a collision to every registered listener, in registration order
    pub fn collision(&mut self, contact: &Contact) {
        for listener in &mut self.listeners {
            listener(contact);
        }
    }

    /// Reject NaN/infinite state before it can enter the simulation
    pub(crate) fn check_finite(&self) -> Result<()> {
        let fields = [
            ("position", self.position),
            ("velocity", self.velocity),
            ("half_extents", self.half_extents),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(PhysicsError::NonFinite {
                    label: self.label.clone(),
                    field,
                });
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> BodySnapshot {
        BodySnapshot {
            id: self.id,
            label: self.label.clone(),
            position: self.position,
            velocity: self.velocity,
            mass: self.mass,
            bounds: self.bounds(),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("half_extents", &self.half_extents)
            .field("mass", &self.mass)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Read-only view of a body for renderers and other consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub label: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub bounds: Bounds,
}
