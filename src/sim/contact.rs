//! Collision event payloads and arena edge flags

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::BodyId;
use crate::angle_of;

/// One edge of the arena rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    /// Contact angle for a hit on this edge (radians)
    pub fn angle(self) -> f32 {
        match self {
            Edge::Left => 0.0,
            Edge::Top => FRAC_PI_2,
            Edge::Right => PI,
            Edge::Bottom => 3.0 * FRAC_PI_2,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Edge::Left => 1,
            Edge::Right => 1 << 1,
            Edge::Top => 1 << 2,
            Edge::Bottom => 1 << 3,
        }
    }
}

/// Small set of arena edges a body is touching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edges(u8);

impl Edges {
    pub const NONE: Edges = Edges(0);

    pub fn insert(&mut self, edge: Edge) {
        self.0 |= edge.bit();
    }

    pub fn remove(&mut self, edge: Edge) {
        self.0 &= !edge.bit();
    }

    pub fn contains(&self, edge: Edge) -> bool {
        self.0 & edge.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Edges in Left, Right, Top, Bottom order
    pub fn iter(&self) -> impl Iterator<Item = Edge> + '_ {
        Edge::ALL.into_iter().filter(|e| self.contains(*e))
    }

    /// Combined contact angle: the circular mean of the member edge angles.
    ///
    /// A corner hit lands halfway between its two edges (Left+Top = π/4,
    /// Left+Bottom = 7π/4). Empty sets report 0.
    pub fn angle(&self) -> f32 {
        let sum: Vec2 = self
            .iter()
            .map(|e| Vec2::new(e.angle().cos(), e.angle().sin()))
            .sum();
        if sum.length_squared() < 1e-6 {
            // Opposite edges cancel out; fall back to the first member
            return self.iter().next().map(Edge::angle).unwrap_or(0.0);
        }
        angle_of(sum)
    }
}

impl FromIterator<Edge> for Edges {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        let mut edges = Edges::NONE;
        for edge in iter {
            edges.insert(edge);
        }
        edges
    }
}

/// A delivered collision event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The body receiving the event
    pub body: BodyId,
    /// The other body, or `None` for an arena edge
    pub other: Option<BodyId>,
    /// Contact angle in radians, [0, 2π)
    pub angle: f32,
    /// Arena edges being touched (empty for body-to-body contacts)
    pub edges: Edges,
}

impl Contact {
    pub fn is_boundary(&self) -> bool {
        self.other.is_none()
    }
}
