//! Engine tunables and presets
//!
//! Tunables are plain data: gameplay code mutates them between ticks, and they
//! can be loaded from / saved to JSON.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_GRAVITY_CONSTANT, DEFAULT_TRANSFER};
use crate::error::{PhysicsError, Result};

/// How a collision penalty reduces a reflected velocity component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyMode {
    /// Penalty is a fraction of the speed lost (0.0 - 1.0)
    #[default]
    Proportional,
    /// Penalty is a flat speed subtracted per bounce, snapping to zero
    Absolute,
}

/// Tunable presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TunablePreset {
    /// Engine defaults: lossless bounces, half transfer, no pairwise gravity
    #[default]
    Standard,
    /// Lossy bounces and strong transfer, no body-to-body gravity
    Arcade,
    /// Standard bounces with unit pairwise gravity
    Orbital,
}

impl TunablePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            TunablePreset::Standard => "Standard",
            TunablePreset::Arcade => "Arcade",
            TunablePreset::Orbital => "Orbital",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Some(TunablePreset::Standard),
            "arcade" => Some(TunablePreset::Arcade),
            "orbital" | "nbody" => Some(TunablePreset::Orbital),
            _ => None,
        }
    }
}

/// Global simulation tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Uniform gravity added to every body's velocity each tick
    pub gravity: Vec2,
    /// Velocity penalty for a body bouncing off an arena edge
    pub static_collision_penalty: f32,
    /// Velocity loss fraction for two bodies colliding (0.0 - 1.0)
    pub dynamic_collision_penalty: f32,
    /// Velocity transfer ratio between two bodies (0.0 - 1.0).
    /// 1.0 swaps velocities, 0.0 transfers nothing.
    pub dynamic_collision_transfer: f32,
    /// Pairwise gravity constant (0.0 disables body-to-body gravity)
    pub dynamic_gravity_constant: f32,
    /// How `static_collision_penalty` is applied
    pub penalty_mode: PenaltyMode,
    /// Weight the body exchange by mass so momentum is conserved instead of
    /// the velocity sum
    pub mass_weighted_transfer: bool,
    /// Zero the velocity component pushing a body further through an arena
    /// edge it already rests on. Off by default: resting contacts only clamp
    /// the position, so a constant gravity keeps building velocity.
    pub absorb_resting_velocity: bool,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            static_collision_penalty: 0.0,
            dynamic_collision_penalty: 0.0,
            dynamic_collision_transfer: DEFAULT_TRANSFER,
            dynamic_gravity_constant: DEFAULT_GRAVITY_CONSTANT,
            penalty_mode: PenaltyMode::Proportional,
            mass_weighted_transfer: false,
            absorb_resting_velocity: false,
        }
    }
}

impl Tunables {
    /// Create tunables from a preset
    pub fn from_preset(preset: TunablePreset) -> Self {
        match preset {
            TunablePreset::Standard => Self::default(),
            TunablePreset::Arcade => Self {
                gravity: Vec2::ZERO,
                static_collision_penalty: 0.5,
                dynamic_collision_penalty: 0.25,
                dynamic_collision_transfer: 0.75,
                dynamic_gravity_constant: 0.0,
                penalty_mode: PenaltyMode::Absolute,
                mass_weighted_transfer: false,
                absorb_resting_velocity: true,
            },
            TunablePreset::Orbital => Self {
                dynamic_gravity_constant: 1.0,
                ..Self::default()
            },
        }
    }

    /// Check every value is finite and in range
    pub fn validate(&self) -> Result<()> {
        let check = |name: &'static str, value: f32, ok: bool| {
            if value.is_finite() && ok {
                Ok(())
            } else {
                Err(PhysicsError::InvalidTunable { name, value })
            }
        };

        check("gravity.x", self.gravity.x, true)?;
        check("gravity.y", self.gravity.y, true)?;
        check(
            "static_collision_penalty",
            self.static_collision_penalty,
            self.static_collision_penalty >= 0.0,
        )?;
        check(
            "dynamic_collision_penalty",
            self.dynamic_collision_penalty,
            (0.0..=1.0).contains(&self.dynamic_collision_penalty),
        )?;
        check(
            "dynamic_collision_transfer",
            self.dynamic_collision_transfer,
            (0.0..=1.0).contains(&self.dynamic_collision_transfer),
        )?;
        check(
            "dynamic_gravity_constant",
            self.dynamic_gravity_constant,
            true,
        )?;
        Ok(())
    }

    /// Parse and validate tunables from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self> {
        let tunables: Self = serde_json::from_str(json)?;
        tunables.validate()?;
        Ok(tunables)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load tunables from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tunables = Self::from_json(&json)?;
        log::info!("Loaded tunables from {}", path.display());
        Ok(tunables)
    }

    /// Save tunables to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        std::fs::write(path, self.to_json()?)?;
        log::info!("Tunables saved to {}", path.display());
        Ok(())
    }
}
