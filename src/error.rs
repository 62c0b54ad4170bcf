//! Error types for the physics engine

/// Errors produced when building bodies or loading tunables.
///
/// The per-tick pipeline itself never fails; every degenerate numeric case is
/// handled in place. These errors reject bad input before it can reach the
/// simulation state.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// Mass must be positive and finite.
    #[error("body '{label}' has invalid mass {mass} (must be positive and finite)")]
    InvalidMass { label: String, mass: f32 },

    /// A position, velocity or extent component was NaN or infinite.
    #[error("body '{label}' has a non-finite {field}")]
    NonFinite { label: String, field: &'static str },

    /// A tunable is outside its accepted range.
    #[error("tunable '{name}' has invalid value {value}")]
    InvalidTunable { name: &'static str, value: f32 },

    #[error("failed to parse tunables: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to read or write tunables file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
