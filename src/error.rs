use crate::types::BodyHandle;

/// Errors surfaced to callers of the physics world.
///
/// Per-body numeric faults are not errors: they are recovered inside `tick` and logged.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Rejected configuration; nothing was changed.
    InvalidConfiguration(String),
    /// A query or accessor referenced a handle that is not (or no longer) registered.
    UnknownBody(BodyHandle),
}

impl std::fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhysicsError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            PhysicsError::UnknownBody(h) => {
                write!(f, "Unknown body handle: index {} generation {}", h.index, h.generation)
            }
        }
    }
}

impl std::error::Error for PhysicsError {}
