//! Error types for the combat simulation.
//!
//! Only the external entry points return errors. Inside a tick, bad
//! queries resolve to "no result" and out-of-range stats are clamped.

use thiserror::Error;

use crate::components::{Prayer, Stance};
use crate::world::EntityId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The entity exists but carries no unit data (a static blocker).
    #[error("Entity {0} is not a unit")]
    NotAUnit(EntityId),

    /// The entity is playing its death animation and accepts no orders.
    #[error("Entity {0} is dying")]
    UnitDying(EntityId),

    /// A unit cannot target itself.
    #[error("Entity {0} cannot target itself")]
    SelfTarget(EntityId),

    /// The equipped weapon does not offer the requested stance.
    #[error("Stance {stance:?} is not available to {weapon}")]
    StanceUnavailable {
        /// Requested stance.
        stance: Stance,
        /// Name of the equipped weapon.
        weapon: String,
    },

    /// The equipped weapon has no special attack, or energy is too low.
    #[error("Special attack unavailable for entity {0}")]
    SpecialUnavailable(EntityId),

    /// Primary actors only: the prayer is not usable by this unit.
    #[error("Prayer {prayer:?} is unavailable to entity {entity}")]
    PrayerUnavailable {
        /// Unit that requested the prayer.
        entity: EntityId,
        /// Requested prayer.
        prayer: Prayer,
    },

    /// Invariant check failed after a tick; the tick must be treated as fatal.
    #[error("Invariant violated at tick {tick}: {message}")]
    InvariantViolation {
        /// Tick where the violation was detected.
        tick: u64,
        /// Description of the violated invariant.
        message: String,
    },
}
