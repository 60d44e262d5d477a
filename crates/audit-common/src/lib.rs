//! Common types shared across the vegetation audit crates and services.

pub mod bbox;
pub mod error;
pub mod geo;
pub mod persona;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{AtStage, AuditError, AuditStage, ErrorCategory, Result, StageError};
pub use geo::{Coordinate, EARTH_RADIUS_KM, KM_PER_DEGREE};
pub use persona::{AuditField, Persona};
pub use time::{AuditYear, YearWindow};
