//! Domain types shared by the storage and record access layers.
pub mod record;
pub mod types;

pub use record::{ApplicationField, CandidateField, IndexField, PositionField, Record};
pub use types::{
    Application, ApplicationStatus, Candidate, CandidatePatch, NewApplication, NewPosition,
    ParseStatusError, Position, PositionPatch, PositionStatus, PositionType,
};
