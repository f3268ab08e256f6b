//! Core pipeline model: stages, phases, item statuses, and sub-states.

mod stage;
mod status;

pub use stage::{transition, PipelinePhase, Stage, StageEvent, UnknownStageError};
pub use status::{InteractionState, ItemStatus};
