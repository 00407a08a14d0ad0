//! Submission flow: the step state machine, the controller that drives it, and the
//! interactive session loop used by presentation layers.

mod controller;
mod progress;
pub mod session;

pub use controller::{SubmissionController, SubmitOutcome};
pub use progress::{FlowState, Step, SubmissionProgress, SubmitEvent};
