pub mod controller;
pub mod session;
pub mod steps;

pub use controller::{Advance, WizardController};
pub use session::WizardSession;
pub use steps::{step, StepDescriptor, StepKind, STEPS, STEP_COUNT};
