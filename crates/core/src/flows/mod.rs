pub mod engine;
pub mod states;

pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, LightingOrderFlow};
pub use states::{FlowAction, FlowContext, FlowEvent, SessionPhase, TransitionOutcome};
