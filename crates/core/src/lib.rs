pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod order;
pub mod services;
pub mod wizard;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, NullAuditSink};
pub use domain::answers::{
    AnswerRecord, Choice, Field, LightColor, RoofPitch, RoofType, RunLength, Selection, Side,
    StoryHeight,
};
pub use domain::customer::{ContactField, CustomerDetails};
pub use domain::quote::{OrderReceipt, QuoteHandoff, QuoteResult};
pub use domain::session::SessionId;
pub use errors::{ApplicationError, DomainError, InterfaceError, ValidationError};
pub use flows::{FlowEngine, LightingOrderFlow, SessionPhase};
pub use order::OrderSession;
pub use services::{CheckoutService, PricingService, ServiceError};
pub use wizard::{Advance, StepDescriptor, WizardController, WizardSession, STEPS, STEP_COUNT};
