use serde::{Deserialize, Serialize};

use crate::domain::answers::Field;

/// Where a session sits between collecting answers and a placed order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Collecting,
    QuoteInFlight,
    Quoted,
    OrderInFlight,
    Ordered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    QuoteRequested,
    QuoteReceived,
    QuoteFailed,
    OrderRequested,
    OrderConfirmed,
    OrderFailed,
    Restarted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    pub missing_required_fields: Vec<Field>,
}

impl FlowContext {
    pub fn with_missing(missing_required_fields: Vec<Field>) -> Self {
        Self { missing_required_fields }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    RequestQuote,
    HandOffAnswers,
    SurfaceQuoteFailure,
    SubmitOrder,
    NotifyOrderPlaced,
    ReportOrderFailure,
    ResetAnswers,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub event: FlowEvent,
    pub actions: Vec<FlowAction>,
}
