use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::domain::answers::Field;
use crate::errors::DomainError;
use crate::flows::states::{FlowAction, FlowContext, FlowEvent, SessionPhase, TransitionOutcome};

pub trait FlowDefinition {
    fn initial_phase(&self) -> SessionPhase;
    fn transition(
        &self,
        current: SessionPhase,
        event: FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Collect answers, quote them, then place one order.
#[derive(Clone, Debug, Default)]
pub struct LightingOrderFlow;

impl FlowDefinition for LightingOrderFlow {
    fn initial_phase(&self) -> SessionPhase {
        SessionPhase::Collecting
    }

    fn transition(
        &self,
        current: SessionPhase,
        event: FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_lighting_order(current, event, context)
    }
}

#[derive(Clone, Debug)]
pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_phase(&self) -> SessionPhase {
        self.flow.initial_phase()
    }

    pub fn apply(
        &self,
        current: SessionPhase,
        event: FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: SessionPhase,
        event: FlowEvent,
        context: &FlowContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    audit
                        .event(
                            "flow.transition_applied",
                            AuditCategory::Flow,
                            AuditOutcome::Success,
                        )
                        .with_metadata("from", format!("{:?}", outcome.from))
                        .with_metadata("to", format!("{:?}", outcome.to))
                        .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    audit
                        .event(
                            "flow.transition_rejected",
                            AuditCategory::Flow,
                            AuditOutcome::Rejected,
                        )
                        .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }

    /// Applies a transition that settles an in-flight phase. The table accepts
    /// every such event, so a rejection means the table and caller disagree.
    pub fn settle_with_audit<S>(
        &self,
        current: SessionPhase,
        event: FlowEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<SessionPhase, DomainError>
    where
        S: AuditSink + ?Sized,
    {
        match self.apply_with_audit(current, event, &FlowContext::default(), sink, audit) {
            Ok(outcome) => Ok(outcome.to),
            Err(error) => Err(DomainError::InvariantViolation(format!(
                "in-flight phase could not settle: {error}"
            ))),
        }
    }
}

impl Default for FlowEngine<LightingOrderFlow> {
    fn default() -> Self {
        Self::new(LightingOrderFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("missing required fields before transition from {phase:?}: {missing_fields:?}")]
    MissingRequiredFields { phase: SessionPhase, missing_fields: Vec<Field> },
    #[error("invalid transition from {phase:?} using event {event:?}")]
    InvalidTransition { phase: SessionPhase, event: FlowEvent },
}

fn transition_lighting_order(
    current: SessionPhase,
    event: FlowEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{
        HandOffAnswers, NotifyOrderPlaced, ReportOrderFailure, RequestQuote, ResetAnswers,
        SubmitOrder, SurfaceQuoteFailure,
    };
    use FlowEvent::{
        OrderConfirmed, OrderFailed, OrderRequested, QuoteFailed, QuoteReceived, QuoteRequested,
        Restarted,
    };
    use SessionPhase::{Collecting, OrderInFlight, Ordered, QuoteInFlight, Quoted};

    let (to, actions) = match (current, event) {
        (Collecting, QuoteRequested) => {
            if !context.missing_required_fields.is_empty() {
                return Err(FlowTransitionError::MissingRequiredFields {
                    phase: current,
                    missing_fields: context.missing_required_fields.clone(),
                });
            }
            (QuoteInFlight, vec![RequestQuote])
        }
        (QuoteInFlight, QuoteReceived) => (Quoted, vec![HandOffAnswers]),
        (QuoteInFlight, QuoteFailed) => (Collecting, vec![SurfaceQuoteFailure]),
        (Quoted, OrderRequested) => (OrderInFlight, vec![SubmitOrder]),
        (OrderInFlight, OrderConfirmed) => (Ordered, vec![NotifyOrderPlaced]),
        (OrderInFlight, OrderFailed) => (Quoted, vec![ReportOrderFailure]),
        (_, Restarted) => (Collecting, vec![ResetAnswers]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition { phase: current, event });
        }
    };

    Ok(TransitionOutcome { from: current, to, event, actions })
}

#[cfg(test)]
mod tests {
    use crate::audit::{AuditContext, InMemoryAuditSink};
    use crate::domain::answers::Field;
    use crate::domain::session::SessionId;
    use crate::errors::DomainError;
    use crate::flows::engine::{FlowDefinition, FlowEngine, FlowTransitionError, LightingOrderFlow};
    use crate::flows::states::{FlowAction, FlowContext, FlowEvent, SessionPhase};

    #[test]
    fn quote_then_order_happy_path() {
        let engine = FlowEngine::new(LightingOrderFlow);
        let context = FlowContext::default();
        let mut phase = engine.initial_phase();

        phase = engine
            .apply(phase, FlowEvent::QuoteRequested, &context)
            .expect("collecting -> quote in flight")
            .to;
        let quoted = engine
            .apply(phase, FlowEvent::QuoteReceived, &context)
            .expect("quote in flight -> quoted");
        assert_eq!(quoted.to, SessionPhase::Quoted);
        assert_eq!(quoted.actions, vec![FlowAction::HandOffAnswers]);

        phase = engine
            .apply(quoted.to, FlowEvent::OrderRequested, &context)
            .expect("quoted -> order in flight")
            .to;
        phase = engine
            .apply(phase, FlowEvent::OrderConfirmed, &context)
            .expect("order in flight -> ordered")
            .to;
        assert_eq!(phase, SessionPhase::Ordered);
    }

    #[test]
    fn failures_roll_back_to_a_retryable_phase() {
        let engine = FlowEngine::default();
        let context = FlowContext::default();

        let quote_failed = engine
            .apply(SessionPhase::QuoteInFlight, FlowEvent::QuoteFailed, &context)
            .expect("quote failure rolls back");
        assert_eq!(quote_failed.to, SessionPhase::Collecting);
        assert_eq!(quote_failed.actions, vec![FlowAction::SurfaceQuoteFailure]);

        let order_failed = engine
            .apply(SessionPhase::OrderInFlight, FlowEvent::OrderFailed, &context)
            .expect("order failure rolls back");
        assert_eq!(order_failed.to, SessionPhase::Quoted);
        assert_eq!(order_failed.actions, vec![FlowAction::ReportOrderFailure]);
    }

    #[test]
    fn missing_required_fields_block_the_quote_request() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(
                SessionPhase::Collecting,
                FlowEvent::QuoteRequested,
                &FlowContext::with_missing(vec![Field::Sides, Field::RoofPitch]),
            )
            .expect_err("must reject missing fields");

        assert_eq!(
            error,
            FlowTransitionError::MissingRequiredFields {
                phase: SessionPhase::Collecting,
                missing_fields: vec![Field::Sides, Field::RoofPitch],
            }
        );
    }

    #[test]
    fn order_cannot_be_requested_twice_or_before_a_quote() {
        let engine = FlowEngine::default();
        let context = FlowContext::default();

        for phase in [SessionPhase::Collecting, SessionPhase::OrderInFlight, SessionPhase::Ordered] {
            let error = engine
                .apply(phase, FlowEvent::OrderRequested, &context)
                .expect_err("order request only allowed from quoted");
            assert!(matches!(error, FlowTransitionError::InvalidTransition { .. }));
        }

        let error = engine
            .apply(SessionPhase::Quoted, FlowEvent::QuoteRequested, &context)
            .expect_err("a quoted session cannot be quoted again without restart");
        assert!(matches!(
            error,
            FlowTransitionError::InvalidTransition {
                phase: SessionPhase::Quoted,
                event: FlowEvent::QuoteRequested
            }
        ));
    }

    #[test]
    fn restart_returns_any_phase_to_collecting() {
        let engine = FlowEngine::default();
        for phase in [SessionPhase::Quoted, SessionPhase::Ordered, SessionPhase::QuoteInFlight] {
            let outcome = engine
                .apply(phase, FlowEvent::Restarted, &FlowContext::default())
                .expect("restart is always allowed");
            assert_eq!(outcome.to, SessionPhase::Collecting);
            assert_eq!(outcome.actions, vec![FlowAction::ResetAnswers]);
        }
        assert_eq!(LightingOrderFlow.initial_phase(), SessionPhase::Collecting);
    }

    #[test]
    fn transitions_emit_audit_events() {
        let engine = FlowEngine::default();
        let sink = InMemoryAuditSink::default();
        let audit = AuditContext::new(SessionId("S-0009".to_owned()), "req-42", "flow-engine");

        let _ = engine
            .apply_with_audit(
                SessionPhase::Collecting,
                FlowEvent::QuoteRequested,
                &FlowContext::default(),
                &sink,
                &audit,
            )
            .expect("transition should succeed");
        let _ = engine.apply_with_audit(
            SessionPhase::Collecting,
            FlowEvent::OrderConfirmed,
            &FlowContext::default(),
            &sink,
            &audit,
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].correlation_id, "req-42");
        assert_eq!(events[0].event_type, "flow.transition_applied");
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("QuoteInFlight"));
        assert_eq!(events[1].event_type, "flow.transition_rejected");
    }

    #[test]
    fn settling_from_a_phase_that_is_not_in_flight_is_an_invariant_violation() {
        let engine = FlowEngine::default();
        let sink = InMemoryAuditSink::default();
        let audit = AuditContext::new(SessionId("S-0010".to_owned()), "req-43", "order");

        let settled = engine
            .settle_with_audit(SessionPhase::OrderInFlight, FlowEvent::OrderFailed, &sink, &audit)
            .expect("order failure settles");
        assert_eq!(settled, SessionPhase::Quoted);

        let error = engine
            .settle_with_audit(SessionPhase::Collecting, FlowEvent::QuoteReceived, &sink, &audit)
            .expect_err("nothing is in flight");
        assert!(matches!(
            error,
            DomainError::InvariantViolation(message) if message.contains("Collecting")
        ));
        assert_eq!(
            sink.event_types(),
            vec!["flow.transition_applied".to_string(), "flow.transition_rejected".to_string()]
        );
    }
}
