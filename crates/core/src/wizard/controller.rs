use std::sync::Arc;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink, NullAuditSink};
use crate::domain::answers::Selection;
use crate::domain::quote::{QuoteHandoff, QuoteResult};
use crate::errors::{ApplicationError, DomainError, ValidationError, QUOTE_FAILED_MESSAGE};
use crate::flows::{
    FlowContext, FlowEngine, FlowEvent, FlowTransitionError, LightingOrderFlow, SessionPhase,
};
use crate::services::PricingService;
use crate::wizard::session::WizardSession;

/// Result of a successful [`WizardController::advance`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    Moved { from: usize, to: usize },
    Quoted(QuoteHandoff),
}

/// Drives step progression and the quote request for a [`WizardSession`].
pub struct WizardController<P> {
    pricing: P,
    engine: FlowEngine<LightingOrderFlow>,
    audit_sink: Arc<dyn AuditSink>,
}

impl<P> WizardController<P>
where
    P: PricingService,
{
    pub fn new(pricing: P) -> Self {
        Self {
            pricing,
            engine: FlowEngine::default(),
            audit_sink: Arc::new(NullAuditSink),
        }
    }

    pub fn with_audit_sink(mut self, audit_sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = audit_sink;
        self
    }

    pub fn pricing(&self) -> &P {
        &self.pricing
    }

    /// Records a choice. Never moves the step and never fails.
    pub fn select_option(&self, session: &mut WizardSession, selection: Selection) {
        session.answers.apply(selection);
    }

    pub async fn advance(&self, session: &mut WizardSession) -> Result<Advance, ApplicationError> {
        let step = session.current_step();
        if let Some(field) = step.missing_field(&session.answers) {
            let error = ValidationError::required(field);
            session.validation_error = Some(error.message.clone());
            self.audit_sink.emit(
                self.audit_context(session)
                    .event(
                        "wizard.validation_failed",
                        AuditCategory::Wizard,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("step", session.step_index.to_string())
                    .with_metadata("field", field.key()),
            );
            return Err(error.into());
        }

        session.validation_error = None;
        if session.is_last_step() {
            return self.submit_for_quote(session).await.map(Advance::Quoted);
        }

        let from = session.step_index;
        session.step_index += 1;
        self.audit_sink.emit(
            self.audit_context(session)
                .event("wizard.step_advanced", AuditCategory::Wizard, AuditOutcome::Success)
                .with_metadata("from", from.to_string())
                .with_metadata("to", session.step_index.to_string()),
        );
        Ok(Advance::Moved { from, to: session.step_index })
    }

    /// Steps back one question. Returns `false` without changing anything on
    /// the first step or once the answers have been quoted.
    pub fn retreat(&self, session: &mut WizardSession) -> bool {
        if session.step_index == 0 || session.phase != SessionPhase::Collecting {
            return false;
        }

        let from = session.step_index;
        session.step_index -= 1;
        self.audit_sink.emit(
            self.audit_context(session)
                .event("wizard.step_retreated", AuditCategory::Wizard, AuditOutcome::Success)
                .with_metadata("from", from.to_string())
                .with_metadata("to", session.step_index.to_string()),
        );
        true
    }

    /// Sends the answers to the pricing service. Only valid on the last step
    /// with every field present; sends exactly one request per call.
    pub async fn submit_for_quote(
        &self,
        session: &mut WizardSession,
    ) -> Result<QuoteHandoff, ApplicationError> {
        if !session.is_last_step() {
            return Err(DomainError::InvariantViolation(
                "a quote can only be requested from the final step".to_owned(),
            )
            .into());
        }

        session.validation_error = None;
        let audit = self.audit_context(session);
        let context = FlowContext::with_missing(session.answers.missing_fields());
        let requested = match self.engine.apply_with_audit(
            session.phase,
            FlowEvent::QuoteRequested,
            &context,
            self.audit_sink.as_ref(),
            &audit,
        ) {
            Ok(outcome) => outcome,
            Err(FlowTransitionError::MissingRequiredFields { missing_fields, .. }) => {
                let error = ValidationError::incomplete(missing_fields);
                session.validation_error = Some(error.message.clone());
                return Err(error.into());
            }
            Err(error) => return Err(error.into()),
        };
        session.phase = requested.to;

        let reply = self.pricing.quote(&session.answers).await;
        let event = if reply.is_ok() { FlowEvent::QuoteReceived } else { FlowEvent::QuoteFailed };
        let settled =
            self.engine.settle_with_audit(session.phase, event, self.audit_sink.as_ref(), &audit);
        match settled {
            Ok(phase) => session.phase = phase,
            Err(error) => {
                session.phase = SessionPhase::Collecting;
                return Err(error.into());
            }
        }

        match reply {
            Ok(response) => {
                let quote = QuoteResult { amount: response.quote };
                session.quote = Some(quote);
                self.audit_sink.emit(
                    audit
                        .event("quote.received", AuditCategory::Pricing, AuditOutcome::Success)
                        .with_metadata("amount", quote.amount.to_string()),
                );
                Ok(QuoteHandoff {
                    session_id: session.id.clone(),
                    quote,
                    answers: session.answers.clone(),
                })
            }
            Err(error) => {
                session.validation_error = Some(QUOTE_FAILED_MESSAGE.to_owned());
                self.audit_sink.emit(
                    audit
                        .event("quote.failed", AuditCategory::Pricing, AuditOutcome::Failed)
                        .with_metadata("error", error.to_string()),
                );
                Err(ApplicationError::QuoteRequest(error.to_string()))
            }
        }
    }

    /// Abandons the current run and starts over on the first step.
    pub fn restart(&self, session: &mut WizardSession) -> Result<(), ApplicationError> {
        let audit = self.audit_context(session);
        self.engine.apply_with_audit(
            session.phase,
            FlowEvent::Restarted,
            &FlowContext::default(),
            self.audit_sink.as_ref(),
            &audit,
        )?;
        session.reset();
        Ok(())
    }

    fn audit_context(&self, session: &WizardSession) -> AuditContext {
        AuditContext::new(session.id.clone(), session.id.0.clone(), "wizard")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{Advance, WizardController};
    use crate::audit::InMemoryAuditSink;
    use crate::domain::answers::{
        Choice, Field, LightColor, RoofPitch, RoofType, RunLength, Selection, Side, StoryHeight,
    };
    use crate::errors::{ApplicationError, DomainError};
    use crate::flows::{FlowTransitionError, SessionPhase};
    use crate::services::{ScriptedPricingService, ServiceError};
    use crate::wizard::session::WizardSession;
    use crate::wizard::steps::{STEPS, STEP_COUNT};

    fn selection_for(step: usize) -> Selection {
        match step {
            0 => Selection::Color(LightColor::White),
            1 => Selection::Side(Side::Front),
            2 => Selection::Length(RunLength::Feet100),
            3 => Selection::Height(StoryHeight::AllOneStory),
            4 => Selection::RoofType(RoofType::Shingles),
            _ => Selection::RoofPitch(RoofPitch::Standard),
        }
    }

    async fn walk_to_last_step(
        controller: &WizardController<ScriptedPricingService>,
        session: &mut WizardSession,
    ) {
        for step in 0..STEP_COUNT - 1 {
            controller.select_option(session, selection_for(step));
            controller.advance(session).await.expect("step should advance");
        }
        controller.select_option(session, selection_for(STEP_COUNT - 1));
        assert!(session.is_last_step());
    }

    #[tokio::test]
    async fn advancing_an_empty_step_is_rejected_on_every_step() {
        let controller = WizardController::new(ScriptedPricingService::quoting(Decimal::ONE));
        let mut session = WizardSession::new();

        for step in 0..STEP_COUNT {
            assert_eq!(session.step_index(), step);
            let error = controller.advance(&mut session).await.expect_err("empty step must fail");
            assert_eq!(
                error.validation().map(|e| e.missing_fields.clone()),
                Some(vec![STEPS[step].field])
            );
            assert_eq!(session.step_index(), step);
            assert_eq!(session.validation_error(), Some("This field is required"));

            controller.select_option(&mut session, selection_for(step));
            if step + 1 < STEP_COUNT {
                controller.advance(&mut session).await.expect("filled step advances");
                assert_eq!(session.validation_error(), None);
            }
        }
        assert!(controller.pricing().requests().is_empty());
    }

    #[tokio::test]
    async fn side_toggles_keep_sides_chosen_an_odd_number_of_times() {
        let controller = WizardController::new(ScriptedPricingService::default());
        let mut session = WizardSession::new();
        let toggles = [Side::Front, Side::Left, Side::Front, Side::Right, Side::Left, Side::Left];

        for side in toggles {
            controller.select_option(&mut session, Selection::Side(side));
        }

        let expected: Vec<Side> = Side::ALL
            .iter()
            .copied()
            .filter(|side| toggles.iter().filter(|toggled| *toggled == side).count() % 2 == 1)
            .collect();
        assert_eq!(session.answers().sides.iter().copied().collect::<Vec<_>>(), expected);
        assert_eq!(session.step_index(), 0);
    }

    #[tokio::test]
    async fn retreat_then_advance_returns_to_the_same_step() {
        let controller = WizardController::new(ScriptedPricingService::default());
        let mut session = WizardSession::new();
        for step in 0..3 {
            controller.select_option(&mut session, selection_for(step));
            controller.advance(&mut session).await.expect("advance");
        }
        assert_eq!(session.step_index(), 3);

        assert!(controller.retreat(&mut session));
        assert_eq!(session.step_index(), 2);
        controller.select_option(&mut session, selection_for(2));
        let moved = controller.advance(&mut session).await.expect("advance again");

        assert_eq!(moved, Advance::Moved { from: 2, to: 3 });
        assert_eq!(session.step_index(), 3);
    }

    #[test]
    fn retreat_on_the_first_step_is_a_no_op() {
        let controller = WizardController::new(ScriptedPricingService::default());
        let mut session = WizardSession::new();

        assert!(!controller.retreat(&mut session));
        assert_eq!(session.step_index(), 0);
    }

    #[tokio::test]
    async fn selecting_the_same_scalar_twice_changes_nothing() {
        let controller = WizardController::new(ScriptedPricingService::default());
        let mut session = WizardSession::new();

        controller.select_option(&mut session, Selection::RoofType(RoofType::Wood));
        let once = session.clone();
        controller.select_option(&mut session, Selection::RoofType(RoofType::Wood));

        assert_eq!(session, once);
    }

    #[tokio::test]
    async fn final_advance_requests_a_quote_and_hands_off_a_copy() {
        let pricing = ScriptedPricingService::quoting(Decimal::new(12_345, 1));
        let controller = WizardController::new(pricing.clone());
        let mut session = WizardSession::new();
        walk_to_last_step(&controller, &mut session).await;

        let advance = controller.advance(&mut session).await.expect("quote succeeds");
        let Advance::Quoted(handoff) = advance else {
            panic!("last step should produce a quote");
        };

        assert_eq!(handoff.quote.amount, Decimal::new(12_345, 1));
        assert_eq!(session.quote().map(|quote| quote.amount), Some(Decimal::new(12_345, 1)));
        assert_eq!(session.phase(), SessionPhase::Quoted);
        assert!(!session.is_loading());
        assert_eq!(pricing.requests(), vec![session.answers().clone()]);

        controller.select_option(&mut session, Selection::Color(LightColor::Blue));
        assert_eq!(handoff.answers.color, Some(LightColor::White));
    }

    #[tokio::test]
    async fn pricing_failure_keeps_the_last_step_and_allows_retry() {
        let pricing = ScriptedPricingService::new(vec![
            Err(ServiceError::Status(502)),
            Ok(crate::services::QuoteResponse { quote: Decimal::new(450, 0) }),
        ]);
        let controller = WizardController::new(pricing.clone());
        let mut session = WizardSession::new();
        walk_to_last_step(&controller, &mut session).await;

        let error = controller.advance(&mut session).await.expect_err("pricing fails");
        assert!(matches!(error, ApplicationError::QuoteRequest(_)));
        assert!(!session.is_loading());
        assert_eq!(session.phase(), SessionPhase::Collecting);
        assert_eq!(session.step_index(), STEP_COUNT - 1);
        assert_eq!(session.validation_error(), Some("Failed to calculate price. Please try again."));
        assert_eq!(session.quote(), None);

        let retried = controller.advance(&mut session).await.expect("retry succeeds");
        assert!(matches!(retried, Advance::Quoted(_)));
        assert_eq!(session.validation_error(), None);
        assert_eq!(pricing.requests().len(), 2);
    }

    #[tokio::test]
    async fn incomplete_answers_never_reach_the_pricing_service() {
        let pricing = ScriptedPricingService::quoting(Decimal::ONE);
        let controller = WizardController::new(pricing.clone());
        let mut session = WizardSession::new();
        walk_to_last_step(&controller, &mut session).await;
        controller.select_option(&mut session, Selection::Side(Side::Front));

        let error = controller.submit_for_quote(&mut session).await.expect_err("sides missing");

        assert_eq!(error.validation().map(|e| e.missing_fields.clone()), Some(vec![Field::Sides]));
        assert_eq!(session.validation_error(), Some("Please fill in all fields."));
        assert_eq!(session.phase(), SessionPhase::Collecting);
        assert!(pricing.requests().is_empty());
    }

    #[tokio::test]
    async fn quote_cannot_be_requested_before_the_final_step() {
        let pricing = ScriptedPricingService::quoting(Decimal::ONE);
        let controller = WizardController::new(pricing.clone());
        let mut session = WizardSession::new();

        let error = controller.submit_for_quote(&mut session).await.expect_err("not last step");

        assert!(matches!(error, ApplicationError::Domain(DomainError::InvariantViolation(_))));
        assert!(pricing.requests().is_empty());
    }

    #[tokio::test]
    async fn quoted_session_rejects_a_second_quote_until_restarted() {
        let pricing = ScriptedPricingService::quoting(Decimal::new(450, 0));
        let sink = InMemoryAuditSink::default();
        let controller =
            WizardController::new(pricing.clone()).with_audit_sink(Arc::new(sink.clone()));
        let mut session = WizardSession::new();
        walk_to_last_step(&controller, &mut session).await;
        controller.advance(&mut session).await.expect("first quote");

        let error = controller.advance(&mut session).await.expect_err("already quoted");
        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::FlowTransition(
                FlowTransitionError::InvalidTransition { phase: SessionPhase::Quoted, .. }
            ))
        ));
        assert!(!controller.retreat(&mut session));
        assert_eq!(pricing.requests().len(), 1);

        controller.restart(&mut session).expect("restart is accepted from any phase");
        assert_eq!(session.step_index(), 0);
        assert_eq!(session.phase(), SessionPhase::Collecting);
        assert!(session.answers().missing_fields().contains(&Field::Color));

        let types = sink.event_types();
        assert!(types.contains(&"quote.received".to_string()));
        assert!(types.contains(&"flow.transition_rejected".to_string()));
        assert_eq!(types.last().map(String::as_str), Some("flow.transition_applied"));
    }

    #[tokio::test]
    async fn custom_length_step_needs_a_typed_length() {
        let controller = WizardController::new(ScriptedPricingService::default());
        let mut session = WizardSession::new();
        for step in 0..2 {
            controller.select_option(&mut session, selection_for(step));
            controller.advance(&mut session).await.expect("advance");
        }

        controller.select_option(&mut session, Selection::Length(RunLength::Custom));
        let error = controller.advance(&mut session).await.expect_err("custom length missing");
        assert_eq!(
            error.validation().map(|e| e.missing_fields.clone()),
            Some(vec![Field::CustomLength])
        );
        assert_eq!(session.step_index(), 2);

        controller.select_option(&mut session, Selection::CustomLength("140".to_owned()));
        controller.advance(&mut session).await.expect("custom length accepted");
        assert_eq!(session.step_index(), 3);
        assert_eq!(session.answers().length_feet(), Some(140));
    }
}
