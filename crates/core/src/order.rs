use std::sync::Arc;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink, NullAuditSink};
use crate::domain::answers::AnswerRecord;
use crate::domain::customer::{ContactField, CustomerDetails};
use crate::domain::quote::{OrderReceipt, QuoteHandoff, QuoteResult};
use crate::domain::session::SessionId;
use crate::errors::ApplicationError;
use crate::flows::{FlowContext, FlowEngine, FlowEvent, LightingOrderFlow, SessionPhase};
use crate::services::{CheckoutRequest, CheckoutService};

const UNCONFIRMED_ORDER_MESSAGE: &str = "checkout service did not confirm the order";

/// Post-quote state: contact capture and the checkout call.
///
/// Only constructible from a [`QuoteHandoff`], so an order never exists
/// without a quote. Owns its own copy of the answers.
pub struct OrderSession<C> {
    checkout: C,
    engine: FlowEngine<LightingOrderFlow>,
    audit_sink: Arc<dyn AuditSink>,
    session_id: SessionId,
    answers: AnswerRecord,
    quote: QuoteResult,
    customer_details: CustomerDetails,
    phase: SessionPhase,
    last_error: Option<String>,
}

impl<C> OrderSession<C>
where
    C: CheckoutService,
{
    pub fn new(handoff: QuoteHandoff, checkout: C) -> Self {
        Self {
            checkout,
            engine: FlowEngine::default(),
            audit_sink: Arc::new(NullAuditSink),
            session_id: handoff.session_id,
            answers: handoff.answers,
            quote: handoff.quote,
            customer_details: CustomerDetails::default(),
            phase: SessionPhase::Quoted,
            last_error: None,
        }
    }

    pub fn with_audit_sink(mut self, audit_sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = audit_sink;
        self
    }

    pub fn update_contact_field(&mut self, field: ContactField, value: impl Into<String>) {
        self.customer_details.set(field, value);
    }

    /// Places the order. On failure the session goes back to `Quoted` with
    /// contact details intact, so the same call can be retried.
    pub async fn submit_order(&mut self) -> Result<OrderReceipt, ApplicationError> {
        let audit = AuditContext::new(self.session_id.clone(), self.session_id.0.clone(), "order");
        let requested = self.engine.apply_with_audit(
            self.phase,
            FlowEvent::OrderRequested,
            &FlowContext::default(),
            self.audit_sink.as_ref(),
            &audit,
        )?;
        self.phase = requested.to;

        let request = CheckoutRequest {
            form_data: self.answers.clone(),
            customer_details: self.customer_details.clone(),
            amount: self.quote.amount,
        };
        let outcome = match self.checkout.checkout(&request).await {
            Ok(response) if response.is_success() => Ok(response.message),
            Ok(response) => {
                Err(response.message.unwrap_or_else(|| UNCONFIRMED_ORDER_MESSAGE.to_owned()))
            }
            Err(error) => Err(error.to_string()),
        };

        let event =
            if outcome.is_ok() { FlowEvent::OrderConfirmed } else { FlowEvent::OrderFailed };
        let settled =
            self.engine.settle_with_audit(self.phase, event, self.audit_sink.as_ref(), &audit);
        match settled {
            Ok(phase) => self.phase = phase,
            Err(error) => {
                self.phase = SessionPhase::Quoted;
                return Err(error.into());
            }
        }

        match outcome {
            Ok(message) => {
                self.last_error = None;
                self.audit_sink.emit(
                    audit
                        .event("order.submitted", AuditCategory::Checkout, AuditOutcome::Success)
                        .with_metadata("amount", self.quote.amount.to_string()),
                );
                Ok(OrderReceipt {
                    session_id: self.session_id.clone(),
                    amount: self.quote.amount,
                    message,
                })
            }
            Err(reason) => {
                self.last_error = Some(reason.clone());
                self.audit_sink.emit(
                    audit
                        .event("order.failed", AuditCategory::Checkout, AuditOutcome::Failed)
                        .with_metadata("error", reason.clone()),
                );
                Err(ApplicationError::OrderSubmission(reason))
            }
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    pub fn quote(&self) -> QuoteResult {
        self.quote
    }

    pub fn customer_details(&self) -> &CustomerDetails {
        &self.customer_details
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_paid(&self) -> bool {
        self.phase == SessionPhase::Ordered
    }

    pub fn submission_in_flight(&self) -> bool {
        self.phase == SessionPhase::OrderInFlight
    }

    /// Reason the most recent submission failed, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::OrderSession;
    use crate::audit::InMemoryAuditSink;
    use crate::domain::answers::{
        AnswerRecord, LightColor, RoofPitch, RoofType, RunLength, Selection, Side, StoryHeight,
    };
    use crate::domain::customer::ContactField;
    use crate::domain::quote::{QuoteHandoff, QuoteResult};
    use crate::domain::session::SessionId;
    use crate::errors::{ApplicationError, DomainError};
    use crate::flows::{FlowTransitionError, SessionPhase};
    use crate::services::{
        CheckoutResponse, ScriptedCheckoutService, ScriptedPricingService, ServiceError,
    };
    use crate::wizard::{Advance, WizardController, WizardSession};

    fn handoff(amount: Decimal) -> QuoteHandoff {
        let mut answers = AnswerRecord::default();
        answers.apply(Selection::Color(LightColor::RedGreen));
        answers.apply(Selection::Side(Side::Left));
        answers.apply(Selection::Length(RunLength::Feet75));
        answers.apply(Selection::Height(StoryHeight::MostlyTwoStory));
        answers.apply(Selection::RoofType(RoofType::Metal));
        answers.apply(Selection::RoofPitch(RoofPitch::Low));
        QuoteHandoff {
            session_id: SessionId("S-order".to_owned()),
            quote: QuoteResult { amount },
            answers,
        }
    }

    fn fill_contact<C: crate::services::CheckoutService>(order: &mut OrderSession<C>) {
        order.update_contact_field(ContactField::Name, "A");
        order.update_contact_field(ContactField::Email, "a@x.com");
        order.update_contact_field(ContactField::Phone, "+15551234567");
    }

    #[tokio::test]
    async fn full_scenario_ends_paid() {
        let pricing = ScriptedPricingService::quoting(Decimal::new(450, 0));
        let checkout = ScriptedCheckoutService::accepting();
        let controller = WizardController::new(pricing);
        let mut session = WizardSession::new();

        let selections = [
            Selection::Color(LightColor::White),
            Selection::Side(Side::Front),
            Selection::Side(Side::Back),
            Selection::Length(RunLength::Feet100),
            Selection::Height(StoryHeight::AllOneStory),
            Selection::RoofType(RoofType::Shingles),
            Selection::RoofPitch(RoofPitch::Standard),
        ];
        let mut handoff = None;
        for selection in selections {
            let advance_after = !matches!(selection, Selection::Side(Side::Front));
            controller.select_option(&mut session, selection);
            if advance_after {
                if let Advance::Quoted(quoted) =
                    controller.advance(&mut session).await.expect("advance")
                {
                    handoff = Some(quoted);
                }
            }
        }
        let handoff = handoff.expect("final step should quote");
        assert_eq!(handoff.quote.amount, Decimal::new(450, 0));

        let mut order = OrderSession::new(handoff, checkout.clone());
        fill_contact(&mut order);
        let receipt = order.submit_order().await.expect("checkout accepts");

        assert!(order.is_paid());
        assert!(!order.submission_in_flight());
        assert_eq!(receipt.amount, Decimal::new(450, 0));

        let sent = checkout.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].amount, Decimal::new(450, 0));
        assert_eq!(sent[0].customer_details.phone, "+15551234567");
        assert_eq!(sent[0].form_data.sides.len(), 2);
    }

    #[tokio::test]
    async fn declined_checkout_leaves_order_unpaid_and_retryable() {
        let checkout = ScriptedCheckoutService::new(vec![
            Ok(CheckoutResponse { success: Some(false), message: Some("card declined".to_owned()) }),
            Ok(CheckoutResponse { success: Some(true), message: Some("thanks".to_owned()) }),
        ]);
        let mut order = OrderSession::new(handoff(Decimal::new(9_950, 2)), checkout.clone());
        fill_contact(&mut order);

        let error = order.submit_order().await.expect_err("declined");
        assert_eq!(error, ApplicationError::OrderSubmission("card declined".to_owned()));
        assert!(!order.is_paid());
        assert!(!order.submission_in_flight());
        assert_eq!(order.phase(), SessionPhase::Quoted);
        assert_eq!(order.last_error(), Some("card declined"));
        assert_eq!(order.customer_details().email, "a@x.com");

        let receipt = order.submit_order().await.expect("manual retry succeeds");
        assert_eq!(receipt.message.as_deref(), Some("thanks"));
        assert!(order.is_paid());
        assert_eq!(order.last_error(), None);
        assert_eq!(checkout.requests().len(), 2);
    }

    #[tokio::test]
    async fn missing_success_flag_and_transport_errors_are_failures() {
        let missing_flag = ScriptedCheckoutService::new(vec![Ok(CheckoutResponse::default())]);
        let mut order = OrderSession::new(handoff(Decimal::ONE), missing_flag);
        let error = order.submit_order().await.expect_err("no success flag");
        assert_eq!(
            error,
            ApplicationError::OrderSubmission("checkout service did not confirm the order".into())
        );
        assert!(!order.is_paid());

        let unreachable = ScriptedCheckoutService::new(vec![Err(ServiceError::Transport(
            "connection refused".to_owned(),
        ))]);
        let mut order = OrderSession::new(handoff(Decimal::ONE), unreachable);
        let error = order.submit_order().await.expect_err("transport failure");
        assert!(matches!(
            error,
            ApplicationError::OrderSubmission(ref reason) if reason.contains("connection refused")
        ));
        assert!(!order.is_paid());
        assert!(!order.submission_in_flight());
    }

    #[tokio::test]
    async fn paid_order_rejects_a_duplicate_submission() {
        let checkout = ScriptedCheckoutService::accepting();
        let sink = InMemoryAuditSink::default();
        let mut order = OrderSession::new(handoff(Decimal::new(450, 0)), checkout.clone())
            .with_audit_sink(Arc::new(sink.clone()));
        order.submit_order().await.expect("first order");

        let error = order.submit_order().await.expect_err("duplicate order");
        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::FlowTransition(
                FlowTransitionError::InvalidTransition { phase: SessionPhase::Ordered, .. }
            ))
        ));
        assert_eq!(checkout.requests().len(), 1);
        assert!(sink.event_types().contains(&"order.submitted".to_string()));
    }

    #[test]
    fn order_keeps_its_own_copy_of_the_answers() {
        let handoff = handoff(Decimal::new(300, 0));
        let original = handoff.answers.clone();
        let order = OrderSession::new(handoff, ScriptedCheckoutService::accepting());

        assert_eq!(order.answers(), &original);
        assert_eq!(order.quote().amount, Decimal::new(300, 0));
        assert_eq!(order.phase(), SessionPhase::Quoted);
        assert_eq!(order.session_id().0, "S-order");
    }
}
