use lightquote_core::audit::{AuditEvent, AuditOutcome, AuditSink};
use tracing::{info, warn, Level};

/// Writes every audit event as a structured log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    pub fn level_for(outcome: AuditOutcome) -> Level {
        match outcome {
            AuditOutcome::Success => Level::INFO,
            AuditOutcome::Rejected | AuditOutcome::Failed => Level::WARN,
        }
    }
}

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_default();

        if Self::level_for(event.outcome) == Level::INFO {
            info!(
                event_name = %event.event_type,
                event_id = %event.event_id,
                correlation_id = %event.correlation_id,
                session_id = %event.session_id,
                category = ?event.category,
                actor = %event.actor,
                metadata = %metadata,
                "audit event"
            );
        } else {
            warn!(
                event_name = %event.event_type,
                event_id = %event.event_id,
                correlation_id = %event.correlation_id,
                session_id = %event.session_id,
                category = ?event.category,
                outcome = ?event.outcome,
                actor = %event.actor,
                metadata = %metadata,
                "audit event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use lightquote_core::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
    use lightquote_core::domain::session::SessionId;
    use tracing::Level;

    use super::TracingAuditSink;

    #[test]
    fn failures_and_rejections_log_as_warnings() {
        assert_eq!(TracingAuditSink::level_for(AuditOutcome::Success), Level::INFO);
        assert_eq!(TracingAuditSink::level_for(AuditOutcome::Rejected), Level::WARN);
        assert_eq!(TracingAuditSink::level_for(AuditOutcome::Failed), Level::WARN);
    }

    #[test]
    fn emitting_without_a_subscriber_is_harmless() {
        let context = AuditContext::new(SessionId("S-1".to_owned()), "corr-1", "test");
        TracingAuditSink.emit(
            context
                .event("quote.failed", AuditCategory::Pricing, AuditOutcome::Failed)
                .with_metadata("error", "status 502"),
        );
    }
}
