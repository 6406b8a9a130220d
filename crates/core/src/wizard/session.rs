use crate::domain::answers::AnswerRecord;
use crate::domain::quote::QuoteResult;
use crate::domain::session::SessionId;
use crate::flows::SessionPhase;
use crate::wizard::steps::{StepDescriptor, STEPS, STEP_COUNT};

/// State of one wizard run, owned by the caller and handed to
/// [`WizardController`](crate::wizard::WizardController) for every action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardSession {
    pub(crate) id: SessionId,
    pub(crate) step_index: usize,
    pub(crate) answers: AnswerRecord,
    pub(crate) validation_error: Option<String>,
    pub(crate) phase: SessionPhase,
    pub(crate) quote: Option<QuoteResult>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardSession {
    pub fn new() -> Self {
        Self::with_id(SessionId::generate())
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            step_index: 0,
            answers: AnswerRecord::default(),
            validation_error: None,
            phase: SessionPhase::Collecting,
            quote: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn current_step(&self) -> &'static StepDescriptor {
        &STEPS[self.step_index.min(STEP_COUNT - 1)]
    }

    pub fn is_last_step(&self) -> bool {
        self.step_index == STEP_COUNT - 1
    }

    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// True only while the quote request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::QuoteInFlight
    }

    pub fn quote(&self) -> Option<QuoteResult> {
        self.quote
    }

    pub(crate) fn reset(&mut self) {
        self.step_index = 0;
        self.answers = AnswerRecord::default();
        self.validation_error = None;
        self.phase = SessionPhase::Collecting;
        self.quote = None;
    }
}
