use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::answers::AnswerRecord;
use crate::domain::session::SessionId;

/// Price returned by the pricing service. Read-only once received.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub amount: Decimal,
}

/// What a successful quote passes on to the order phase.
///
/// The answers are an owned copy; later edits to the wizard session do not
/// reach an order built from this hand-off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteHandoff {
    pub session_id: SessionId,
    pub quote: QuoteResult,
    pub answers: AnswerRecord,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderReceipt {
    pub session_id: SessionId,
    pub amount: Decimal,
    pub message: Option<String>,
}
