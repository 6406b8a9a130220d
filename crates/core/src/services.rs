//! Ports to the two remote collaborators: the pricing service that turns an
//! [`AnswerRecord`] into a quote, and the checkout service that records an
//! order. HTTP adapters live in `lightquote-client`; tests use in-process
//! fakes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::answers::AnswerRecord;
use crate::domain::customer::CustomerDetails;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("service responded with status {0}")]
    Status(u16),
    #[error("could not decode service response: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub quote: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub form_data: AnswerRecord,
    pub customer_details: CustomerDetails,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CheckoutResponse {
    /// A missing `success` flag counts as a failure.
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }
}

#[async_trait]
pub trait PricingService: Send + Sync {
    async fn quote(&self, answers: &AnswerRecord) -> Result<QuoteResponse, ServiceError>;
}

#[async_trait]
pub trait CheckoutService: Send + Sync {
    async fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResponse, ServiceError>;
}

/// Replays scripted pricing replies in order, repeating the last one, and
/// records every request it receives.
#[derive(Clone, Default)]
pub struct ScriptedPricingService {
    replies: Arc<Mutex<VecDeque<Result<QuoteResponse, ServiceError>>>>,
    requests: Arc<Mutex<Vec<AnswerRecord>>>,
}

impl ScriptedPricingService {
    pub fn new(replies: Vec<Result<QuoteResponse, ServiceError>>) -> Self {
        Self { replies: Arc::new(Mutex::new(replies.into())), requests: Arc::default() }
    }

    pub fn quoting(amount: Decimal) -> Self {
        Self::new(vec![Ok(QuoteResponse { quote: amount })])
    }

    pub fn requests(&self) -> Vec<AnswerRecord> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl PricingService for ScriptedPricingService {
    async fn quote(&self, answers: &AnswerRecord) -> Result<QuoteResponse, ServiceError> {
        lock(&self.requests).push(answers.clone());
        next_reply(&self.replies, "pricing")
    }
}

/// Checkout counterpart of [`ScriptedPricingService`].
#[derive(Clone, Default)]
pub struct ScriptedCheckoutService {
    replies: Arc<Mutex<VecDeque<Result<CheckoutResponse, ServiceError>>>>,
    requests: Arc<Mutex<Vec<CheckoutRequest>>>,
}

impl ScriptedCheckoutService {
    pub fn new(replies: Vec<Result<CheckoutResponse, ServiceError>>) -> Self {
        Self { replies: Arc::new(Mutex::new(replies.into())), requests: Arc::default() }
    }

    pub fn accepting() -> Self {
        Self::new(vec![Ok(CheckoutResponse { success: Some(true), message: None })])
    }

    pub fn declining(message: impl Into<String>) -> Self {
        let response = CheckoutResponse { success: Some(false), message: Some(message.into()) };
        Self::new(vec![Ok(response)])
    }

    pub fn requests(&self) -> Vec<CheckoutRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl CheckoutService for ScriptedCheckoutService {
    async fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResponse, ServiceError> {
        lock(&self.requests).push(request.clone());
        next_reply(&self.replies, "checkout")
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn next_reply<T: Clone>(
    replies: &Mutex<VecDeque<Result<T, ServiceError>>>,
    service: &str,
) -> Result<T, ServiceError> {
    let mut replies = lock(replies);
    let reply = if replies.len() > 1 { replies.pop_front() } else { replies.front().cloned() };
    reply.unwrap_or_else(|| Err(ServiceError::Transport(format!("no scripted {service} reply"))))
}
