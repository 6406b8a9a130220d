use std::time::Duration;

use async_trait::async_trait;
use lightquote_core::config::{AppConfig, EndpointConfig};
use lightquote_core::domain::answers::AnswerRecord;
use lightquote_core::services::{
    CheckoutRequest, CheckoutResponse, CheckoutService, PricingService, QuoteResponse,
    ServiceError,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not build http client for `{url}`: {source}")]
    Build { url: String, source: reqwest::Error },
}

#[derive(Clone, Debug)]
struct Endpoint {
    client: Client,
    url: String,
    api_key: Option<SecretString>,
}

impl Endpoint {
    fn from_config(config: &EndpointConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| ClientError::Build { url: config.url.clone(), source })?;
        Ok(Self { client, url: config.url.clone(), api_key: config.api_key.clone() })
    }

    async fn post_json<B, R>(&self, operation: &'static str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(
            event_name = "client.request.started",
            operation,
            url = %self.url,
            "sending request"
        );

        let mut request = self.client.post(&self.url).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| {
            warn!(
                event_name = "client.request.transport_failed",
                operation,
                url = %self.url,
                error = %error,
                "request did not reach the service"
            );
            ServiceError::Transport(error.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "client.request.rejected",
                operation,
                url = %self.url,
                status = status.as_u16(),
                "service returned a non-success status"
            );
            return Err(ServiceError::Status(status.as_u16()));
        }

        let decoded = response.json::<R>().await.map_err(|error| {
            warn!(
                event_name = "client.response.decode_failed",
                operation,
                url = %self.url,
                error = %error,
                "could not decode service response"
            );
            ServiceError::Decode(error.to_string())
        })?;

        info!(
            event_name = "client.request.completed",
            operation,
            url = %self.url,
            status = status.as_u16(),
            "service request completed"
        );
        Ok(decoded)
    }
}

/// Posts the answer record to the pricing endpoint and reads `{ "quote": n }`.
#[derive(Clone, Debug)]
pub struct HttpPricingService {
    endpoint: Endpoint,
}

impl HttpPricingService {
    pub fn new(config: &EndpointConfig) -> Result<Self, ClientError> {
        Ok(Self { endpoint: Endpoint::from_config(config)? })
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(&config.pricing)
    }

    pub fn url(&self) -> &str {
        &self.endpoint.url
    }
}

#[async_trait]
impl PricingService for HttpPricingService {
    async fn quote(&self, answers: &AnswerRecord) -> Result<QuoteResponse, ServiceError> {
        self.endpoint.post_json("pricing.quote", answers).await
    }
}

#[derive(Clone, Debug)]
pub struct HttpCheckoutService {
    endpoint: Endpoint,
}

impl HttpCheckoutService {
    pub fn new(config: &EndpointConfig) -> Result<Self, ClientError> {
        Ok(Self { endpoint: Endpoint::from_config(config)? })
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(&config.checkout)
    }

    pub fn url(&self) -> &str {
        &self.endpoint.url
    }
}

#[async_trait]
impl CheckoutService for HttpCheckoutService {
    async fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResponse, ServiceError> {
        self.endpoint.post_json("checkout.submit", request).await
    }
}
