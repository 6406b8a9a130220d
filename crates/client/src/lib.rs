//! HTTP adapters for the pricing and checkout services, plus an audit sink
//! that forwards wizard and order events to `tracing`.

pub mod audit;
pub mod http;

pub use audit::TracingAuditSink;
pub use http::{ClientError, HttpCheckoutService, HttpPricingService};
