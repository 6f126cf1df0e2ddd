//! HTTP client module for the anonymized backend API.
//!
//! This module provides the request/response core used to talk to the
//! backend: a transport gateway that retries over an unreliable anonymizing
//! proxy, per-operation status classification, and typed decoding of the
//! responses.
//!
//! # Architecture
//!
//! - [`BackendHttpClient`] - One method per backend capability (filters, fees,
//!   broadcast, exchange rates, versions, compatibility check)
//! - [`GatewayOptions`] - Proxy, timeout and retry settings of the gateway
//! - [`HttpError`] / [`BackendError`] - Gateway and operation errors
//! - Response types ([`FiltersResponse`], [`FeeEstimationPair`], [`ExchangeRate`],
//!   [`VersionsResponse`])
//!
//! # Retries
//!
//! Two retry layers sit in the gateway and nowhere else:
//!
//! - **Transient failures**: connection errors and transient statuses are
//!   retried with exponential backoff by the middleware
//! - **Status mismatch**: idempotent queries are re-sent a fixed number of
//!   times while the status differs from `200`; the last response is then
//!   classified by the operation
//!
//! Broadcasts skip the status-mismatch layer.
//!
//! # Example
//!
//! ```rust,no_run
//! use url::Url;
//! use backend_client::http::BackendHttpClient;
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let client = BackendHttpClient::new(Url::parse("http://localhost:37127")?)?;
//!
//! for rate in client.get_exchange_rates().await? {
//!     println!("{}: {}", rate.ticker, rate.rate);
//! }
//! # Ok(())
//! # }
//! ```

mod backend_http_client;
mod error;
mod http_client;
mod types;
mod utils;

pub use backend_http_client::BackendHttpClient;
pub use error::{BackendError, HttpError};
pub use http_client::GatewayOptions;
pub use types::{ExchangeRate, FeeEstimationPair, FiltersResponse, VersionsResponse};
