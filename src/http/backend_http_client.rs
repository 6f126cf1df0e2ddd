//! Typed client for the backend REST API.
//!
//! This module provides the [`BackendHttpClient`] struct, one method per
//! backend capability. Every method builds its request, hands it to the
//! transport gateway, interprets the status code for its own endpoint and
//! decodes the body into a typed value.
//!
//! # Status handling
//!
//! | Operation | Success | Alternate outcome | Anything else |
//! |---|---|---|---|
//! | [`get_filters`](BackendHttpClient::get_filters) | `200` | `204` → `None` | error |
//! | [`get_fees`](BackendHttpClient::get_fees) | `200` | - | error |
//! | [`broadcast_hex`](BackendHttpClient::broadcast_hex) | `200` | - | error |
//! | [`get_exchange_rates`](BackendHttpClient::get_exchange_rates) | `200` | - | error |
//! | [`get_versions`](BackendHttpClient::get_versions) | `200` | `404` → [`ServerVersions::LEGACY`] | error |
//!
//! # Example
//!
//! ```rust,no_run
//! use url::Url;
//! use backend_client::http::{BackendHttpClient, GatewayOptions};
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let options = GatewayOptions {
//!     socks5_proxy: Some("127.0.0.1:9050".to_string()),
//!     ..GatewayOptions::default()
//! };
//! let client = BackendHttpClient::with_options(Url::parse("http://backend.onion")?, options)?;
//!
//! let report = client.check_updates().await?;
//! println!("{}", report.compatibility());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use bitcoin::{BlockHash, Transaction};
use log::{debug, info, warn};
use reqwest::{Method, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::BackendError;
use super::http_client::{GatewayOptions, HttpClient};
use super::types::{ExchangeRate, FeeEstimationPair, FiltersResponse, VersionsResponse};
use super::utils::{cancellable, join_targets, quoted_hex, read_json, unexpected_status, versioned_path};
use crate::log::mask_string;
use crate::models::{CompatibilityReport, LocalVersions, ServerVersions, SoftwareVersion};

const VERSIONS_PATH: &str = "/api/software/versions";

/// HTTP client for the backend, reached through an anonymizing proxy.
///
/// The client owns a single transport gateway for its whole lifetime. It holds
/// no per-call state, so one instance can be shared across tasks behind an
/// `Arc` and used concurrently.
pub struct BackendHttpClient {
    http_client: HttpClient,
    local_versions: LocalVersions,
}

impl BackendHttpClient {
    /// Creates a client with default gateway settings and no proxy.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be initialized.
    pub fn new(base_url: Url) -> Result<Self, anyhow::Error> {
        Self::with_options(base_url, GatewayOptions::default())
    }

    /// Creates a client with explicit gateway settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy address is invalid or the underlying HTTP
    /// client cannot be initialized.
    pub fn with_options(base_url: Url, options: GatewayOptions) -> Result<Self, anyhow::Error> {
        let http_client = HttpClient::with_options(base_url, options)?;
        Ok(Self {
            http_client,
            local_versions: LocalVersions::default(),
        })
    }

    /// Overrides the versions used by [`check_updates`](Self::check_updates).
    pub fn with_local_versions(mut self, local_versions: LocalVersions) -> Self {
        self.local_versions = local_versions;
        self
    }

    /// Returns the backend address as a string.
    pub fn get_address(&self) -> String {
        self.http_client.base_url().to_string()
    }

    /// Versions that [`check_updates`](Self::check_updates) compares against.
    pub fn local_versions(&self) -> &LocalVersions {
        &self.local_versions
    }

    /// Returns the round-trip time of the most recent exchange, if any.
    pub async fn get_last_request_latency(&self) -> Option<Duration> {
        self.http_client.get_latency().await
    }

    /// Fetches up to `count` filters following `best_known_block_hash`.
    ///
    /// Returns `Ok(None)` when the backend has nothing newer (`204`).
    ///
    /// # Cancellation
    ///
    /// If `cancel` fires before the body has been read, the call returns
    /// [`BackendError::Cancelled`] without decoding anything.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Transport`] if no response could be obtained
    /// - [`BackendError::UnexpectedStatus`] for any status other than `200`/`204`
    /// - [`BackendError::Parse`] if the body is not a filters payload
    pub async fn get_filters(
        &self,
        best_known_block_hash: &BlockHash,
        count: u32,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<FiltersResponse>, BackendError> {
        debug!(
            best_known_block_hash:% = best_known_block_hash,
            count = count;
            "HTTP: Requesting filters"
        );
        let path = versioned_path(&format!(
            "btc/blockchain/filters?bestKnownBlockHash={}&count={}",
            best_known_block_hash, count
        ));

        let response = self
            .http_client
            .send_and_retry(Method::GET, StatusCode::OK, &path, None, cancel)
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                debug!("HTTP: No new filters");
                Ok(None)
            },
            StatusCode::OK => {
                let filters: FiltersResponse = cancellable(cancel, read_json(response)).await??;
                debug!(
                    best_height = filters.best_height,
                    filters = filters.filters.len();
                    "HTTP: Filters received"
                );
                Ok(Some(filters))
            },
            _ => Err(unexpected_status(response).await),
        }
    }

    /// Fetches fee estimates for each confirmation target.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidArgument`] without sending anything if
    /// `confirmation_targets` is empty or contains `0`.
    pub async fn get_fees(
        &self,
        confirmation_targets: &[u32],
    ) -> Result<BTreeMap<u32, FeeEstimationPair>, BackendError> {
        if confirmation_targets.is_empty() {
            return Err(BackendError::InvalidArgument(
                "at least one confirmation target is required".to_string(),
            ));
        }
        if confirmation_targets.contains(&0) {
            return Err(BackendError::InvalidArgument(
                "confirmation targets must be positive".to_string(),
            ));
        }

        let targets = join_targets(confirmation_targets);
        debug!(targets = &*targets; "HTTP: Requesting fee estimates");
        let path = versioned_path(&format!("btc/blockchain/fees/{}", targets));

        let response = self
            .http_client
            .send_and_retry(Method::GET, StatusCode::OK, &path, None, None)
            .await?;
        if response.status() != StatusCode::OK {
            return Err(unexpected_status(response).await);
        }

        read_json(response).await
    }

    /// Broadcasts a transaction given as consensus-encoded hex.
    ///
    /// The request is sent once. Broadcasting is not idempotent: the backend
    /// may reject a repeated broadcast, and this method does nothing to
    /// prevent one.
    pub async fn broadcast_hex(&self, hex: &str) -> Result<(), BackendError> {
        info!(target: "audit", tx = &*mask_string(hex); "HTTP: Broadcasting transaction");

        let response = self
            .http_client
            .send(
                Method::POST,
                &versioned_path("btc/blockchain/broadcast"),
                Some(quoted_hex(hex)),
                None,
            )
            .await?;

        if response.status() != StatusCode::OK {
            let err = unexpected_status(response).await;
            warn!(target: "audit", error:% = err; "HTTP: Broadcast rejected");
            return Err(err);
        }

        info!(target: "audit", "HTTP: Transaction broadcast");
        Ok(())
    }

    /// Broadcasts `transaction`, serializing it to hex first.
    pub async fn broadcast(&self, transaction: &Transaction) -> Result<(), BackendError> {
        self.broadcast_hex(&bitcoin::consensus::encode::serialize_hex(transaction))
            .await
    }

    pub async fn get_exchange_rates(&self) -> Result<Vec<ExchangeRate>, BackendError> {
        debug!("HTTP: Requesting exchange rates");
        let response = self
            .http_client
            .send_and_retry(
                Method::GET,
                StatusCode::OK,
                &versioned_path("btc/offchain/exchange-rates"),
                None,
                None,
            )
            .await?;
        if response.status() != StatusCode::OK {
            return Err(unexpected_status(response).await);
        }

        read_json(response).await
    }

    /// Queries the versions the backend reports.
    ///
    /// A backend that answers `404` predates the endpoint; for those
    /// [`ServerVersions::LEGACY`] is returned instead of an error.
    pub async fn get_versions(&self) -> Result<ServerVersions, BackendError> {
        debug!("HTTP: Requesting software versions");
        let response = self
            .http_client
            .send_and_retry(Method::GET, StatusCode::OK, VERSIONS_PATH, None, None)
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                info!("Backend has no versions endpoint, assuming legacy server");
                Ok(ServerVersions::LEGACY)
            },
            StatusCode::OK => {
                let raw: VersionsResponse = read_json(response).await?;
                parse_versions(&raw)
            },
            _ => Err(unexpected_status(response).await),
        }
    }

    /// Compares this build's versions with the ones the backend reports.
    ///
    /// Each call is a fresh round trip; nothing is cached.
    pub async fn check_updates(&self) -> Result<CompatibilityReport, BackendError> {
        let reported = self.get_versions().await?;
        let report = CompatibilityReport::evaluate(&self.local_versions, &reported);

        if !report.is_fully_compatible() {
            warn!(
                local_client:% = self.local_versions.client_version,
                reported_client:% = reported.client_version,
                local_backend = self.local_versions.backend_major_version,
                reported_backend = reported.backend_major_version;
                "{}", report.compatibility()
            );
        }

        Ok(report)
    }

    /// Checks whether the backend answers at all.
    pub async fn is_backend_online(&self) -> bool {
        match self.get_versions().await {
            Ok(_) => {
                debug!("Backend is online");
                true
            },
            Err(e) => {
                warn!(
                    error:% = e;
                    "Backend is offline"
                );
                false
            },
        }
    }
}

fn parse_versions(raw: &VersionsResponse) -> Result<ServerVersions, BackendError> {
    let client_version: SoftwareVersion = raw.client_version.parse().map_err(BackendError::InvalidVersion)?;
    let backend_major_version = raw
        .backend_major_version
        .trim()
        .parse::<u32>()
        .map_err(|_| BackendError::InvalidVersion(raw.backend_major_version.clone()))?;

    Ok(ServerVersions {
        client_version,
        backend_major_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_versions_reads_both_fields() {
        let raw = VersionsResponse {
            client_version: "1.1.2".to_string(),
            backend_major_version: "3".to_string(),
        };
        let versions = parse_versions(&raw).unwrap();

        assert_eq!(versions.client_version, SoftwareVersion::with_build(1, 1, 2));
        assert_eq!(versions.backend_major_version, 3);
    }

    #[test]
    fn parse_versions_rejects_garbage() {
        let bad_client = VersionsResponse {
            client_version: "latest".to_string(),
            backend_major_version: "3".to_string(),
        };
        let bad_major = VersionsResponse {
            client_version: "1.0".to_string(),
            backend_major_version: "three".to_string(),
        };

        assert!(matches!(parse_versions(&bad_client), Err(BackendError::InvalidVersion(_))));
        assert!(matches!(parse_versions(&bad_major), Err(BackendError::InvalidVersion(_))));
    }
}
