//! Helpers shared by the gateway and the typed endpoint operations.
//!
//! This module holds the response classification primitives (building an
//! [`BackendError::UnexpectedStatus`] from a response, decoding a success body)
//! and the request path builders for the versioned backend API.
//!
//! Status matching itself is deliberately absent here: each operation decides
//! what a given non-success code means for its own endpoint.

use std::future::Future;

use reqwest::Response;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::error::{BackendError, HttpError};
use crate::BACKEND_MAJOR_VERSION;

/// Runs `fut`, giving up with [`HttpError::Cancelled`] if `cancel` fires first.
///
/// An already cancelled token wins over a ready future.
pub(crate) async fn cancellable<F>(cancel: Option<&CancellationToken>, fut: F) -> Result<F::Output, HttpError>
where
    F: Future,
{
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(HttpError::Cancelled),
                out = fut => Ok(out),
            }
        },
        None => Ok(fut.await),
    }
}

/// Consumes a response the operation does not accept and turns it into an error.
///
/// The body is kept verbatim. If it cannot be read the error carries an empty body.
pub(crate) async fn unexpected_status(response: Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    BackendError::UnexpectedStatus { status, body }
}

/// Reads a success body and decodes it as JSON.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let bytes = response.bytes().await.map_err(HttpError::from)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Prefixes `route` with the versioned API root, e.g. `/api/v3/btc/...`.
pub(crate) fn versioned_path(route: &str) -> String {
    format!("/api/v{}/{}", BACKEND_MAJOR_VERSION, route.trim_start_matches('/'))
}

/// Joins confirmation targets into the comma separated path segment the fees route expects.
pub(crate) fn join_targets(targets: &[u32]) -> String {
    targets.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
}

/// Wraps transaction hex in single quotes, the string literal form the broadcast route accepts.
pub(crate) fn quoted_hex(hex: &str) -> String {
    format!("'{}'", hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn versioned_path_uses_backend_major_version() {
        assert_eq!(
            versioned_path("btc/offchain/exchange-rates"),
            format!("/api/v{}/btc/offchain/exchange-rates", BACKEND_MAJOR_VERSION)
        );
        assert_eq!(versioned_path("/btc/x"), versioned_path("btc/x"));
    }

    #[test]
    fn join_targets_is_comma_separated() {
        assert_eq!(join_targets(&[2]), "2");
        assert_eq!(join_targets(&[2, 6, 144]), "2,6,144");
    }

    #[test]
    fn quoted_hex_uses_single_quotes() {
        assert_eq!(quoted_hex("0100"), "'0100'");
    }

    #[tokio::test]
    async fn cancellable_prefers_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();

        let result = cancellable(Some(&token), async { 42 }).await;

        assert!(matches!(result, Err(HttpError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellable_passes_output_through() {
        let token = CancellationToken::new();
        assert_eq!(cancellable(Some(&token), async { 7 }).await.unwrap(), 7);
        assert_eq!(cancellable(None, async { 8 }).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn cancellable_interrupts_pending_future() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            child.cancel();
        });

        let result = cancellable(Some(&token), tokio::time::sleep(Duration::from_secs(30))).await;

        assert!(matches!(result, Err(HttpError::Cancelled)));
    }
}
