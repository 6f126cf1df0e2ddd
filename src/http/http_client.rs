use std::time::{Duration, Instant};

use log::debug;
use reqwest::{Method, Response, StatusCode, header::CONTENT_TYPE};
use reqwest_retry::{Retryable, RetryableStrategy, default_on_request_failure};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::HttpError;
use super::utils::cancellable;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_STATUS_RETRY_ATTEMPTS: u32 = 2;
const DEFAULT_STATUS_RETRY_DELAY_MS: u64 = 1000;

/// Settings for the transport gateway.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Retries of transient connection failures, handled by the middleware.
    pub max_retries: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// SOCKS5 proxy (`host:port`) every request is routed through.
    pub socks5_proxy: Option<String>,
    /// Total sends made by `send_and_retry` while the status does not match.
    pub status_retry_attempts: u32,
    /// Pause between those sends.
    pub status_retry_delay: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            socks5_proxy: None,
            status_retry_attempts: DEFAULT_STATUS_RETRY_ATTEMPTS,
            status_retry_delay: Duration::from_millis(DEFAULT_STATUS_RETRY_DELAY_MS),
        }
    }
}

/// Retries a request only when no response arrived at all.
///
/// Any received response, 5xx included, goes back to the caller untouched.
struct ConnectionFailuresOnly;

impl RetryableStrategy for ConnectionFailuresOnly {
    fn handle(&self, res: &Result<Response, reqwest_middleware::Error>) -> Option<Retryable> {
        match res {
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}

/// Transport gateway to the backend.
///
/// Sends requests through the configured proxy and hands back the raw
/// [`Response`] whatever its status. Interpreting the status is left to the
/// caller.
pub(crate) struct HttpClient {
    base_url: Url,
    client: reqwest_middleware::ClientWithMiddleware,
    status_retry_attempts: u32,
    status_retry_delay: Duration,
    last_latency: RwLock<Option<(Duration, Instant)>>,
}

impl HttpClient {
    pub fn with_options(base_url: Url, options: GatewayOptions) -> Result<Self, anyhow::Error> {
        let retry_policy =
            reqwest_retry::policies::ExponentialBackoff::builder().build_with_max_retries(options.max_retries);

        let mut builder = reqwest::Client::builder().timeout(options.timeout);
        if let Some(proxy) = &options.socks5_proxy {
            // socks5h resolves hostnames on the proxy side, which onion addresses require.
            builder = builder.proxy(reqwest::Proxy::all(format!("socks5h://{}", proxy))?);
        }
        let inner_client = builder.build()?;

        let client = reqwest_middleware::ClientBuilder::new(inner_client)
            .with(reqwest_retry::RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                ConnectionFailuresOnly,
            ))
            .build();

        Ok(Self {
            base_url,
            client,
            status_retry_attempts: options.status_retry_attempts.max(1),
            status_retry_delay: options.status_retry_delay,
            last_latency: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends a single request and returns the response regardless of status.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Response, HttpError> {
        let start = Instant::now();
        let url = self.base_url.join(path)?;

        let req = match method {
            Method::GET => self.client.get(url),
            Method::POST => {
                let req = self.client.post(url);
                if let Some(body) = body {
                    req.body(body).header(CONTENT_TYPE, "application/json")
                } else {
                    req
                }
            },
            _ => return Err(HttpError::UnsupportedMethod),
        };

        let resp = cancellable(cancel, req.send()).await??;
        let latency = start.elapsed();
        self.update_latency(latency).await;

        debug!(
            path = path,
            status = resp.status().as_u16(),
            latency_ms = latency.as_millis() as u64;
            "HTTP: Response received"
        );

        Ok(resp)
    }

    /// Sends a request, re-sending while the status differs from `expected`.
    ///
    /// Gives up after the configured number of attempts and returns the last
    /// response, so a persistent non-matching status still reaches the caller.
    pub async fn send_and_retry(
        &self,
        method: Method,
        expected: StatusCode,
        path: &str,
        body: Option<String>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Response, HttpError> {
        let mut attempt = 1;
        loop {
            let resp = self.send(method.clone(), path, body.clone(), cancel).await?;
            if resp.status() == expected || attempt >= self.status_retry_attempts {
                return Ok(resp);
            }

            debug!(
                path = path,
                status = resp.status().as_u16(),
                attempt = attempt;
                "HTTP: Unexpected status, retrying"
            );
            drop(resp);

            cancellable(cancel, tokio::time::sleep(self.status_retry_delay)).await?;
            attempt += 1;
        }
    }

    async fn update_latency(&self, duration: Duration) {
        *self.last_latency.write().await = Some((duration, Instant::now()));
    }

    pub async fn get_latency(&self) -> Option<Duration> {
        self.last_latency.read().await.map(|(d, _)| d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer, attempts: u32) -> HttpClient {
        let options = GatewayOptions {
            max_retries: 0,
            status_retry_attempts: attempts,
            status_retry_delay: Duration::from_millis(10),
            ..GatewayOptions::default()
        };
        HttpClient::with_options(Url::parse(&server.uri()).unwrap(), options).unwrap()
    }

    #[tokio::test]
    async fn test_send_returns_non_success_status_without_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server, 1);
        let resp = client.send(Method::GET, "/missing", None, None).await.unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.text().await.unwrap(), "nope");
        assert!(client.get_latency().await.is_some());
    }

    #[tokio::test]
    async fn test_send_keeps_query_string_and_posts_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/q"))
            .and(query_param("a", "1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/p"))
            .and(header("Content-Type", "application/json"))
            .and(body_string("'abc'"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server, 1);
        let get = client.send(Method::GET, "/q?a=1", None, None).await.unwrap();
        let post = client
            .send(Method::POST, "/p", Some("'abc'".to_string()), None)
            .await
            .unwrap();

        assert_eq!(get.status(), StatusCode::OK);
        assert_eq!(post.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_server_errors_are_not_retried_by_middleware() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/p"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client =
            HttpClient::with_options(Url::parse(&mock_server.uri()).unwrap(), GatewayOptions::default()).unwrap();
        let start = Instant::now();
        let resp = client
            .send(Method::POST, "/p", Some("'00'".to_string()), None)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.text().await.unwrap(), "busy");
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_send_rejects_unsupported_method() {
        let mock_server = MockServer::start().await;
        let client = test_client(&mock_server, 1);

        let result = client.send(Method::DELETE, "/x", None, None).await;

        assert!(matches!(result, Err(HttpError::UnsupportedMethod)));
    }

    #[tokio::test]
    async fn test_send_and_retry_resends_until_attempts_exhausted() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(204))
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server, 3);
        let resp = client
            .send_and_retry(Method::GET, StatusCode::OK, "/flaky", None, None)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_send_and_retry_stops_on_expected_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server, 5);
        let resp = client
            .send_and_retry(Method::GET, StatusCode::OK, "/ok", None, None)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cancelled_token_fails_fast() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server, 1);
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            child.cancel();
        });

        let start = Instant::now();
        let result = client.send(Method::GET, "/slow", None, Some(&token)).await;

        assert!(matches!(result, Err(HttpError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
