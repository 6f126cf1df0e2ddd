use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::ConnectionArgs;
use crate::http::GatewayOptions;

/// Settings of the `[client]` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub socks5_proxy: Option<String>,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub status_retry_attempts: u32,
    pub status_retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:37127/".to_string(),
            socks5_proxy: Some("127.0.0.1:9050".to_string()),
            max_retries: 3,
            timeout_secs: 30,
            status_retry_attempts: 2,
            status_retry_delay_ms: 1000,
        }
    }
}

impl ClientConfig {
    pub fn base_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.base_url).with_context(|| format!("Invalid base URL: {}", self.base_url))
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            max_retries: self.max_retries,
            timeout: Duration::from_secs(self.timeout_secs),
            socks5_proxy: self.socks5_proxy.clone().filter(|p| !p.trim().is_empty()),
            status_retry_attempts: self.status_retry_attempts,
            status_retry_delay: Duration::from_millis(self.status_retry_delay_ms),
        }
    }

    pub fn apply_args(&mut self, args: &ConnectionArgs) {
        if let Some(base_url) = &args.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(proxy) = &args.socks5_proxy {
            self.socks5_proxy = Some(proxy.clone());
        }
        if args.no_proxy {
            self.socks5_proxy = None;
        }
    }
}
