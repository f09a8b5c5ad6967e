use bytes::Bytes;
use log::debug;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use serde_json::Value;

use gfg_stats_logic::{
    ProblemsResponse, ProfileResponse, StatsResponse, StatsSource, prelude::*,
};

const fn proxy_host() -> &'static str {
    if let Some(host) = option_env!("GFG_PROXY_HOST") {
        host
    } else {
        "127.0.0.1"
    }
}

const fn proxy_port() -> u16 {
    if let Some(port) = option_env!("GFG_PROXY_PORT") {
        const_str::parse!(port, u16)
    } else {
        3000
    }
}

const fn proxy_secure() -> bool {
    if let Some(secure) = option_env!("GFG_PROXY_SECURE") {
        const_str::eq_ignore_ascii_case!(secure, "true") || const_str::equal!(secure, "1")
    } else {
        false
    }
}

const fn proxy_proto() -> &'static str {
    if proxy_secure() { "https" } else { "http" }
}

const PROXY_HOST: &str = proxy_host();
const PROXY_PORT: u16 = proxy_port();
const PROXY_PROTO: &str = proxy_proto();

/// Proxy origin baked in at build time from `GFG_PROXY_HOST`, `GFG_PROXY_PORT` and
/// `GFG_PROXY_SECURE`
pub const DEFAULT_PROXY_URL: &str =
    const_str::concat!(PROXY_PROTO, "://", PROXY_HOST, ":", PROXY_PORT);

/// Talks to the `/api` routes of a running proxy
#[derive(Debug, Clone)]
pub struct ProxyClient {
    origin: Url,
    client: Client,
}

impl ProxyClient {
    pub fn new(origin: &str) -> Result<Self> {
        let origin = Url::parse(origin).with_context(|| format!("Invalid proxy URL {origin}"))?;
        if origin.cannot_be_a_base() {
            bail!("Proxy URL {origin} can't be used as a base");
        }
        let client = Client::builder().build()?;
        Ok(Self { origin, client })
    }

    pub fn origin(&self) -> &str {
        self.origin.as_str().trim_end_matches('/')
    }

    fn api_url(&self, endpoint: &str, username: &str) -> Url {
        let mut url = self.origin.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", endpoint, username]);
        }
        url
    }

    async fn get_json(&self, endpoint: &str, username: &str) -> Result<Value> {
        let url = self.api_url(endpoint, username);
        debug!("GET {url}");
        self.client
            .get(url)
            .send()
            .await
            .context("Could not send request")?
            .error_for_status()
            .context("Proxy returned error")?
            .json()
            .await
            .context("Proxy returned invalid JSON")
    }

    /// Download the embeddable SVG stats card
    pub async fn stats_card(&self, username: &str) -> Result<Bytes> {
        let mut url = self.api_url("stats", username);
        url.set_query(Some("format=svg"));
        debug!("GET {url}");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("Could not send request")?
            .error_for_status()
            .context("Proxy returned error")?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !content_type.contains("image/svg+xml") {
            bail!("Expected an SVG card, got {content_type:?}");
        }

        resp.bytes().await.context("Failed to read SVG card")
    }
}

impl StatsSource for ProxyClient {
    async fn profile(&self, username: &str) -> Result<ProfileResponse> {
        self.get_json("profile", username).await.map(Into::into)
    }

    async fn stats(&self, username: &str) -> Result<StatsResponse> {
        self.get_json("stats", username).await.map(Into::into)
    }

    async fn problems(&self, username: &str) -> Result<ProblemsResponse> {
        self.get_json("problems", username).await.map(Into::into)
    }
}
