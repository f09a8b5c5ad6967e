use std::sync::Arc;

use anyhow::Context;
use reqwest::Client;

use crate::Result;

#[derive(Debug)]
pub struct ProxyState {
    backend_url: String,
    client: Client,
}

impl ProxyState {
    pub fn new(backend_url: &str) -> Result<Arc<Self>> {
        let client = Client::builder()
            .build()
            .context("Failed to build backend client")?;

        Ok(Arc::new(Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            client,
        }))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Full backend URL for a path relative to the configured base
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.backend_url, path.trim_start_matches('/'))
    }
}
