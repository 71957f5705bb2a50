//! HTTP client for the exported graph document and session list.

use crate::graph::types::GraphDocument;
use reqwest::blocking::Client;
use std::time::Duration;

const DEFAULT_BASE: &str = "http://127.0.0.1:8080";

pub struct DataClient {
    client: Client,
    base_url: String,
}

impl DataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Base URL from `MIXGRAPH_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        let base = std::env::var("MIXGRAPH_URL").unwrap_or_else(|_| DEFAULT_BASE.to_string());
        Self::new(base)
    }

    /// Fetch the graph document. Callers treat failure as fatal: without a
    /// graph there is nothing to render.
    pub fn fetch_graph(&self) -> Result<GraphDocument, String> {
        let url = format!("{}/graph.json", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .map_err(|e| format!("request to {} failed: {}", url, e))?;

        if !resp.status().is_success() {
            return Err(format!("{} returned status {}", url, resp.status()));
        }

        resp.json()
            .map_err(|e| format!("malformed graph document: {}", e))
    }

    /// Fetch the newline-delimited session name list for the date picker.
    pub fn fetch_session_names(&self) -> Result<Vec<String>, String> {
        let url = format!("{}/session_names.txt", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .map_err(|e| format!("request to {} failed: {}", url, e))?;

        if !resp.status().is_success() {
            return Err(format!("{} returned status {}", url, resp.status()));
        }

        let text = resp
            .text()
            .map_err(|e| format!("failed to read session list: {}", e))?;
        Ok(parse_session_names(&text))
    }
}

/// Each non-blank trimmed line is one selectable session id.
pub fn parse_session_names(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
