// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Network agent used by the fetcher.
//!
//! A [`Transport`] performs exactly one GET and never follows redirects;
//! redirect handling and caching live in [`crate::fetch`].

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, Proxy};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::{AgentOptions, FetchOptions};
use crate::error::{PluginError, Result};

/// Status line and headers of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    /// URL that produced this response
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Headers with lower-cased names
    pub headers: BTreeMap<String, String>,
}

impl ResponseMeta {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `Location` header.
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// The `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// A single response as seen by the fetcher.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub meta: ResponseMeta,
    pub body: Bytes,
}

/// Performs one HTTP GET without following redirects.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client from agent and fetch options.
    pub fn new(agent: &AgentOptions, fetch: &FetchOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &fetch.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| PluginError::Config(format!("header '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| PluginError::Config(format!("header '{}': {}", name, e)))?;
            headers.insert(name, value);
        }
        let user_agent = HeaderValue::from_str(&fetch.user_agent)
            .map_err(|e| PluginError::Config(format!("user agent: {}", e)))?;
        headers.insert(USER_AGENT, user_agent);

        let mut builder = Client::builder()
            .redirect(Policy::none())
            .default_headers(headers)
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(fetch.connect_timeout))
            .pool_max_idle_per_host(agent.pool_max_idle_per_host);

        if let Some(secs) = fetch.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = agent.tcp_keepalive {
            builder = builder.tcp_keepalive(Duration::from_secs(secs));
        }
        if let Some(ref proxy) = agent.proxy {
            builder = builder.proxy(Proxy::all(proxy.as_str())?);
        } else if !agent.system_proxy {
            builder = builder.no_proxy();
        }
        if !agent.strict_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Use a caller-configured client.
    ///
    /// The client should be built with `redirect::Policy::none()`; otherwise
    /// redirects are followed inside reqwest and never reach the fetcher.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let meta = ResponseMeta {
            url: url.to_string(),
            status,
            headers,
        };

        // Redirect and error bodies are discarded by the fetcher.
        let body = if status == 200 {
            response.bytes().await?
        } else {
            Bytes::new()
        };

        Ok(TransportResponse { meta, body })
    }
}
