// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Scripted in-memory transport for tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use crate::error::Result;
use crate::transport::{ResponseMeta, Transport, TransportResponse};

#[derive(Clone)]
struct Route {
    status: u16,
    location: Option<String>,
    body: Bytes,
}

/// Transport answering from a fixed route table and counting requests.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: HashMap<String, Route>,
    requests: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ok(mut self, url: &str, body: &'static str) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                status: 200,
                location: None,
                body: Bytes::from_static(body.as_bytes()),
            },
        );
        self
    }

    pub(crate) fn redirect(mut self, url: &str, status: u16, location: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                status,
                location: Some(location.to_string()),
                body: Bytes::new(),
            },
        );
        self
    }

    pub(crate) fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                status,
                location: None,
                body: Bytes::new(),
            },
        );
        self
    }

    /// Delay every response, to let concurrent callers pile up.
    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let route = self.routes.get(url.as_str()).cloned().unwrap_or(Route {
            status: 404,
            location: None,
            body: Bytes::new(),
        });

        let mut headers = BTreeMap::new();
        if let Some(location) = route.location {
            headers.insert("location".to_string(), location);
        }
        Ok(TransportResponse {
            meta: ResponseMeta {
                url: url.to_string(),
                status: route.status,
                headers,
            },
            body: route.body,
        })
    }
}
