// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Cached fetching of remote modules.

use bytes::Bytes;
use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

use crate::cache::FetchCache;
use crate::config::DEFAULT_MAX_REDIRECTS;
use crate::error::{PluginError, Result};
use crate::transport::{ResponseMeta, Transport};

/// Hook called with each URL right before it is requested from the network.
pub type OnFetch = Arc<dyn Fn(&str) + Send + Sync>;

/// Contents of a fetched URL.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub contents: Bytes,
    /// Final response, present only when this call went to the network
    pub response: Option<ResponseMeta>,
}

/// The network side of a [`Fetcher`], owned by in-flight requests.
#[derive(Clone)]
struct Network {
    transport: Arc<dyn Transport>,
    on_fetch: Option<OnFetch>,
    max_redirects: usize,
}

/// Fetches URLs through a [`Transport`], memoizing bodies in a [`FetchCache`].
///
/// Redirects (301, 302, 307) are followed here. The body is cached under the
/// URL that was asked for, not the one it was finally served from.
#[derive(Clone)]
pub struct Fetcher {
    network: Network,
    cache: FetchCache,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, cache: FetchCache) -> Self {
        Self {
            network: Network {
                transport,
                on_fetch: None,
                max_redirects: DEFAULT_MAX_REDIRECTS,
            },
            cache,
        }
    }

    pub fn with_on_fetch(mut self, on_fetch: Option<OnFetch>) -> Self {
        self.network.on_fetch = on_fetch;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.network.max_redirects = max_redirects;
        self
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Fetch `url`, from the cache when possible.
    ///
    /// Concurrent calls for the same URL share one network request and all
    /// see its outcome. A failure is not cached; the next call tries again.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        let (slot, started) = self.cache.claim(url, || {
            let network = self.network.clone();
            let url = url.to_string();
            async move {
                network
                    .fetch(&url)
                    .await
                    .map(|(meta, body)| (body, Some(meta)))
                    .map_err(Arc::new)
            }
            .boxed()
            .shared()
        });

        if !started {
            if slot.peek().is_some() {
                debug!("Cache hit for {}", url);
            } else {
                debug!("Waiting on in-flight fetch of {}", url);
            }
        }

        match slot.clone().await {
            Ok((contents, response)) => Ok(Fetched {
                contents,
                response: if started { response } else { None },
            }),
            Err(err) => {
                self.cache.release(url, &slot);
                drop(slot);
                Err(PluginError::from_shared(err))
            }
        }
    }
}

impl Network {
    /// Request `url`, following redirects until a 200.
    async fn fetch(&self, url: &str) -> Result<(ResponseMeta, Bytes)> {
        let mut current = Url::parse(url).map_err(|e| PluginError::invalid_url(url, e))?;

        if let Some(on_fetch) = &self.on_fetch {
            on_fetch(url);
        }
        debug!("Fetching {}", url);

        let mut redirects = 0;
        loop {
            let response = self.transport.get(&current).await?;
            let status = response.meta.status;
            match status {
                200 => return Ok((response.meta, response.body)),
                301 | 302 | 307 => {
                    if redirects >= self.max_redirects {
                        return Err(PluginError::TooManyRedirects {
                            url: url.to_string(),
                            limit: self.max_redirects,
                        });
                    }
                    let location = response.meta.location().ok_or_else(|| {
                        PluginError::MissingLocation {
                            url: current.to_string(),
                            status,
                        }
                    })?;
                    let next = current
                        .join(location)
                        .map_err(|e| PluginError::invalid_url(location, e))?;
                    debug!("Redirecting {} -> {}", current, next);
                    current = next;
                    redirects += 1;
                }
                _ => {
                    return Err(PluginError::Status {
                        url: current.to_string(),
                        status,
                    });
                }
            }
        }
    }
}
