// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host integration: the resolve and load hooks.

use async_trait::async_trait;
use bytes::Bytes;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::cache::FetchCache;
use crate::config::{AgentOptions, Config, FetchOptions};
use crate::error::{PluginError, Result};
use crate::fetch::{Fetcher, OnFetch};
use crate::loader::{self, Loader};
use crate::resolve::{NAMESPACE, ResolveArgs, ResolveResult, Resolver, UrlFilter};
use crate::scheme::SchemeRegistry;
use crate::transport::{HttpTransport, ResponseMeta, Transport};

/// Arguments of the host's load hook.
#[derive(Debug, Clone, Copy)]
pub struct LoadArgs<'a> {
    /// Resolved path
    pub path: &'a str,
    /// Namespace the path was resolved into
    pub namespace: &'a str,
}

impl<'a> LoadArgs<'a> {
    pub fn new(path: &'a str, namespace: &'a str) -> Self {
        Self { path, namespace }
    }
}

impl<'a> From<&'a ResolveResult> for LoadArgs<'a> {
    fn from(resolved: &'a ResolveResult) -> Self {
        Self {
            path: &resolved.path,
            namespace: &resolved.namespace,
        }
    }
}

/// Module contents handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub contents: Bytes,
    pub loader: Loader,
}

impl LoadResult {
    pub fn new(contents: impl Into<Bytes>, loader: Loader) -> Self {
        Self {
            contents: contents.into(),
            loader,
        }
    }

    /// Contents as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }
}

/// What an `on_load` override gets to look at.
#[derive(Debug)]
pub struct OnLoadContext<'a> {
    /// Resolved URL
    pub url: &'a str,
    /// Fetched contents
    pub contents: &'a Bytes,
    /// Loader picked from the extension
    pub loader: Loader,
    /// Network response; `None` when served from the cache
    pub response: Option<&'a ResponseMeta>,
}

/// Override for load results. `Ok(None)` keeps the default result.
pub type OnLoad = Arc<dyn Fn(&OnLoadContext<'_>) -> anyhow::Result<Option<LoadResult>> + Send + Sync>;

/// A bundler plugin with resolve and load hooks.
///
/// Both hooks return `Ok(None)` when the plugin does not handle the input,
/// so the host can try the next plugin.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    async fn resolve(&self, args: ResolveArgs<'_>) -> Result<Option<ResolveResult>>;

    async fn load(&self, args: LoadArgs<'_>) -> Result<Option<LoadResult>>;
}

/// Options for [`HttpPlugin`].
#[derive(Clone)]
pub struct HttpPluginOptions {
    /// Which URLs may enter the remote namespace
    pub filter: UrlFilter,
    /// Custom network agent; built from `agent` and `fetch_options` when `None`
    pub transport: Option<Arc<dyn Transport>>,
    /// Proxy, TLS and pooling settings
    pub agent: AgentOptions,
    /// Alias → URL template
    pub schemes: SchemeRegistry,
    /// Shared cache; pass a clone to reuse it across builds
    pub cache: FetchCache,
    /// Called before each network request
    pub on_fetch: Option<OnFetch>,
    /// Override for load results
    pub on_load: Option<OnLoad>,
    /// Passed through to the transport
    pub fetch_options: FetchOptions,
    /// Loader for unknown extensions
    pub default_loader: Loader,
}

impl Default for HttpPluginOptions {
    fn default() -> Self {
        Self {
            filter: UrlFilter::All,
            transport: None,
            agent: AgentOptions::default(),
            schemes: SchemeRegistry::default(),
            cache: FetchCache::new(),
            on_fetch: None,
            on_load: None,
            fetch_options: FetchOptions::default(),
            default_loader: Loader::Js,
        }
    }
}

impl HttpPluginOptions {
    /// Options described by a [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            filter: config.url_filter()?,
            agent: config.agent_options(),
            schemes: config.scheme_registry()?,
            fetch_options: config.fetch_options(),
            default_loader: config.default_loader,
            ..Self::default()
        })
    }
}

impl std::fmt::Debug for HttpPluginOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPluginOptions")
            .field("filter", &self.filter)
            .field("custom_transport", &self.transport.is_some())
            .field("agent", &self.agent)
            .field("schemes", &self.schemes)
            .field("cache", &self.cache)
            .field("on_fetch", &self.on_fetch.is_some())
            .field("on_load", &self.on_load.is_some())
            .field("fetch_options", &self.fetch_options)
            .field("default_loader", &self.default_loader)
            .finish()
    }
}

/// Resolves and loads `http(s)://` URLs and aliased specifiers.
#[derive(Clone)]
pub struct HttpPlugin {
    resolver: Resolver,
    fetcher: Fetcher,
    on_load: Option<OnLoad>,
    default_loader: Loader,
}

impl HttpPlugin {
    pub fn new(options: HttpPluginOptions) -> Result<Self> {
        let transport: Arc<dyn Transport> = match options.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&options.agent, &options.fetch_options)?),
        };
        let fetcher = Fetcher::new(transport, options.cache)
            .with_on_fetch(options.on_fetch)
            .with_max_redirects(options.fetch_options.max_redirects);

        Ok(Self {
            resolver: Resolver::new(options.schemes, options.filter),
            fetcher,
            on_load: options.on_load,
            default_loader: options.default_loader,
        })
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn cache(&self) -> &FetchCache {
        self.fetcher.cache()
    }
}

#[async_trait]
impl Plugin for HttpPlugin {
    fn name(&self) -> &str {
        "http"
    }

    async fn resolve(&self, args: ResolveArgs<'_>) -> Result<Option<ResolveResult>> {
        self.resolver.resolve(args)
    }

    #[instrument(skip(self))]
    async fn load(&self, args: LoadArgs<'_>) -> Result<Option<LoadResult>> {
        if args.namespace != NAMESPACE {
            return Ok(None);
        }

        let loader = loader::classify(args.path, self.default_loader);
        let fetched = self.fetcher.fetch(args.path).await?;

        if let Some(on_load) = &self.on_load {
            let ctx = OnLoadContext {
                url: args.path,
                contents: &fetched.contents,
                loader,
                response: fetched.response.as_ref(),
            };
            if let Some(result) = on_load(&ctx).map_err(PluginError::OnLoad)? {
                debug!("on_load replaced result for {}", args.path);
                return Ok(Some(result));
            }
        }

        Ok(Some(LoadResult {
            contents: fetched.contents,
            loader,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use std::sync::Mutex;

    fn plugin_with(transport: Arc<MockTransport>, options: HttpPluginOptions) -> HttpPlugin {
        HttpPlugin::new(HttpPluginOptions {
            transport: Some(transport),
            ..options
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_and_load_alias() {
        let transport = Arc::new(
            MockTransport::new().ok("https://esm.sh/react?bundle", "export default React"),
        );
        let plugin = plugin_with(
            transport.clone(),
            HttpPluginOptions {
                schemes: SchemeRegistry::defaults(),
                ..Default::default()
            },
        );

        let resolved = plugin
            .resolve(ResolveArgs::entry("esm:react"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.path, "https://esm.sh/react?bundle");

        let loaded = plugin.load(LoadArgs::from(&resolved)).await.unwrap().unwrap();
        assert_eq!(loaded.text(), "export default React");
        assert_eq!(loaded.loader, Loader::Js);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_load_classifies_by_extension() {
        let transport = Arc::new(
            MockTransport::new()
                .ok("https://x.test/mod.ts", "export const a: number = 1")
                .ok("https://x.test/data.json", "{}")
                .ok("https://x.test/m.wasm", "\0asm"),
        );
        let plugin = plugin_with(
            transport,
            HttpPluginOptions {
                default_loader: Loader::Default,
                ..Default::default()
            },
        );

        let load = |path: &'static str| {
            let plugin = plugin.clone();
            async move {
                plugin
                    .load(LoadArgs::new(path, NAMESPACE))
                    .await
                    .unwrap()
                    .unwrap()
                    .loader
            }
        };
        assert_eq!(load("https://x.test/mod.ts").await, Loader::Ts);
        assert_eq!(load("https://x.test/data.json").await, Loader::Json);
        assert_eq!(load("https://x.test/m.wasm").await, Loader::Default);
    }

    #[tokio::test]
    async fn test_load_declines_other_namespaces() {
        let transport = Arc::new(MockTransport::new());
        let plugin = plugin_with(transport.clone(), HttpPluginOptions::default());
        let result = plugin.load(LoadArgs::new("/src/main.js", "file")).await.unwrap();
        assert!(result.is_none());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let transport = Arc::new(MockTransport::new().status("https://x.test/gone.js", 410));
        let plugin = plugin_with(transport, HttpPluginOptions::default());
        let err = plugin
            .load(LoadArgs::new("https://x.test/gone.js", NAMESPACE))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(410));
    }

    #[tokio::test]
    async fn test_on_load_sees_response_only_when_fresh() {
        let transport = Arc::new(MockTransport::new().ok("https://x.test/a.css", "a{}"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_hook = seen.clone();
        let on_load: OnLoad = Arc::new(move |ctx: &OnLoadContext<'_>| {
            seen_hook
                .lock()
                .unwrap()
                .push((ctx.loader, ctx.response.map(|r| r.status)));
            Ok(None)
        });
        let plugin = plugin_with(
            transport,
            HttpPluginOptions {
                on_load: Some(on_load),
                ..Default::default()
            },
        );

        for _ in 0..2 {
            let loaded = plugin
                .load(LoadArgs::new("https://x.test/a.css", NAMESPACE))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(loaded.loader, Loader::Css);
        }
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(Loader::Css, Some(200)), (Loader::Css, None)]
        );
    }

    #[tokio::test]
    async fn test_on_load_override_and_error() {
        let transport = Arc::new(
            MockTransport::new()
                .ok("https://x.test/data.txt", "a,b")
                .ok("https://x.test/bad.js", "x"),
        );
        let on_load: OnLoad = Arc::new(|ctx: &OnLoadContext<'_>| {
            if ctx.url.ends_with("bad.js") {
                anyhow::bail!("refusing {}", ctx.url);
            }
            let json = format!("{:?}", String::from_utf8_lossy(ctx.contents));
            Ok(Some(LoadResult::new(json, Loader::Json)))
        });
        let plugin = plugin_with(
            transport,
            HttpPluginOptions {
                on_load: Some(on_load),
                ..Default::default()
            },
        );

        let loaded = plugin
            .load(LoadArgs::new("https://x.test/data.txt", NAMESPACE))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.loader, Loader::Json);
        assert_eq!(loaded.text(), "\"a,b\"");

        let err = plugin
            .load(LoadArgs::new("https://x.test/bad.js", NAMESPACE))
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::OnLoad(_)));
        assert_eq!(err.to_string(), "refusing https://x.test/bad.js");
    }

    #[tokio::test]
    async fn test_shared_cache_across_plugins() {
        let cache = FetchCache::new();
        let transport = Arc::new(MockTransport::new().ok("https://x.test/a.js", "a"));

        for _ in 0..2 {
            let plugin = plugin_with(
                transport.clone(),
                HttpPluginOptions {
                    cache: cache.clone(),
                    ..Default::default()
                },
            );
            plugin
                .load(LoadArgs::new("https://x.test/a.js", NAMESPACE))
                .await
                .unwrap();
        }
        assert_eq!(transport.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.set("default-loader", "default").unwrap();
        config.set("filter", "^https://esm\\.sh/").unwrap();
        let options = HttpPluginOptions::from_config(&config).unwrap();
        assert_eq!(options.default_loader, Loader::Default);
        assert_eq!(options.schemes.len(), 3);
        assert!(!options.filter.accepts("https://unpkg.com/x"));
    }
}
