// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # urlimport-plugin
//!
//! A bundler plugin that lets remote `http://` / `https://` module specifiers,
//! and short CDN aliases such as `unpkg:react` or `esm:react`, be resolved and
//! loaded as if they were local files.
//!
//! ## Overview
//!
//! - [`scheme`] expands registered aliases into full URLs.
//! - [`resolve`] decides which specifiers enter the remote namespace and
//!   resolves transitive imports against their importer.
//! - [`fetch`] downloads each URL at most once, following redirects, and
//!   memoizes the body in a caller-owned [`FetchCache`].
//! - [`loader`] classifies the content by file extension.
//! - [`plugin`] wires everything into the two host hooks, `resolve` and `load`.
//!
//! ## Example
//!
//! ```no_run
//! use urlimport_plugin::{HttpPlugin, HttpPluginOptions, PluginDriver, SchemeRegistry};
//!
//! # async fn demo() -> urlimport_plugin::Result<()> {
//! let plugin = HttpPlugin::new(HttpPluginOptions {
//!     schemes: SchemeRegistry::defaults(),
//!     ..Default::default()
//! })?;
//!
//! let driver = PluginDriver::new().with_plugin(plugin);
//! let module = driver.resolve_and_load("esm:react").await?;
//! println!("{} bytes as {}", module.result.contents.len(), module.result.loader);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod plugin;
pub mod resolve;
pub mod scheme;
pub mod transport;

#[cfg(test)]
mod testing;

pub use cache::FetchCache;
pub use config::{AgentOptions, Config, FetchOptions};
pub use driver::{LoadedModule, PluginDriver};
pub use error::{PluginError, Result};
pub use fetch::{Fetched, Fetcher, OnFetch};
pub use loader::Loader;
pub use plugin::{
    HttpPlugin, HttpPluginOptions, LoadArgs, LoadResult, OnLoad, OnLoadContext, Plugin,
};
pub use resolve::{NAMESPACE, ResolveArgs, ResolveResult, Resolver, UrlFilter};
pub use scheme::{DEFAULT_SCHEMES, Scheme, SchemeRegistry};
pub use transport::{HttpTransport, ResponseMeta, Transport, TransportResponse};
