// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolution of remote module specifiers.
//!
//! A specifier enters the remote namespace when it uses a registered alias or
//! is an absolute `http(s)://` URL, and the filter accepts the expanded URL.
//! Every import made from inside the namespace is then resolved against the
//! importing module's URL without consulting the filter again.

use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use url::Url;

use crate::error::{PluginError, Result};
use crate::scheme::SchemeRegistry;

/// Namespace tag attached to every module claimed by this plugin.
pub const NAMESPACE: &str = "http-url";

/// Decides which absolute URLs may enter the remote namespace.
#[derive(Clone, Default)]
pub enum UrlFilter {
    /// Accept every URL
    #[default]
    All,
    /// Accept URLs matching the pattern
    Pattern(Regex),
    /// Accept URLs for which the predicate returns `true`
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl UrlFilter {
    /// Filter from a regular expression.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(UrlFilter::Pattern(Regex::new(pattern)?))
    }

    /// Filter from an arbitrary predicate.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        UrlFilter::Predicate(Arc::new(f))
    }

    pub fn accepts(&self, url: &str) -> bool {
        match self {
            UrlFilter::All => true,
            UrlFilter::Pattern(re) => re.is_match(url),
            UrlFilter::Predicate(f) => f(url),
        }
    }
}

impl fmt::Debug for UrlFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlFilter::All => f.write_str("All"),
            UrlFilter::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            UrlFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Arguments of the host's resolve hook.
#[derive(Debug, Clone, Copy)]
pub struct ResolveArgs<'a> {
    /// Specifier as written in the import
    pub path: &'a str,
    /// Path of the importing module (empty for entry points)
    pub importer: &'a str,
    /// Namespace of the importing module
    pub namespace: &'a str,
}

impl<'a> ResolveArgs<'a> {
    /// Arguments for an entry point.
    pub fn entry(path: &'a str) -> Self {
        Self {
            path,
            importer: "",
            namespace: "file",
        }
    }

    /// Arguments for an import made by `importer` in `namespace`.
    pub fn import(path: &'a str, importer: &'a str, namespace: &'a str) -> Self {
        Self {
            path,
            importer,
            namespace,
        }
    }
}

/// A specifier claimed by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    /// Absolute URL
    pub path: String,
    /// Namespace the path belongs to
    pub namespace: String,
}

impl ResolveResult {
    fn remote(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: NAMESPACE.to_string(),
        }
    }
}

/// Resolution policy for remote specifiers.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    schemes: SchemeRegistry,
    filter: UrlFilter,
}

impl Resolver {
    pub fn new(schemes: SchemeRegistry, filter: UrlFilter) -> Self {
        Self { schemes, filter }
    }

    pub fn schemes(&self) -> &SchemeRegistry {
        &self.schemes
    }

    pub fn filter(&self) -> &UrlFilter {
        &self.filter
    }

    /// Resolve a specifier. `Ok(None)` leaves it to other resolvers.
    pub fn resolve(&self, args: ResolveArgs<'_>) -> Result<Option<ResolveResult>> {
        if let Some(resolved) = self.resolve_alias(args.path) {
            return Ok(Some(resolved));
        }
        if let Some(resolved) = self.resolve_absolute(args.path) {
            return Ok(Some(resolved));
        }
        if args.namespace == NAMESPACE {
            return resolve_relative(args.path, args.importer).map(Some);
        }
        trace!("Declining {}", args.path);
        Ok(None)
    }

    /// `alias:path` expanded through the scheme registry.
    fn resolve_alias(&self, specifier: &str) -> Option<ResolveResult> {
        let url = self.schemes.expand(specifier)?;
        if self.filter.accepts(&url) {
            Some(ResolveResult::remote(url))
        } else {
            trace!("Filter rejected {} (from {})", url, specifier);
            None
        }
    }

    /// A specifier that already is an `http://` or `https://` URL.
    fn resolve_absolute(&self, specifier: &str) -> Option<ResolveResult> {
        if !is_http_url(specifier) {
            return None;
        }
        if self.filter.accepts(specifier) {
            Some(ResolveResult::remote(specifier))
        } else {
            trace!("Filter rejected {}", specifier);
            None
        }
    }
}

/// Whether `specifier` starts with `http://` or `https://`.
pub fn is_http_url(specifier: &str) -> bool {
    specifier.starts_with("http://") || specifier.starts_with("https://")
}

/// Resolve `specifier` against the URL of the module importing it.
pub fn resolve_relative(specifier: &str, importer: &str) -> Result<ResolveResult> {
    let base = Url::parse(importer).map_err(|e| PluginError::invalid_url(importer, e))?;
    let url = base
        .join(specifier)
        .map_err(|e| PluginError::invalid_url(specifier, e))?;
    Ok(ResolveResult::remote(url.to_string()))
}
