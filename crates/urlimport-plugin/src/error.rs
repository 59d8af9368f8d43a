// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the http plugin.

use std::sync::Arc;
use thiserror::Error;

/// Result type for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors raised while resolving or loading remote modules.
///
/// A resolver that does not claim a specifier is not an error; the hooks
/// return `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The server answered with a status that is neither 200 nor a redirect
    #[error("Failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    /// DNS, connection, or TLS failure
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A specifier, importer, or redirect target is not a usable URL
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Redirect response without a Location header
    #[error("HTTP {status} redirect from {url} has no Location header")]
    MissingLocation { url: String, status: u16 },

    /// Redirect chain longer than the configured limit
    #[error("Too many redirects fetching {url} (limit {limit})")]
    TooManyRedirects { url: String, limit: usize },

    /// No plugin claimed the specifier
    #[error("Could not resolve '{0}'")]
    Unresolved(String),

    /// No plugin produced contents for the resolved path
    #[error("No loader produced contents for '{0}'")]
    NotLoaded(String),

    /// Scheme alias registered twice
    #[error("Duplicate scheme alias: {0}")]
    DuplicateScheme(String),

    /// Scheme alias with an empty name
    #[error("Scheme alias must not be empty")]
    EmptyScheme,

    /// Invalid filter or scheme pattern
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Error returned by a user `on_load` override
    #[error(transparent)]
    OnLoad(anyhow::Error),

    /// Failure of a fetch that several callers were waiting on
    #[error(transparent)]
    Shared(Arc<PluginError>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PluginError {
    /// Whether this error came from the network (bad status or transport failure).
    pub fn is_fetch_error(&self) -> bool {
        match self {
            PluginError::Shared(inner) => inner.is_fetch_error(),
            _ => matches!(
                self,
                PluginError::Status { .. }
                    | PluginError::Transport(_)
                    | PluginError::MissingLocation { .. }
                    | PluginError::TooManyRedirects { .. }
            ),
        }
    }

    /// HTTP status carried by a [`PluginError::Status`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            PluginError::Status { status, .. } => Some(*status),
            PluginError::Shared(inner) => inner.status(),
            _ => None,
        }
    }

    /// Take back a shared error, wrapping it only if others still hold it.
    pub(crate) fn from_shared(err: Arc<PluginError>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(PluginError::Shared)
    }

    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        PluginError::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<&str> for PluginError {
    fn from(s: &str) -> Self {
        PluginError::Config(s.to_string())
    }
}

impl From<String> for PluginError {
    fn from(s: String) -> Self {
        PluginError::Config(s)
    }
}
