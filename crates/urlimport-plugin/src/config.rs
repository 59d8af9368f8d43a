// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Configuration for the http plugin.
//!
//! Values are merged from the user config file, a project `urlimport.toml`
//! and `URLIMPORT_*` environment variables, in that order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PluginError, Result};
use crate::loader::Loader;
use crate::resolve::UrlFilter;
use crate::scheme::SchemeRegistry;

/// Project-level configuration file name.
pub const PROJECT_CONFIG_FILE: &str = "urlimport.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "URLIMPORT_";

/// Default redirect limit.
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

/// Connection-level options: proxying, TLS and pooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    /// Proxy URL for every request
    pub proxy: Option<String>,
    /// Verify TLS certificates
    pub strict_ssl: bool,
    /// Idle keep-alive connections kept per host
    pub pool_max_idle_per_host: usize,
    /// TCP keep-alive interval in seconds
    pub tcp_keepalive: Option<u64>,
    /// Honor `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` when no proxy is set
    pub system_proxy: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            strict_ssl: true,
            pool_max_idle_per_host: 20,
            tcp_keepalive: Some(60),
            system_proxy: true,
        }
    }
}

/// Per-request options passed through to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Total request timeout in seconds; `None` leaves it to the transport
    pub timeout: Option<u64>,
    /// Connect timeout in seconds
    pub connect_timeout: u64,
    /// User-Agent header
    pub user_agent: String,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
    /// Redirects followed before giving up
    pub max_redirects: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: 30,
            user_agent: default_user_agent(),
            headers: BTreeMap::new(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Configuration for urlimport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Extra scheme aliases (alias -> URL template)
    pub schemes: BTreeMap<String, String>,

    /// Include the built-in unpkg/jsdelivr/esm aliases
    pub default_schemes: bool,

    /// Regex a URL must match to enter the remote namespace
    pub filter: Option<String>,

    /// Loader used when the extension is unknown
    pub default_loader: Loader,

    /// Proxy URL
    pub proxy: Option<String>,

    /// Verify TLS certificates
    pub strict_ssl: bool,

    /// Request timeout in seconds
    pub timeout: Option<u64>,

    /// Connect timeout in seconds
    pub connect_timeout: u64,

    /// User-Agent header
    pub user_agent: String,

    /// Redirect limit
    pub max_redirects: usize,

    /// Extra request headers
    pub headers: BTreeMap<String, String>,

    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,

    /// Number of concurrent loads for the command line
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        let agent = AgentOptions::default();
        let fetch = FetchOptions::default();
        Self {
            schemes: BTreeMap::new(),
            default_schemes: true,
            filter: None,
            default_loader: Loader::Js,
            proxy: agent.proxy,
            strict_ssl: agent.strict_ssl,
            timeout: fetch.timeout,
            connect_timeout: fetch.connect_timeout,
            user_agent: fetch.user_agent,
            max_redirects: fetch.max_redirects,
            headers: fetch.headers,
            pool_max_idle_per_host: agent.pool_max_idle_per_host,
            concurrency: 16,
        }
    }
}

impl Config {
    /// Load configuration from default locations.
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(user_config_path) = user_config_path() {
            if user_config_path.exists() {
                config.merge_from_file(&user_config_path)?;
            }
        }

        let project_config = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_config.exists() {
            config.merge_from_file(&project_config)?;
        }

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from one file, on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.merge_from_file(path)?;
        Ok(config)
    }

    /// Merge the keys present in a TOML file.
    fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        debug!("Reading config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&content)?;

        for (key, value) in table {
            match (key.as_str(), value) {
                ("schemes", toml::Value::Table(schemes)) => {
                    for (alias, template) in schemes {
                        let template = template.as_str().ok_or_else(|| {
                            PluginError::Config(format!("scheme '{}' must be a string", alias))
                        })?;
                        self.schemes.insert(alias, template.to_string());
                    }
                }
                ("headers", toml::Value::Table(headers)) => {
                    for (name, value) in headers {
                        let value = value.as_str().ok_or_else(|| {
                            PluginError::Config(format!("header '{}' must be a string", name))
                        })?;
                        self.headers.insert(name, value.to_string());
                    }
                }
                (key, toml::Value::String(s)) => self.set(key, &s)?,
                (key, value) => self.set(key, &value.to_string())?,
            }
        }

        Ok(())
    }

    /// Apply `URLIMPORT_*` environment variables.
    fn load_from_env(&mut self) {
        self.apply_env(std::env::vars());
    }

    /// Apply `URLIMPORT_*` variables from `vars`, ignoring other names.
    ///
    /// `URLIMPORT_SCHEME_<ALIAS>` and `URLIMPORT_HEADER_<NAME>` map to
    /// `scheme.<alias>` and `header.<name>`.
    fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX).map(env_config_key) {
                if let Err(e) = self.set(&config_key, &value) {
                    debug!("Ignoring {}: {}", key, e);
                }
            }
        }
    }

    /// Set a configuration value by its kebab-case key.
    ///
    /// `scheme.<alias>` and `header.<name>` add an alias or a request header.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "default-schemes" => self.default_schemes = parse_bool(key, value)?,
            "filter" => self.filter = non_empty(value),
            "default-loader" => self.default_loader = value.parse()?,
            "proxy" => self.proxy = non_empty(value),
            "strict-ssl" => self.strict_ssl = parse_bool(key, value)?,
            "timeout" => self.timeout = Some(parse_number(key, value)?),
            "connect-timeout" => self.connect_timeout = parse_number(key, value)?,
            "user-agent" => self.user_agent = value.to_string(),
            "max-redirects" => self.max_redirects = parse_number(key, value)?,
            "pool-max-idle-per-host" => self.pool_max_idle_per_host = parse_number(key, value)?,
            "concurrency" => self.concurrency = parse_number::<usize>(key, value)?.max(1),
            _ => {
                if let Some(alias) = key.strip_prefix("scheme.") {
                    self.schemes.insert(alias.to_string(), value.to_string());
                } else if let Some(name) = key.strip_prefix("header.") {
                    self.headers.insert(name.to_string(), value.to_string());
                } else {
                    return Err(PluginError::Config(format!("unknown key '{}'", key)));
                }
            }
        }
        Ok(())
    }

    /// Get a configuration value by its kebab-case key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "default-schemes" => Some(self.default_schemes.to_string()),
            "filter" => self.filter.clone(),
            "default-loader" => Some(self.default_loader.to_string()),
            "proxy" => self.proxy.clone(),
            "strict-ssl" => Some(self.strict_ssl.to_string()),
            "timeout" => self.timeout.map(|t| t.to_string()),
            "connect-timeout" => Some(self.connect_timeout.to_string()),
            "user-agent" => Some(self.user_agent.clone()),
            "max-redirects" => Some(self.max_redirects.to_string()),
            "pool-max-idle-per-host" => Some(self.pool_max_idle_per_host.to_string()),
            "concurrency" => Some(self.concurrency.to_string()),
            _ => {
                if let Some(alias) = key.strip_prefix("scheme.") {
                    self.schemes.get(alias).cloned()
                } else if let Some(name) = key.strip_prefix("header.") {
                    self.headers.get(name).cloned()
                } else {
                    None
                }
            }
        }
    }

    /// Every key with a value, in a stable order.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut keys: Vec<String> = [
            "default-schemes",
            "filter",
            "default-loader",
            "proxy",
            "strict-ssl",
            "timeout",
            "connect-timeout",
            "user-agent",
            "max-redirects",
            "pool-max-idle-per-host",
            "concurrency",
        ]
        .iter()
        .map(|k| k.to_string())
        .collect();
        keys.extend(self.schemes.keys().map(|a| format!("scheme.{}", a)));
        keys.extend(self.headers.keys().map(|h| format!("header.{}", h)));

        keys.into_iter()
            .filter_map(|k| self.get(&k).map(|v| (k, v)))
            .collect()
    }

    /// Aliases to register: the built-ins (unless disabled) plus configured ones.
    pub fn scheme_registry(&self) -> Result<SchemeRegistry> {
        if self.default_schemes {
            SchemeRegistry::defaults().with(self.schemes.clone())
        } else {
            SchemeRegistry::new(self.schemes.clone())
        }
    }

    /// The configured URL filter.
    pub fn url_filter(&self) -> Result<UrlFilter> {
        match &self.filter {
            Some(pattern) => UrlFilter::pattern(pattern),
            None => Ok(UrlFilter::All),
        }
    }

    /// Connection options derived from this configuration.
    pub fn agent_options(&self) -> AgentOptions {
        AgentOptions {
            proxy: self.proxy.clone(),
            strict_ssl: self.strict_ssl,
            pool_max_idle_per_host: self.pool_max_idle_per_host,
            ..AgentOptions::default()
        }
    }

    /// Request options derived from this configuration.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.clone(),
            headers: self.headers.clone(),
            max_redirects: self.max_redirects,
        }
    }
}

fn default_user_agent() -> String {
    format!("urlimport/{}", env!("CARGO_PKG_VERSION"))
}

/// Get the user config path.
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("urlimport").join("config.toml"))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Config key for the part of an environment variable after the prefix.
fn env_config_key(name: &str) -> String {
    if let Some(alias) = name.strip_prefix("SCHEME_") {
        format!("scheme.{}", alias.to_lowercase())
    } else if let Some(header) = name.strip_prefix("HEADER_") {
        format!("header.{}", header.to_lowercase().replace('_', "-"))
    } else {
        name.to_lowercase().replace('_', "-")
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(PluginError::Config(format!(
            "'{}' expects true or false, got '{}'",
            key, value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        PluginError::Config(format!("'{}' expects a number, got '{}'", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_vars() {
        let mut config = Config::default();
        config.apply_env([
            ("URLIMPORT_PROXY".to_string(), "http://proxy.test:3128".to_string()),
            ("URLIMPORT_MAX_REDIRECTS".to_string(), "5".to_string()),
            ("URLIMPORT_SCHEME_ESM".to_string(), "https://esm.internal/?bundle".to_string()),
            ("URLIMPORT_HEADER_X_BUILD_ID".to_string(), "42".to_string()),
            ("URLIMPORT_NOT_A_KEY".to_string(), "x".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ]);

        assert_eq!(config.proxy.as_deref(), Some("http://proxy.test:3128"));
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.get("scheme.esm").as_deref(), Some("https://esm.internal/?bundle"));
        assert_eq!(config.get("header.x-build-id").as_deref(), Some("42"));

        let registry = config.scheme_registry().unwrap();
        assert_eq!(
            registry.expand("esm:react").as_deref(),
            Some("https://esm.internal/react?bundle")
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.default_schemes);
        assert_eq!(config.default_loader, Loader::Js);
        assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);
        assert!(config.strict_ssl);

        let registry = config.scheme_registry().unwrap();
        assert_eq!(registry.len(), 3);
        assert!(matches!(config.url_filter().unwrap(), UrlFilter::All));
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        config.set("proxy", "http://proxy:8080").unwrap();
        config.set("strict-ssl", "false").unwrap();
        config.set("default-loader", "default").unwrap();
        config.set("scheme.deno", "https://deno.land/x/").unwrap();
        config.set("header.authorization", "Bearer t").unwrap();
        config.set("concurrency", "0").unwrap();

        assert_eq!(config.get("proxy").as_deref(), Some("http://proxy:8080"));
        assert_eq!(config.get("strict-ssl").as_deref(), Some("false"));
        assert_eq!(config.get("default-loader").as_deref(), Some("default"));
        assert_eq!(config.get("scheme.deno").as_deref(), Some("https://deno.land/x/"));
        assert_eq!(config.get("header.authorization").as_deref(), Some("Bearer t"));
        assert_eq!(config.concurrency, 1);

        assert!(config.set("strict-ssl", "maybe").is_err());
        assert!(config.set("timeout", "soon").is_err());
        assert!(config.set("no-such-key", "x").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default-schemes = false
filter = "^https://esm\\.sh/"
default-loader = "default"
max-redirects = 5
timeout = 10

[schemes]
skypack = "https://cdn.skypack.dev/?min"

[headers]
accept = "application/javascript"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.default_schemes);
        assert_eq!(config.default_loader, Loader::Default);
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.timeout, Some(10));

        let registry = config.scheme_registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.expand("skypack:preact").as_deref(),
            Some("https://cdn.skypack.dev/preact?min")
        );

        let filter = config.url_filter().unwrap();
        assert!(filter.accepts("https://esm.sh/react"));
        assert!(!filter.accepts("https://unpkg.com/react"));

        let fetch = config.fetch_options();
        assert_eq!(fetch.max_redirects, 5);
        assert_eq!(
            fetch.headers.get("accept").map(String::as_str),
            Some("application/javascript")
        );
    }

    #[test]
    fn test_from_file_rejects_bad_scheme() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[schemes]\nesm = 3").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(PluginError::Config(_))
        ));
    }

    #[test]
    fn test_user_schemes_override_defaults() {
        let mut config = Config::default();
        config.set("scheme.esm", "https://esm.internal/?bundle").unwrap();
        let registry = config.scheme_registry().unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.expand("esm:react").as_deref(),
            Some("https://esm.internal/react?bundle")
        );
    }

    #[test]
    fn test_entries_lists_set_values() {
        let mut config = Config::default();
        config.set("scheme.gh", "https://raw.githubusercontent.com/").unwrap();
        let entries = config.entries();
        assert!(entries.iter().any(|(k, v)| k == "scheme.gh" && v.starts_with("https://")));
        assert!(entries.iter().all(|(k, _)| k != "proxy"));
    }
}
