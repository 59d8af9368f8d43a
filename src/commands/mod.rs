// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Command implementations for urlimport.

pub mod config;
pub mod load;
pub mod resolve;
pub mod schemes;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use std::sync::Arc;
use tracing::debug;
use urlimport_plugin::{Config, HttpPlugin, HttpPluginOptions, OnFetch, PluginDriver};

use crate::cli::Cli;

/// Common context for command execution.
pub struct CommandContext {
    pub config: Config,
}

impl CommandContext {
    /// Load configuration and apply command line overrides.
    pub fn new(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("reading {}", path.display()))?,
            None => Config::load()?,
        };

        for scheme in &cli.schemes {
            let Some((name, template)) = scheme.split_once('=') else {
                bail!("--scheme expects NAME=TEMPLATE, got '{}'", scheme);
            };
            debug!("Scheme {} -> {} from command line", name, template);
            config.schemes.insert(name.to_string(), template.to_string());
        }
        if cli.no_default_schemes {
            config.default_schemes = false;
        }
        if let Some(ref filter) = cli.filter {
            config.filter = Some(filter.clone());
        }
        if let Some(ref loader) = cli.loader {
            config.default_loader = loader.parse()?;
        }
        if let Some(ref proxy) = cli.proxy {
            config.proxy = Some(proxy.clone());
        }
        if cli.insecure {
            config.strict_ssl = false;
        }

        Ok(Self { config })
    }

    /// The http plugin described by the configuration.
    pub fn plugin(&self, on_fetch: Option<OnFetch>) -> Result<HttpPlugin> {
        let options = HttpPluginOptions {
            on_fetch,
            ..HttpPluginOptions::from_config(&self.config)?
        };
        Ok(HttpPlugin::new(options)?)
    }

    /// A host with the http plugin that reports every network fetch.
    pub fn driver(&self) -> Result<PluginDriver> {
        let on_fetch: OnFetch = Arc::new(|url: &str| {
            eprintln!("{} {}", "fetching".dimmed(), url.cyan());
        });
        Ok(PluginDriver::new().with_plugin(self.plugin(Some(on_fetch))?))
    }
}
