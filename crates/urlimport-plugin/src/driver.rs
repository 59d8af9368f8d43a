// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Minimal host that dispatches hooks to an ordered list of plugins.

use std::sync::Arc;
use tracing::trace;

use crate::error::{PluginError, Result};
use crate::plugin::{LoadArgs, LoadResult, Plugin};
use crate::resolve::{ResolveArgs, ResolveResult};

/// A module that went through both hooks.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub resolved: ResolveResult,
    pub result: LoadResult,
}

/// Runs resolve and load hooks the way a bundler does: plugins are asked in
/// registration order and the first one that does not decline wins.
#[derive(Clone, Default)]
pub struct PluginDriver {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn push(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Names of the registered plugins.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub async fn resolve(&self, args: ResolveArgs<'_>) -> Result<Option<ResolveResult>> {
        for plugin in &self.plugins {
            if let Some(resolved) = plugin.resolve(args).await? {
                trace!("{} resolved {} to {}", plugin.name(), args.path, resolved.path);
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }

    pub async fn load(&self, args: LoadArgs<'_>) -> Result<Option<LoadResult>> {
        for plugin in &self.plugins {
            if let Some(result) = plugin.load(args).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Resolve an entry point and load it.
    pub async fn resolve_and_load(&self, specifier: &str) -> Result<LoadedModule> {
        self.resolve_and_load_from(ResolveArgs::entry(specifier)).await
    }

    /// Resolve an import and load it.
    pub async fn resolve_and_load_from(&self, args: ResolveArgs<'_>) -> Result<LoadedModule> {
        let resolved = self
            .resolve(args)
            .await?
            .ok_or_else(|| PluginError::Unresolved(args.path.to_string()))?;
        let result = self
            .load(LoadArgs::from(&resolved))
            .await?
            .ok_or_else(|| PluginError::NotLoaded(resolved.path.clone()))?;
        Ok(LoadedModule { resolved, result })
    }
}
