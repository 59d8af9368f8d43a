// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! In-memory cache of fetched module contents.

use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;

use crate::error::PluginError;
use crate::transport::ResponseMeta;

/// Outcome of one fetch, handed to every caller waiting on it.
pub(crate) type SlotOutput = std::result::Result<(Bytes, Option<ResponseMeta>), Arc<PluginError>>;

/// Slot for one URL: a fetch in flight, or its finished outcome.
pub(crate) type Slot = Shared<BoxFuture<'static, SlotOutput>>;

/// Thread-safe URL → contents cache.
///
/// Cloning is cheap and every clone shares the same entries, so one cache can
/// be handed to several plugins or reused across builds. Entries live until
/// they are removed or the last handle is dropped.
#[derive(Clone, Default)]
pub struct FetchCache {
    entries: Arc<DashMap<String, Slot>>,
}

fn cached(slot: &Slot) -> Option<&Bytes> {
    match slot.peek() {
        Some(Ok((contents, _))) => Some(contents),
        _ => None,
    }
}

impl FetchCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `url`, installing the one built by `start` if there is
    /// none yet. The flag is `true` when this call installed it.
    ///
    /// Concurrent fetches of the same URL await the same slot, so only one
    /// of them reaches the network.
    pub(crate) fn claim<F>(&self, url: &str, start: F) -> (Slot, bool)
    where
        F: FnOnce() -> Slot,
    {
        if let Some(slot) = self.entries.get(url) {
            return (slot.clone(), false);
        }
        match self.entries.entry(url.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let slot = start();
                entry.insert(slot.clone());
                (slot, true)
            }
        }
    }

    /// Drop the slot of a failed fetch so that a later call starts over.
    ///
    /// A slot installed since then by another caller is left alone.
    pub(crate) fn release(&self, url: &str, slot: &Slot) {
        self.entries.remove_if(url, |_, current| current.ptr_eq(slot));
    }

    /// Number of slots, in flight or finished.
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.entries.len()
    }

    /// Cached contents for `url`.
    pub fn get(&self, url: &str) -> Option<Bytes> {
        self.entries
            .get(url)
            .and_then(|slot| cached(&slot).cloned())
    }

    /// Store contents for `url`, replacing any previous entry.
    pub fn insert(&self, url: impl Into<String>, contents: impl Into<Bytes>) {
        let ready: SlotOutput = Ok((contents.into(), None));
        let slot = futures::future::ready(ready).boxed().shared();
        self.entries.insert(url.into(), slot);
    }

    /// Whether contents for `url` are cached.
    pub fn contains(&self, url: &str) -> bool {
        self.entries
            .get(url)
            .is_some_and(|slot| cached(&slot).is_some())
    }

    /// Remove the entry for `url`, returning its contents.
    pub fn remove(&self, url: &str) -> Option<Bytes> {
        self.entries
            .remove(url)
            .and_then(|(_, slot)| cached(&slot).cloned())
    }

    /// URLs with cached contents.
    pub fn urls(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| cached(entry.value()).is_some())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of cached URLs.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| cached(entry.value()).is_some())
            .count()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for FetchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCache")
            .field("len", &self.len())
            .finish()
    }
}
