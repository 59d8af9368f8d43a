// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! URL scheme aliases such as `unpkg:react`.
//!
//! An alias maps a short name to a URL template. The template may carry a
//! query string, which is moved after the aliased path on expansion:
//! `esm → https://esm.sh/?bundle` turns `esm:react` into
//! `https://esm.sh/react?bundle`.

use regex::Regex;
use tracing::trace;

use crate::error::{PluginError, Result};

/// Built-in aliases for the public ESM-friendly package CDNs.
pub const DEFAULT_SCHEMES: &[(&str, &str)] = &[
    ("unpkg", "https://unpkg.com/?module"),
    ("jsdelivr", "https://esm.run/"),
    ("esm", "https://esm.sh/?bundle"),
];

/// A registered alias with its template split at the first `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    name: String,
    prefix: String,
    search: String,
}

impl Scheme {
    /// Create an alias from its name and URL template.
    pub fn new(name: impl Into<String>, template: &str) -> Self {
        let (prefix, search) = match template.find('?') {
            Some(idx) => (&template[..idx], &template[idx..]),
            None => (template, ""),
        };
        Self {
            name: name.into(),
            prefix: prefix.to_string(),
            search: search.to_string(),
        }
    }

    /// Alias name, without the trailing colon.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original template, e.g. `https://esm.sh/?bundle`.
    pub fn template(&self) -> String {
        format!("{}{}", self.prefix, self.search)
    }

    /// Expand the path that followed `name:`.
    pub fn expand(&self, path: &str) -> String {
        format!("{}{}{}", self.prefix, path, self.search)
    }
}

/// Ordered, immutable set of aliases plus the compiled matcher.
#[derive(Debug, Clone, Default)]
pub struct SchemeRegistry {
    schemes: Vec<Scheme>,
    matcher: Option<Regex>,
}

impl SchemeRegistry {
    /// Build a registry from `(alias, template)` pairs, keeping their order.
    pub fn new<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut schemes: Vec<Scheme> = Vec::new();
        for (name, template) in pairs {
            let name = name.into();
            if name.is_empty() {
                return Err(PluginError::EmptyScheme);
            }
            if schemes.iter().any(|s| s.name == name) {
                return Err(PluginError::DuplicateScheme(name));
            }
            schemes.push(Scheme::new(name, template.as_ref()));
        }
        Self::from_schemes(schemes)
    }

    /// Registry holding [`DEFAULT_SCHEMES`].
    pub fn defaults() -> Self {
        let schemes = DEFAULT_SCHEMES
            .iter()
            .map(|(name, template)| Scheme::new(*name, template))
            .collect();
        // The built-in names are plain words and always compile.
        Self::from_schemes(schemes).unwrap_or_default()
    }

    /// A copy of this registry with `extra` merged in.
    ///
    /// An alias already present keeps its position but takes the new template.
    pub fn with<I, K, V>(&self, extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut schemes = self.schemes.clone();
        for (name, template) in extra {
            let name = name.into();
            if name.is_empty() {
                return Err(PluginError::EmptyScheme);
            }
            let scheme = Scheme::new(name, template.as_ref());
            match schemes.iter_mut().find(|s| s.name == scheme.name) {
                Some(existing) => *existing = scheme,
                None => schemes.push(scheme),
            }
        }
        Self::from_schemes(schemes)
    }

    fn from_schemes(schemes: Vec<Scheme>) -> Result<Self> {
        let matcher = if schemes.is_empty() {
            None
        } else {
            let names: Vec<&str> = schemes.iter().map(|s| s.name.as_str()).collect();
            Some(make_regex(&names)?)
        };
        Ok(Self { schemes, matcher })
    }

    /// Number of registered aliases.
    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    /// Whether no alias is registered.
    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    /// Registered aliases in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Scheme> {
        self.schemes.iter()
    }

    /// Whether `specifier` starts with `<alias>:` for some registered alias.
    pub fn matches(&self, specifier: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|re| re.is_match(specifier))
    }

    /// The alias used by `specifier`, if any.
    pub fn find(&self, specifier: &str) -> Option<&Scheme> {
        if !self.matches(specifier) {
            return None;
        }
        // The pattern only says that some alias matched.
        self.schemes.iter().find(|s| {
            specifier
                .strip_prefix(s.name.as_str())
                .is_some_and(|rest| rest.starts_with(':'))
        })
    }

    /// Expand an aliased specifier into a full URL.
    pub fn expand(&self, specifier: &str) -> Option<String> {
        let scheme = self.find(specifier)?;
        let url = scheme.expand(&specifier[scheme.name.len() + 1..]);
        trace!("Expanded {} to {}", specifier, url);
        Some(url)
    }
}

/// Compile `^(a|b|c):` with every alias escaped.
pub fn make_regex(names: &[&str]) -> Result<Regex> {
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Regex::new(&format!("^({}):", alternation))?)
}
