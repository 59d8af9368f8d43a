// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Content classification by file extension.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PluginError;

/// How the host should interpret loaded contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Css,
    Json,
    Text,
    Binary,
    /// Let the host infer the content type
    Default,
}

/// Extension → loader table.
const EXT_TO_LOADER: &[(&str, Loader)] = &[
    (".js", Loader::Js),
    (".mjs", Loader::Js),
    (".cjs", Loader::Js),
    (".jsx", Loader::Jsx),
    (".ts", Loader::Ts),
    (".cts", Loader::Ts),
    (".mts", Loader::Ts),
    (".tsx", Loader::Tsx),
    (".css", Loader::Css),
    (".json", Loader::Json),
    (".txt", Loader::Text),
];

impl Loader {
    pub fn as_str(&self) -> &'static str {
        match self {
            Loader::Js => "js",
            Loader::Jsx => "jsx",
            Loader::Ts => "ts",
            Loader::Tsx => "tsx",
            Loader::Css => "css",
            Loader::Json => "json",
            Loader::Text => "text",
            Loader::Binary => "binary",
            Loader::Default => "default",
        }
    }

    /// Loader registered for an extension such as `.ts`.
    pub fn from_extension(ext: &str) -> Option<Loader> {
        EXT_TO_LOADER
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, loader)| *loader)
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Loader {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "js" => Ok(Loader::Js),
            "jsx" => Ok(Loader::Jsx),
            "ts" => Ok(Loader::Ts),
            "tsx" => Ok(Loader::Tsx),
            "css" => Ok(Loader::Css),
            "json" => Ok(Loader::Json),
            "text" => Ok(Loader::Text),
            "binary" => Ok(Loader::Binary),
            "default" => Ok(Loader::Default),
            _ => Err(PluginError::Config(format!("unknown loader '{}'", s))),
        }
    }
}

/// Extension of the last path segment of `url`, including the dot.
///
/// Query and fragment are ignored, so `https://esm.sh/react?bundle` has none.
pub fn extension(url: &str) -> Option<&str> {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let mut path = &url[..end];
    if let Some(idx) = path.find("://") {
        let rest = &path[idx + 3..];
        path = rest.find('/').map_or("", |slash| &rest[slash..]);
    }
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment.rfind('.').map(|idx| &segment[idx..])
}

/// Loader for `url`, falling back to `default` for unknown extensions.
pub fn classify(url: &str, default: Loader) -> Loader {
    extension(url)
        .and_then(Loader::from_extension)
        .unwrap_or(default)
}
