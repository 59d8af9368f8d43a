// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CLI argument parsing for urlimport.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// urlimport - resolve and load remote http(s) modules and CDN aliases
#[derive(Parser, Debug)]
#[command(name = "urlimport")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(short, long, global = true, env = "URLIMPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Register a scheme alias, e.g. `--scheme skypack=https://cdn.skypack.dev/?min`
    #[arg(long = "scheme", global = true, value_name = "NAME=TEMPLATE")]
    pub schemes: Vec<String>,

    /// Do not register the built-in unpkg/jsdelivr/esm aliases
    #[arg(long, global = true)]
    pub no_default_schemes: bool,

    /// Only accept URLs matching this regular expression
    #[arg(long, global = true)]
    pub filter: Option<String>,

    /// Loader used for unknown extensions (js, default, text, ...)
    #[arg(long, global = true)]
    pub loader: Option<String>,

    /// Proxy URL for every request
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a specifier to a URL
    Resolve(ResolveArgs),

    /// Resolve and fetch one or more specifiers
    #[command(alias = "fetch")]
    Load(LoadArgs),

    /// List registered scheme aliases
    Schemes,

    /// Show the effective configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Specifier, e.g. `esm:react` or `./index.js`
    pub specifier: String,

    /// URL of the importing module; relative specifiers resolve against it
    #[arg(long)]
    pub importer: Option<String>,
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Specifiers to load
    #[arg(required = true)]
    pub specifiers: Vec<String>,

    /// Print module contents instead of a summary
    #[arg(short, long)]
    pub print: bool,

    /// Maximum number of concurrent loads
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print one value
    Get {
        /// Key, e.g. `proxy` or `scheme.esm`
        key: String,
    },
    /// Print every value
    List,
}
