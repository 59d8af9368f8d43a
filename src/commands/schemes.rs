// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Schemes command implementation.

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::cli::Cli;
use crate::commands::CommandContext;

pub fn run(cli: &Cli) -> Result<()> {
    let ctx = CommandContext::new(cli)?;
    let registry = ctx.config.scheme_registry()?;

    if registry.is_empty() {
        println!("{}", "No scheme aliases registered".yellow());
        return Ok(());
    }

    for scheme in registry.iter() {
        println!("{:12} {}", format!("{}:", scheme.name()).cyan(), scheme.template());
    }
    Ok(())
}
