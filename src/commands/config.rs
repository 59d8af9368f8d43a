// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Config command implementation.

use anyhow::{Result, bail};
use owo_colors::OwoColorize;

use crate::cli::{Cli, ConfigAction, ConfigArgs};
use crate::commands::CommandContext;

pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    let ctx = CommandContext::new(cli)?;

    match &args.action {
        Some(ConfigAction::Get { key }) => match ctx.config.get(key) {
            Some(value) => println!("{}", value),
            None => bail!("'{}' is not set", key),
        },
        Some(ConfigAction::List) | None => {
            for (key, value) in ctx.config.entries() {
                println!("{} = {}", key.cyan(), value);
            }
        }
    }

    Ok(())
}
