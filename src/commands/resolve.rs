// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolve command implementation.

use anyhow::Result;
use owo_colors::OwoColorize;
use urlimport_plugin::{NAMESPACE, Plugin, ResolveArgs as HookArgs};

use crate::cli::{Cli, ResolveArgs};
use crate::commands::CommandContext;

pub async fn run(args: &ResolveArgs, cli: &Cli) -> Result<()> {
    let ctx = CommandContext::new(cli)?;
    let plugin = ctx.plugin(None)?;

    // An importer puts the specifier inside the remote namespace.
    let hook_args = match &args.importer {
        Some(importer) => HookArgs::import(&args.specifier, importer, NAMESPACE),
        None => HookArgs::entry(&args.specifier),
    };

    match plugin.resolve(hook_args).await? {
        Some(resolved) => {
            println!("{}", resolved.path.green());
            if cli.verbose {
                println!("{} {}", "namespace:".dimmed(), resolved.namespace);
            }
        }
        None => println!("{} {}", "declined".yellow(), args.specifier.dimmed()),
    }

    Ok(())
}
