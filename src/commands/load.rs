// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Load command implementation.

use anyhow::{Result, bail};
use futures::stream::{self, StreamExt};
use owo_colors::OwoColorize;
use urlimport_plugin::PluginError;

use crate::cli::{Cli, LoadArgs};
use crate::commands::CommandContext;

pub async fn run(args: &LoadArgs, cli: &Cli) -> Result<()> {
    let ctx = CommandContext::new(cli)?;
    let driver = ctx.driver()?;
    let concurrency = args.concurrency.unwrap_or(ctx.config.concurrency).max(1);

    let results: Vec<_> = stream::iter(&args.specifiers)
        .map(|specifier| {
            let driver = &driver;
            async move { (specifier, driver.resolve_and_load(specifier).await) }
        })
        .buffered(concurrency)
        .collect()
        .await;

    let mut failed = 0;
    for (specifier, result) in results {
        match result {
            Ok(module) if args.print => {
                print!("{}", module.result.text());
            }
            Ok(module) => {
                println!(
                    "{} {} {} ({})",
                    specifier.cyan(),
                    module.resolved.path.dimmed(),
                    module.result.loader.to_string().green(),
                    format_bytes(module.result.contents.len() as u64)
                );
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}", failure_message(specifier, &e));
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} modules failed to load", failed, args.specifiers.len());
    }
    Ok(())
}

fn failure_message(specifier: &str, err: &PluginError) -> String {
    format!("{} {}: {}", "failed".red(), specifier, err)
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_names_specifier_and_error() {
        let err = PluginError::Status {
            url: "https://esm.sh/nope?bundle".to_string(),
            status: 404,
        };
        let message = failure_message("esm:nope", &err);
        assert_eq!(message.matches("esm:nope").count(), 1);
        assert!(message.ends_with("esm:nope: Failed to fetch https://esm.sh/nope?bundle: HTTP 404"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }
}
