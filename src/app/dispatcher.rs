// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command dispatcher for routing CLI commands to their implementations

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{
    cli::{Cli, Commands, FilterArgs},
    executor::HostResults,
    filter::{egrep, egrep_startswith, pipe},
    ui::{OutputFormatter, RenderLines},
};

use super::initialization::AppContext;

/// Run the selected subcommand.
///
/// Returns `Ok(false)` when any host failed or a validation did not hold.
pub async fn dispatch_command(cli: &Cli, ctx: &AppContext) -> Result<bool> {
    match &cli.command {
        Commands::Groups => {
            print!("{}", OutputFormatter::format_groups(&ctx.config));
            Ok(true)
        }
        Commands::Egrep { filter } => {
            println!("{}", build_filter(filter)?);
            Ok(true)
        }
        Commands::Lines { filter, command } => {
            let mut command = Cli::command_text(command);
            if !filter.is_empty() {
                command = pipe(&command, &build_filter(filter)?);
            }
            let results = ctx
                .build_runner()
                .list_output_lines(&command, &ctx.target(cli.show_output)?)
                .await?;
            Ok(report(&results, cli.json))
        }
        Commands::Contains { values, command } => {
            let results = ctx
                .build_runner()
                .check_contains_any(
                    &Cli::command_text(command),
                    values,
                    &ctx.target(cli.show_output)?,
                )
                .await?;
            Ok(report(&results, cli.json))
        }
        Commands::Values {
            key,
            delimiter,
            command,
        } => {
            let results = ctx
                .build_runner()
                .extract_values_by_key(
                    &Cli::command_text(command),
                    key,
                    delimiter,
                    &ctx.target(cli.show_output)?,
                )
                .await?;
            Ok(report(&results, cli.json))
        }
        Commands::Dict { delimiter, command } => {
            let results = ctx
                .build_runner()
                .extract_key_value_map(
                    &Cli::command_text(command),
                    delimiter,
                    &ctx.target(cli.show_output)?,
                )
                .await?;
            Ok(report(&results, cli.json))
        }
        Commands::Validate {
            key,
            value,
            command,
        } => {
            let results = ctx
                .build_runner()
                .validate_lines_match_value(
                    &Cli::command_text(command),
                    key,
                    value,
                    &ctx.target(cli.show_output)?,
                )
                .await?;
            let held = results.successes().all(|(_, valid)| *valid);
            Ok(report(&results, cli.json) && held)
        }
        Commands::ValidateKv { expect, command } => {
            // Repeated keys keep the last expectation
            let expected: BTreeMap<String, String> = expect.iter().cloned().collect();
            let results = ctx
                .build_runner()
                .validate_key_value_map(
                    &Cli::command_text(command),
                    &expected,
                    &ctx.target(cli.show_output)?,
                )
                .await?;
            let held = results
                .successes()
                .all(|(_, checks)| checks.values().all(|valid| *valid));
            Ok(report(&results, cli.json) && held)
        }
    }
}

fn build_filter(filter: &FilterArgs) -> Result<String> {
    let built = if filter.startswith {
        egrep_startswith(&filter.keywords, filter.excludes.clone())?
    } else {
        egrep(&filter.keywords, filter.excludes.clone())?
    };
    Ok(built)
}

/// Print results and return whether every host succeeded.
fn report<T: RenderLines + Serialize>(results: &HostResults<T>, json: bool) -> bool {
    if json {
        let value = OutputFormatter::to_json(results);
        match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{text}"),
            Err(e) => tracing::error!("Failed to render JSON output: {}", e),
        }
    } else {
        print!("{}", OutputFormatter::format_results(results));
        println!("\n{}", OutputFormatter::format_summary(results));
    }

    for (host, error) in results.failures() {
        tracing::debug!("Host {} failed: {}", host, error);
    }

    results.all_succeeded()
}
