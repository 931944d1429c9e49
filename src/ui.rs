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

//! Terminal and JSON rendering of per-host results.

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::config::Config;
use crate::executor::HostResults;

/// Renders one host's value as display lines.
pub trait RenderLines {
    fn render_lines(&self) -> Vec<String>;
}

impl RenderLines for Vec<String> {
    fn render_lines(&self) -> Vec<String> {
        self.clone()
    }
}

impl RenderLines for bool {
    fn render_lines(&self) -> Vec<String> {
        vec![render_bool(*self)]
    }
}

impl RenderLines for BTreeMap<String, bool> {
    fn render_lines(&self) -> Vec<String> {
        self.iter()
            .map(|(key, value)| format!("{key} => {}", render_bool(*value)))
            .collect()
    }
}

impl RenderLines for BTreeMap<String, String> {
    fn render_lines(&self) -> Vec<String> {
        self.iter()
            .map(|(key, value)| format!("{key} => {value}"))
            .collect()
    }
}

fn render_bool(value: bool) -> String {
    if value {
        "true".green().to_string()
    } else {
        "false".red().to_string()
    }
}

pub struct OutputFormatter;

impl OutputFormatter {
    /// One block per host: a status line followed by the indented value.
    pub fn format_results<T: RenderLines>(results: &HostResults<T>) -> String {
        let mut output = String::new();

        for (host, result) in results.iter() {
            match result {
                Ok(value) => {
                    output.push_str(&format!("{} {}\n", "✓".green(), host.bold()));
                    for line in value.render_lines() {
                        output.push_str(&format!("    {line}\n"));
                    }
                }
                Err(e) => {
                    output.push_str(&format!("{} {}\n", "✗".red(), host.bold()));
                    output.push_str(&format!("    {}\n", e.to_string().red()));
                }
            }
        }

        output
    }

    /// `{"host": {"ok": value}}` or `{"host": {"error": "message"}}`.
    pub fn to_json<T: Serialize>(results: &HostResults<T>) -> Value {
        let mut hosts = Map::new();
        for (host, result) in results.iter() {
            let entry = match result {
                Ok(value) => match serde_json::to_value(value) {
                    Ok(value) => json!({ "ok": value }),
                    Err(e) => json!({ "error": format!("failed to serialize result: {e}") }),
                },
                Err(e) => json!({ "error": e.to_string() }),
            };
            hosts.insert(host.to_string(), entry);
        }
        Value::Object(hosts)
    }

    /// One-line tally; failures are split into execution failures (connection,
    /// authentication, exit status, timeout) and output that could not be
    /// interpreted.
    pub fn format_summary<T>(results: &HostResults<T>) -> String {
        let total = results.len();
        let (execution, interpretation) =
            results
                .failures()
                .fold((0, 0), |(execution, interpretation), (_, error)| {
                    if error.is_remote() {
                        (execution + 1, interpretation)
                    } else {
                        (execution, interpretation + 1)
                    }
                });
        let failed = execution + interpretation;

        if failed == 0 {
            format!(
                "{} {}",
                "●".green(),
                format!("All {total} host(s) succeeded").green()
            )
        } else {
            format!(
                "{} {} succeeded, {} failed ({} during execution, {} while interpreting output)",
                "●".yellow(),
                (total - failed).to_string().green(),
                failed.to_string().red(),
                execution,
                interpretation
            )
        }
    }

    pub fn format_groups(config: &Config) -> String {
        if config.groups.is_empty() {
            return format!("{}\n", "No groups configured".dimmed());
        }

        let mut output = String::new();
        for (name, group) in &config.groups {
            output.push_str(&format!(
                "{} ({} host(s))\n",
                name.cyan().bold(),
                group.hosts.len()
            ));
            for host in &group.hosts {
                output.push_str(&format!("    {}\n", host.to_host_id()));
            }
        }
        output
    }
}
