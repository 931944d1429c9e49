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

//! Per-host task execution and progress tracking.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::error::{FleetError, RemoteExecutionError};
use crate::interpret::normalize;
use crate::node::Node;
use crate::ssh::{CommandResult, Elevation, RemoteExecutor};

/// Progress bar tick rate configuration.
const PROGRESS_BAR_TICK_RATE_MS: u64 = 80;

/// Width of the host column in progress bars.
const NODE_DISPLAY_WIDTH: usize = 20;

/// Everything a host task needs besides its node.
#[derive(Clone)]
pub(crate) struct TaskContext {
    pub executor: Arc<dyn RemoteExecutor>,
    pub command: Arc<str>,
    pub elevation: Option<Arc<Elevation>>,
    /// Seconds, 0 means unlimited
    pub timeout_secs: u64,
    pub warn_only: bool,
    /// Echo each raw output line as `[host] out: ...`
    pub echo_output: bool,
}

/// Create a progress bar style for host tasks.
pub(crate) fn create_progress_style() -> ProgressStyle {
    match ProgressStyle::default_bar().template("{prefix:.bold} {spinner:.cyan} {msg}") {
        Ok(style) => style.tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷ "),
        Err(e) => {
            tracing::debug!("Failed to create progress bar template: {}", e);
            ProgressStyle::default_spinner()
        }
    }
}

/// Format node display name for progress bars.
pub(crate) fn format_node_display(node: &Node) -> String {
    let name = node.to_string();
    if name.chars().count() > NODE_DISPLAY_WIDTH {
        let head: String = name.chars().take(NODE_DISPLAY_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        name
    }
}

/// Setup a progress bar for a node operation.
pub(crate) fn setup_progress_bar(
    multi_progress: &MultiProgress,
    node: &Node,
    style: ProgressStyle,
    initial_message: &str,
) -> ProgressBar {
    let pb = multi_progress.add(ProgressBar::new_spinner());
    pb.set_style(style);
    pb.set_prefix(format!("[{}]", format_node_display(node)));
    pb.set_message(format!("{}", initial_message.cyan()));
    pb.enable_steady_tick(Duration::from_millis(PROGRESS_BAR_TICK_RATE_MS));
    pb
}

/// Run the command on one node, then normalize and interpret its output.
pub(crate) async fn execute_query_task<T, F>(
    node: Node,
    ctx: TaskContext,
    interpret: Arc<F>,
    semaphore: Arc<Semaphore>,
    pb: ProgressBar,
) -> Result<T, FleetError>
where
    F: Fn(Vec<String>) -> Result<T, FleetError> + Send + Sync,
{
    let _permit = match semaphore.acquire().await {
        Ok(permit) => permit,
        Err(e) => {
            pb.finish_with_message(format!("{} {}", "●".red(), "Semaphore closed".red()));
            return Err(RemoteExecutionError::TaskFailed {
                host: node.id.clone(),
                message: format!("semaphore acquisition failed: {e}"),
            }
            .into());
        }
    };

    pb.set_message(format!("{}", "Executing...".blue()));

    let result = run_on_node(&node, &ctx).await.and_then(|output| {
        if ctx.echo_output {
            for line in output.stdout_string().lines() {
                pb.println(format!("[{node}] out: {line}"));
            }
        }
        interpret(normalize(&output.stdout_string()))
    });

    match &result {
        Ok(_) => pb.finish_with_message(format!("{} {}", "●".green(), "Success".green())),
        Err(e) => pb.finish_with_message(format!("{} {}", "●".red(), short_error(e).red())),
    }

    result
}

/// Execute on one node under the per-host timeout and apply the exit policy.
pub(crate) async fn run_on_node(
    node: &Node,
    ctx: &TaskContext,
) -> Result<CommandResult, FleetError> {
    let execution = ctx
        .executor
        .execute(node, &ctx.command, ctx.elevation.as_deref());

    let result = if ctx.timeout_secs == 0 {
        execution.await?
    } else {
        match tokio::time::timeout(Duration::from_secs(ctx.timeout_secs), execution).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    "Command timed out on {} after {} seconds",
                    node,
                    ctx.timeout_secs
                );
                return Err(RemoteExecutionError::Timeout {
                    host: node.id.clone(),
                    seconds: ctx.timeout_secs,
                }
                .into());
            }
        }
    };

    if !result.is_success() {
        if ctx.warn_only {
            tracing::warn!(
                "Command on {} exited with status {}, continuing",
                node,
                result.exit_status
            );
        } else {
            return Err(RemoteExecutionError::NonZeroExit {
                host: node.id.clone(),
                code: result.exit_status,
                stderr: result.stderr_string().trim().to_string(),
            }
            .into());
        }
    }

    Ok(result)
}

fn short_error(e: &FleetError) -> String {
    let error_msg = e.to_string();
    let first_line = error_msg.lines().next().unwrap_or("Unknown error");
    if first_line.chars().count() > 50 {
        let head: String = first_line.chars().take(47).collect();
        format!("{head}...")
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_node_display() {
        assert_eq!(format_node_display(&Node::new("ap01")), "ap01");
        assert_eq!(
            format_node_display(&Node::new("very-long-hostname.example.com")),
            "very-long-hostnam..."
        );
    }

    #[test]
    fn test_short_error_truncates() {
        let err = FleetError::Credential("x".repeat(80));
        let short = short_error(&err);
        assert_eq!(short.chars().count(), 50);
        assert!(short.ends_with("..."));
        assert_eq!(short_error(&FleetError::NoHosts), "no hosts specified");
    }
}
