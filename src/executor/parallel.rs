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

//! Core fan-out runner.

use futures::future::join_all;
use indicatif::{MultiProgress, ProgressDrawTarget};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{FleetError, RemoteExecutionError};
use crate::node::Node;
use crate::security::CredentialStore;
use crate::ssh::{Elevation, RemoteExecutor, SshExecutor, SshOptions};

use super::execution_strategy::{
    create_progress_style, execute_query_task, setup_progress_bar, TaskContext,
};
use super::result_types::HostResults;

/// Hosts contacted at once when nothing else is configured.
pub const DEFAULT_PARALLEL: usize = 10;

// Command execution timeout:
// - 5 minutes (300s) handles package listings and slow service checks
// - 0 disables the limit
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Which hosts to contact and how.
#[derive(Debug, Clone)]
pub struct Target {
    /// Host identifiers, `[user@]host[:port]`
    pub hosts: Vec<String>,
    /// Run the command as this user through sudo
    pub user: Option<String>,
    /// Hide progress and raw output
    pub quiet: bool,
}

impl Target {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
            user: None,
            quiet: true,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Parse the host list, dropping repeated identifiers.
    pub fn nodes(&self) -> Result<Vec<Node>, FleetError> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            let node = Node::parse(host, None, None)?;
            if seen.insert(node.id.clone()) {
                nodes.push(node);
            }
        }

        if nodes.is_empty() {
            return Err(FleetError::NoHosts);
        }
        Ok(nodes)
    }
}

/// Runs one command on many hosts at once and interprets each host's output.
pub struct FleetRunner {
    pub(crate) executor: Arc<dyn RemoteExecutor>,
    pub(crate) credentials: Arc<CredentialStore>,
    pub(crate) max_parallel: usize,
    pub(crate) timeout_secs: u64,
    pub(crate) warn_only: bool,
}

impl FleetRunner {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self {
            executor,
            credentials: Arc::new(CredentialStore::terminal()),
            max_parallel: DEFAULT_PARALLEL,
            timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            warn_only: false,
        }
    }

    /// Runner that reaches hosts through the system `ssh` client.
    pub fn ssh(options: SshOptions) -> Self {
        Self::new(Arc::new(SshExecutor::new(options)))
    }

    /// Set the credential store; share one store between runners to prompt once.
    pub fn with_credentials(mut self, credentials: Arc<CredentialStore>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the number of hosts contacted at once (at least one).
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Set the per-host command timeout in seconds; 0 means unlimited.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Accept non-zero exit statuses and interpret the output anyway.
    pub fn with_warn_only(mut self, warn_only: bool) -> Self {
        self.warn_only = warn_only;
        self
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Run `command` on every target host and interpret each host's
    /// normalized output with `interpret`.
    ///
    /// The sudo password, when needed, is obtained before any host starts.
    /// Failures after that point are recorded per host.
    pub async fn run<T, F>(
        &self,
        command: &str,
        target: &Target,
        interpret: F,
    ) -> Result<HostResults<T>, FleetError>
    where
        T: Send + 'static,
        F: Fn(Vec<String>) -> Result<T, FleetError> + Send + Sync + 'static,
    {
        let nodes = target.nodes()?;

        let elevation = match &target.user {
            Some(user) => {
                let password = self.credentials.sudo_password(user).await?;
                Some(Arc::new(Elevation {
                    user: user.clone(),
                    password,
                }))
            }
            None => None,
        };

        tracing::info!("Running on {} host(s): {}", nodes.len(), command);

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let multi_progress = if target.quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        let style = create_progress_style();
        let interpret = Arc::new(interpret);
        let ctx = TaskContext {
            executor: Arc::clone(&self.executor),
            command: Arc::from(command),
            elevation,
            timeout_secs: self.timeout_secs,
            warn_only: self.warn_only,
            echo_output: !target.quiet,
        };

        let tasks: Vec<_> = nodes
            .iter()
            .map(|node| {
                let node = node.clone();
                let ctx = ctx.clone();
                let interpret = Arc::clone(&interpret);
                let semaphore = Arc::clone(&semaphore);
                let pb = setup_progress_bar(&multi_progress, &node, style.clone(), "Connecting...");

                tokio::spawn(
                    async move { execute_query_task(node, ctx, interpret, semaphore, pb).await },
                )
            })
            .collect();

        let results = join_all(tasks).await;
        Ok(collect_results(&nodes, results))
    }
}

/// Pair task results with their nodes, turning task panics into host failures.
fn collect_results<T>(
    nodes: &[Node],
    results: Vec<Result<Result<T, FleetError>, tokio::task::JoinError>>,
) -> HostResults<T> {
    nodes
        .iter()
        .zip(results)
        .map(|(node, result)| {
            let result = result.unwrap_or_else(|e| {
                tracing::error!("Task failed for node {}: {}", node.host, e);
                Err(RemoteExecutionError::TaskFailed {
                    host: node.id.clone(),
                    message: format!("task execution failed: {e}"),
                }
                .into())
            });
            (node.id.clone(), result)
        })
        .collect()
}
