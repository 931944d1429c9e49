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

//! Application initialization and settings resolution

use anyhow::Result;
use std::path::Path;

use crate::{
    cli::Cli,
    config::{expand_tilde, Config, Settings},
    executor::{FleetRunner, Target, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_PARALLEL},
    ssh::{SshOptions, DEFAULT_CONNECT_TIMEOUT_SECS},
};

/// Application context after initialization
#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    /// Hosts from `-H`, else from the selected group
    pub hosts: Vec<String>,
    /// Command-line flags layered over the group and global defaults
    pub settings: Settings,
}

impl AppContext {
    pub fn new(cli: &Cli, config: Config) -> Result<Self> {
        let mut settings =
            settings_from_cli(cli).or(&config.resolve_settings(cli.group.as_deref()));
        if cli.no_sudo {
            settings.sudo_user = None;
        }

        let hosts = match (&cli.hosts, &cli.group) {
            (Some(hosts), _) => hosts.clone(),
            (None, Some(group)) => config.resolve_hosts(group)?,
            (None, None) => Vec::new(),
        };

        Ok(Self {
            config,
            hosts,
            settings,
        })
    }

    /// Target for a query; `show_output` turns on progress and raw output.
    pub fn target(&self, show_output: bool) -> Result<Target> {
        if self.hosts.is_empty() {
            anyhow::bail!(
                "No hosts specified. Use -H host1,host2 or -g <group> from the configuration file."
            );
        }

        let mut target = Target::new(self.hosts.iter().cloned()).with_quiet(!show_output);
        if let Some(user) = &self.settings.sudo_user {
            target = target.with_user(user.clone());
        }
        Ok(target)
    }

    /// Runner over the system ssh client configured from the resolved settings.
    pub fn build_runner(&self) -> FleetRunner {
        let settings = &self.settings;
        let options = SshOptions::default()
            .with_login(settings.user.clone())
            .with_port(settings.port)
            .with_identity(
                settings
                    .ssh_key
                    .as_deref()
                    .map(|key| expand_tilde(Path::new(key))),
            )
            .with_connect_timeout(
                settings
                    .connect_timeout
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            );

        FleetRunner::ssh(options)
            .with_max_parallel(settings.parallel.unwrap_or(DEFAULT_PARALLEL))
            .with_timeout(settings.timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS))
            .with_warn_only(settings.warn_only.unwrap_or(false))
    }
}

/// Load the configuration file and build the context.
pub async fn initialize_app(cli: &Cli) -> Result<AppContext> {
    let config = Config::load_with_priority(cli.config.as_deref()).await?;
    AppContext::new(cli, config)
}

fn settings_from_cli(cli: &Cli) -> Settings {
    Settings {
        user: cli.login.clone(),
        port: None,
        ssh_key: cli
            .identity
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned()),
        parallel: cli.parallel,
        timeout: cli.timeout,
        connect_timeout: cli.connect_timeout,
        // The flag can only switch warn-only on
        warn_only: cli.warn_only.then_some(true),
        sudo_user: cli.sudo_user.clone(),
    }
}
