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

//! Group and setting resolution.

use anyhow::Result;

use super::types::{Config, Group, Settings};
use super::utils::expand_env_vars;

impl Config {
    /// Get a group by name.
    pub fn get_group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    /// Host identifiers of a group, with environment variables expanded.
    pub fn resolve_hosts(&self, group_name: &str) -> Result<Vec<String>> {
        let group = self.get_group(group_name).ok_or_else(|| {
            anyhow::anyhow!(
                "Group '{}' not found in configuration.\nAvailable groups: {}",
                group_name,
                self.group_names().join(", ")
            )
        })?;

        Ok(group
            .hosts
            .iter()
            .map(|host| expand_env_vars(&host.to_host_id()))
            .collect())
    }

    /// Settings for `group_name` with unset values taken from `defaults`.
    pub fn resolve_settings(&self, group_name: Option<&str>) -> Settings {
        match group_name.and_then(|name| self.get_group(name)) {
            Some(group) => group.settings.clone().or(&self.defaults),
            None => self.defaults.clone(),
        }
    }
}

impl Settings {
    /// Fill every unset field from `fallback`.
    pub fn or(self, fallback: &Settings) -> Settings {
        Settings {
            user: self.user.or_else(|| fallback.user.clone()),
            port: self.port.or(fallback.port),
            ssh_key: self.ssh_key.or_else(|| fallback.ssh_key.clone()),
            parallel: self.parallel.or(fallback.parallel),
            timeout: self.timeout.or(fallback.timeout),
            connect_timeout: self.connect_timeout.or(fallback.connect_timeout),
            warn_only: self.warn_only.or(fallback.warn_only),
            sudo_user: self.sudo_user.or_else(|| fallback.sudo_user.clone()),
        }
    }
}
