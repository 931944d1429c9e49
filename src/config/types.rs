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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration structure.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub defaults: Settings,

    #[serde(default)]
    pub groups: BTreeMap<String, Group>,
}

/// Connection and execution settings.
///
/// Used for the global `defaults` section and, flattened, inside each group.
/// Unset fields fall through to the next level.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    /// ssh login user
    pub user: Option<String>,
    pub port: Option<u16>,
    pub ssh_key: Option<String>,
    pub parallel: Option<usize>,
    /// Per-host command timeout in seconds, 0 for unlimited
    pub timeout: Option<u64>,
    pub connect_timeout: Option<u64>,
    pub warn_only: Option<bool>,
    /// User commands run as through sudo
    pub sudo_user: Option<String>,
}

/// A named set of hosts.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Group {
    pub hosts: Vec<HostConfig>,

    #[serde(flatten)]
    pub settings: Settings,
}

/// Host entry within a group.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum HostConfig {
    /// `[user@]host[:port]`
    Simple(String),
    Detailed {
        host: String,
        #[serde(default)]
        port: Option<u16>,
        #[serde(default)]
        user: Option<String>,
    },
}

impl HostConfig {
    /// The host identifier this entry stands for.
    pub fn to_host_id(&self) -> String {
        match self {
            HostConfig::Simple(host) => host.clone(),
            HostConfig::Detailed { host, port, user } => {
                let mut id = String::new();
                if let Some(user) = user {
                    id.push_str(user);
                    id.push('@');
                }
                id.push_str(host);
                if let Some(port) = port {
                    id.push(':');
                    id.push_str(&port.to_string());
                }
                id
            }
        }
    }
}
