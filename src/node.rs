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

use std::fmt;

use crate::error::FleetError;

/// A remote host a command is dispatched to.
///
/// `id` is the identifier exactly as the caller wrote it and is the key under
/// which the host's result is reported. User and port are left unset when not
/// given so that the ssh client configuration can supply them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
}

impl Node {
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            id: host.clone(),
            host,
            port: None,
            username: None,
        }
    }

    pub fn parse(
        node_str: &str,
        default_user: Option<&str>,
        default_port: Option<u16>,
    ) -> Result<Self, FleetError> {
        // Parse formats:
        // - host
        // - host:port
        // - user@host
        // - user@host:port
        // - [v6addr]:port, or a bare v6addr without a port
        let id = node_str.trim();
        if id.is_empty() {
            return Err(invalid(node_str, "host cannot be empty"));
        }

        let (user_part, host_part) = match id.split_once('@') {
            Some((user, rest)) => (Some(user), rest),
            None => (None, id),
        };

        if user_part.is_some_and(str::is_empty) {
            return Err(invalid(node_str, "user cannot be empty"));
        }

        let (host, port) = if let Some(bracketed) = host_part.strip_prefix('[') {
            // [v6] or [v6]:port
            let (host, rest) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid(node_str, "missing ']' after IPv6 address"))?;
            match rest {
                "" => (host, default_port),
                _ => match rest.strip_prefix(':') {
                    Some(port_str) => (host, Some(parse_port(node_str, port_str)?)),
                    None => return Err(invalid(node_str, "unexpected text after ']'")),
                },
            }
        } else if host_part.matches(':').count() > 1 {
            // Bare IPv6 address; a port needs the bracketed form
            (host_part, default_port)
        } else {
            match host_part.rsplit_once(':') {
                Some((host, port_str)) => (host, Some(parse_port(node_str, port_str)?)),
                None => (host_part, default_port),
            }
        };

        if host.is_empty() {
            return Err(invalid(node_str, "host cannot be empty"));
        }

        Ok(Node {
            id: id.to_string(),
            host: host.to_string(),
            port,
            username: user_part.or(default_user).map(str::to_string),
        })
    }

    /// The `[user@]host` destination passed to ssh.
    pub fn destination(&self) -> String {
        match &self.username {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

fn parse_port(node_str: &str, port_str: &str) -> Result<u16, FleetError> {
    port_str
        .parse::<u16>()
        .map_err(|_| invalid(node_str, &format!("invalid port number '{port_str}'")))
}

fn invalid(host: &str, reason: &str) -> FleetError {
    FleetError::InvalidHost {
        host: host.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
