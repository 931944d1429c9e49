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

//! Remote command execution boundary.
//!
//! The fan-out executor only talks to hosts through [`RemoteExecutor`]. The
//! default implementation, [`SshExecutor`], drives the system OpenSSH client
//! so that authentication, host keys and `~/.ssh/config` stay with the user's
//! existing setup.

mod command;
mod result;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::FleetError;
use crate::node::Node;
use crate::security::SudoPassword;

pub use command::{SshExecutor, SshOptions, DEFAULT_CONNECT_TIMEOUT_SECS, SSH_CONNECTION_ERROR_CODE};
pub use result::CommandResult;

/// Run a command as another user on the remote host.
#[derive(Debug, Clone)]
pub struct Elevation {
    pub user: String,
    pub password: Arc<SudoPassword>,
}

/// Executes one command on one host.
///
/// Implementations capture standard output and standard error separately,
/// never allocate a pseudo-terminal, and report transport or authentication
/// failures as errors rather than as empty output. A command that ran to
/// completion is returned as a [`CommandResult`] whatever its exit status.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn execute(
        &self,
        node: &Node,
        command: &str,
        elevation: Option<&Elevation>,
    ) -> Result<CommandResult, FleetError>;
}
