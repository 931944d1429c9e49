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

//! Error types for filter construction, output interpretation and remote execution.

use thiserror::Error;

/// Errors produced while building commands, interpreting output or executing
/// commands on remote hosts.
#[derive(Debug, Error)]
pub enum FleetError {
    /// `egrep` builder called without keywords and without exclusions
    #[error("empty pattern: egrep needs at least one keyword or exclusion")]
    EmptyPattern,

    /// More than one candidate key is a substring of the same line
    #[error("more than one key found: {keys:?} are in '{line}'")]
    AmbiguousKey { keys: Vec<String>, line: String },

    /// A line selected for splitting does not contain the delimiter
    #[error("line '{line}' does not contain delimiter '{delimiter}'")]
    MalformedLine { line: String, delimiter: String },

    /// Key/value splitting needs a non-empty delimiter
    #[error("delimiter cannot be empty")]
    EmptyDelimiter,

    /// A validation pattern failed to compile
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The target host list is empty
    #[error("no hosts specified")]
    NoHosts,

    /// A host identifier could not be parsed
    #[error("invalid host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    /// The elevated-privilege credential could not be obtained
    #[error("failed to obtain sudo password: {0}")]
    Credential(String),

    /// The remote execution boundary failed for one host
    #[error(transparent)]
    RemoteExecution(#[from] RemoteExecutionError),
}

impl FleetError {
    /// Whether this error came from the execution boundary rather than parsing.
    pub fn is_remote(&self) -> bool {
        matches!(self, FleetError::RemoteExecution(_))
    }
}

/// Failures of the delegated execution boundary, always scoped to one host.
#[derive(Debug, Error)]
pub enum RemoteExecutionError {
    /// The local ssh client could not be started
    #[error("failed to spawn ssh for {host}: {source}")]
    Spawn {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// ssh could not reach or negotiate with the host
    #[error("connection to {host} failed: {message}")]
    ConnectionFailed { host: String, message: String },

    /// Login or sudo authentication was rejected
    #[error("authentication failed on {host}: {message}")]
    AuthFailed { host: String, message: String },

    /// The command did not finish in time
    #[error("command did not complete within {seconds} seconds on {host}")]
    Timeout { host: String, seconds: u64 },

    /// The command ran but exited with a non-zero status
    #[error("command exited with status {code} on {host}: {stderr}")]
    NonZeroExit {
        host: String,
        code: i32,
        stderr: String,
    },

    /// The per-host task was cancelled or panicked
    #[error("task for {host} failed: {message}")]
    TaskFailed { host: String, message: String },
}
