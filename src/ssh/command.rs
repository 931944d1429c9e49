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

//! OpenSSH client driven as a child process.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

use super::{CommandResult, Elevation, RemoteExecutor};
use crate::error::{FleetError, RemoteExecutionError};
use crate::node::Node;
use crate::security::{contains_sudo_failure, contains_sudo_prompt, SudoPassword, SUDO_PROMPT};

/// Connection timeout handed to ssh when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// ssh exits with 255 when the error is its own rather than the remote command's.
pub const SSH_CONNECTION_ERROR_CODE: i32 = 255;

/// Options shared by every ssh invocation.
#[derive(Debug, Clone)]
pub struct SshOptions {
    /// ssh binary to run
    pub program: PathBuf,
    /// Login user for hosts that do not name one
    pub login: Option<String>,
    /// Port for hosts that do not name one
    pub port: Option<u16>,
    pub identity: Option<PathBuf>,
    /// Seconds, 0 leaves the decision to ssh
    pub connect_timeout: u64,
    /// Extra `-o` options, e.g. `StrictHostKeyChecking=accept-new`
    pub extra_options: Vec<String>,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ssh"),
            login: None,
            port: None,
            identity: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            extra_options: Vec::new(),
        }
    }
}

impl SshOptions {
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_login(mut self, login: Option<String>) -> Self {
        self.login = login;
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_identity(mut self, identity: Option<PathBuf>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout = seconds;
        self
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.extra_options.push(option.into());
        self
    }
}

/// [`RemoteExecutor`] backed by the system `ssh` binary.
///
/// Runs `ssh -T -o BatchMode=yes ... -- [user@]host <command>`. Password
/// logins are disabled so a host that would prompt fails instead of blocking
/// the whole fan-out. With an [`Elevation`] the command is wrapped in
/// `sudo -S` and the password is written to the remote standard input when
/// sudo asks for it.
#[derive(Debug, Clone, Default)]
pub struct SshExecutor {
    options: SshOptions,
}

impl SshExecutor {
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SshOptions {
        &self.options
    }

    /// Arguments passed to ssh for running `remote_command` on `node`.
    pub fn build_args(&self, node: &Node, remote_command: &str) -> Vec<String> {
        let mut args = vec!["-T".to_string(), "-o".to_string(), "BatchMode=yes".to_string()];

        if self.options.connect_timeout > 0 {
            args.push("-o".to_string());
            args.push(format!("ConnectTimeout={}", self.options.connect_timeout));
        }

        for option in &self.options.extra_options {
            args.push("-o".to_string());
            args.push(option.clone());
        }

        if let Some(port) = node.port.or(self.options.port) {
            args.push("-p".to_string());
            args.push(port.to_string());
        }

        if let Some(identity) = &self.options.identity {
            args.push("-i".to_string());
            args.push(identity.to_string_lossy().into_owned());
        }

        let destination = match (&node.username, &self.options.login) {
            (Some(_), _) | (None, None) => node.destination(),
            (None, Some(login)) => format!("{login}@{}", node.host),
        };

        // Destination and command are positional from here on
        args.push("--".to_string());
        args.push(destination);
        args.push(remote_command.to_string());
        args
    }
}

/// Wrap `command` so it runs under `sudo` as `user`.
///
/// sudo reads the password from standard input and announces that it wants
/// it with [`SUDO_PROMPT`] on stderr. The command itself reads `/dev/null`, so
/// nothing written for sudo can reach it.
pub fn sudo_command(user: &str, command: &str) -> String {
    let script = format!("exec </dev/null\n{command}");
    format!(
        "sudo -S -p {} -u {} -- sh -c {}",
        shell_words::quote(SUDO_PROMPT),
        shell_words::quote(user),
        shell_words::quote(&script)
    )
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn execute(
        &self,
        node: &Node,
        command: &str,
        elevation: Option<&Elevation>,
    ) -> Result<CommandResult, FleetError> {
        let remote_command = match elevation {
            Some(elevation) => sudo_command(&elevation.user, command),
            None => command.to_string(),
        };
        let args = self.build_args(node, &remote_command);

        tracing::debug!("Executing on {}: {}", node, remote_command);

        let mut cmd = Command::new(&self.options.program);
        cmd.args(&args)
            .stdin(if elevation.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out host is abandoned by dropping this future
            .kill_on_drop(true);

        let io_error = |source: std::io::Error| RemoteExecutionError::Spawn {
            host: node.id.clone(),
            source,
        };

        let mut child = cmd.spawn().map_err(io_error)?;

        let reply = match (elevation, child.stdin.take()) {
            (Some(elevation), Some(stdin)) => Some((stdin, &*elevation.password)),
            _ => None,
        };
        let (output, stderr) = tokio::try_join!(
            read_all(child.stdout.take()),
            collect_stderr(child.stderr.take(), reply, node),
        )
        .map_err(io_error)?;
        let status = child.wait().await.map_err(io_error)?;

        let result = CommandResult {
            host: node.id.clone(),
            output,
            stderr,
            exit_status: status.code().unwrap_or(-1),
        };

        tracing::debug!(
            "Command on {} completed with status: {}",
            node,
            result.exit_status
        );

        classify(node, result, elevation.is_some()).map_err(FleetError::from)
    }
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Drain stderr, sending the sudo password once a prompt appears.
///
/// The password is written at most once and stdin is dropped right after, so
/// a repeated prompt reads end of file and sudo gives up instead of waiting.
/// [`SUDO_PROMPT`] is removed from the returned bytes.
async fn collect_stderr<R, W>(
    stderr: Option<R>,
    mut reply: Option<(W, &SudoPassword)>,
    node: &Node,
) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut captured = Vec::new();
    let Some(mut stderr) = stderr else {
        return Ok(captured);
    };

    let mut chunk = [0u8; 1024];
    loop {
        let n = stderr.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        captured.extend_from_slice(&chunk[..n]);

        let sentinel = strip_sudo_prompt(&mut captured);
        if reply.is_none() || !(sentinel || awaits_password(&captured)) {
            continue;
        }
        if let Some((mut stdin, password)) = reply.take() {
            // A lost password surfaces as a sudo failure on stderr
            if let Err(e) = stdin.write_all(&password.with_newline()).await {
                tracing::debug!("Failed to send sudo password to {}: {}", node, e);
            }
        }
    }
    Ok(captured)
}

/// Remove every [`SUDO_PROMPT`] from `buf`; true when one was found.
fn strip_sudo_prompt(buf: &mut Vec<u8>) -> bool {
    let needle = SUDO_PROMPT.as_bytes();
    let mut found = false;
    while let Some(pos) = buf.windows(needle.len()).position(|w| w == needle) {
        buf.drain(pos..pos + needle.len());
        found = true;
    }
    found
}

/// Prompts are not newline-terminated, so only the unfinished last line counts.
fn awaits_password(captured: &[u8]) -> bool {
    let tail = match captured.iter().rposition(|&b| b == b'\n') {
        Some(pos) => &captured[pos + 1..],
        None => captured,
    };
    !tail.is_empty() && contains_sudo_prompt(&String::from_utf8_lossy(tail))
}

/// Separate ssh and sudo failures from ordinary command exits.
fn classify(
    node: &Node,
    result: CommandResult,
    elevated: bool,
) -> Result<CommandResult, RemoteExecutionError> {
    if result.is_success() {
        return Ok(result);
    }

    let stderr = result.stderr_string();
    let message = first_line(&stderr);

    if result.exit_status == SSH_CONNECTION_ERROR_CODE {
        if stderr.contains("Permission denied") {
            return Err(RemoteExecutionError::AuthFailed {
                host: node.id.clone(),
                message,
            });
        }
        return Err(RemoteExecutionError::ConnectionFailed {
            host: node.id.clone(),
            message,
        });
    }

    if elevated && contains_sudo_failure(&stderr) {
        return Err(RemoteExecutionError::AuthFailed {
            host: node.id.clone(),
            message,
        });
    }

    Ok(result)
}

fn first_line(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no error output")
        .to_string()
}
