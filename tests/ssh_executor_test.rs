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

//! Runs the ssh executor against a stand-in `ssh` that executes the remote
//! command locally.
//!
//! Tests are serial: a script written while another test forks can fail to
//! exec with "text file busy".

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fleetq::{
    CredentialStore, Elevation, FleetError, FleetRunner, Node, RemoteExecutionError,
    RemoteExecutor, SshExecutor, SshOptions, SudoPassword, Target,
};
use serial_test::serial;
use tempfile::TempDir;

/// The last argument is the remote command; everything before it is ssh's.
/// Scripts next to it (a stand-in `sudo`) shadow the system ones.
const FAKE_SSH: &str = "#!/bin/sh\n\
PATH=\"$(dirname \"$0\"):$PATH\"\n\
for last; do :; done\n\
exec /bin/sh -c \"$last\"\n";

/// sudo with a NOPASSWD rule: runs the command without reading stdin.
const SUDO_NOPASSWD: &str = "#!/bin/sh\n\
while [ \"$1\" != \"--\" ]; do shift; done\n\
shift\n\
exec \"$@\"\n";

/// sudo that prints its `-p` prompt and accepts only `hunter2`.
const SUDO_PASSWORD: &str = "#!/bin/sh\n\
prompt=\n\
while [ \"$1\" != \"--\" ]; do\n\
  if [ \"$1\" = \"-p\" ]; then shift; prompt=\"$1\"; fi\n\
  shift\n\
done\n\
shift\n\
printf '%s' \"$prompt\" >&2\n\
read -r password\n\
if [ \"$password\" != \"hunter2\" ]; then\n\
  echo 'Sorry, try again.' >&2\n\
  echo 'sudo: 1 incorrect password attempt' >&2\n\
  exit 1\n\
fi\n\
exec \"$@\"\n";

fn install(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn fake_ssh(dir: &Path) -> PathBuf {
    install(dir, "ssh", FAKE_SSH)
}

fn elevation(password: &str) -> Elevation {
    Elevation {
        user: "root".to_string(),
        password: Arc::new(SudoPassword::new(password.to_string()).unwrap()),
    }
}

fn sudo_executor(dir: &Path, sudo: &str) -> SshExecutor {
    install(dir, "sudo", sudo);
    SshExecutor::new(SshOptions::default().with_program(fake_ssh(dir)))
}

#[tokio::test]
#[serial]
async fn test_ssh_executor_with_local_shell() {
    let dir = TempDir::new().unwrap();
    let options = SshOptions::default().with_program(fake_ssh(dir.path()));
    let executor = SshExecutor::new(options.clone());
    let node = Node::new("localhost");

    let result = executor
        .execute(&node, "echo out; echo err >&2", None)
        .await
        .unwrap();
    assert_eq!(result.host, "localhost");
    assert_eq!(result.stdout_string(), "out\n");
    assert_eq!(result.stderr_string(), "err\n");
    assert!(result.is_success());

    // An ordinary failing exit is the command's business, not the transport's
    let result = executor.execute(&node, "exit 3", None).await.unwrap();
    assert_eq!(result.exit_status, 3);
    assert!(!result.is_success());

    let err = executor
        .execute(
            &node,
            "echo 'ssh: connect to host localhost port 22: Connection refused' >&2; exit 255",
            None,
        )
        .await
        .unwrap_err();
    match err {
        FleetError::RemoteExecution(RemoteExecutionError::ConnectionFailed { host, message }) => {
            assert_eq!(host, "localhost");
            assert!(message.contains("Connection refused"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let store = CredentialStore::terminal().read_env(false);
    let runner = FleetRunner::ssh(options).with_credentials(Arc::new(store));
    let results = runner
        .list_output_lines(
            "printf '\\n    process1: running\\n\\n    process2: stopped\\n'",
            &Target::new(["localhost", "127.0.0.1"]),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    for (_, lines) in results.successes() {
        assert_eq!(lines, &vec!["process1: running", "process2: stopped"]);
    }
}

#[tokio::test]
#[serial]
async fn test_missing_ssh_binary_is_a_spawn_error() {
    let dir = TempDir::new().unwrap();
    let options = SshOptions::default().with_program(dir.path().join("no-such-ssh"));
    let executor = SshExecutor::new(options);

    let err = executor
        .execute(&Node::new("localhost"), "true", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FleetError::RemoteExecution(RemoteExecutionError::Spawn { .. })
    ));
}

#[tokio::test]
#[serial]
async fn test_sudo_password_accepted() {
    let dir = TempDir::new().unwrap();
    let executor = sudo_executor(dir.path(), SUDO_PASSWORD);

    let result = executor
        .execute(&Node::new("localhost"), "echo elevated", Some(&elevation("hunter2")))
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.stdout_string(), "elevated\n");
    // The prompt sudo printed is not part of the command's stderr
    assert_eq!(result.stderr_string(), "");
}

#[tokio::test]
#[serial]
async fn test_sudo_password_rejected() {
    let dir = TempDir::new().unwrap();
    let executor = sudo_executor(dir.path(), SUDO_PASSWORD);

    let err = executor
        .execute(&Node::new("localhost"), "echo elevated", Some(&elevation("wrong")))
        .await
        .unwrap_err();

    match err {
        FleetError::RemoteExecution(RemoteExecutionError::AuthFailed { host, message }) => {
            assert_eq!(host, "localhost");
            assert!(message.contains("Sorry, try again"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
#[serial]
async fn test_sudo_without_password_never_sees_it() {
    let dir = TempDir::new().unwrap();
    let executor = sudo_executor(dir.path(), SUDO_NOPASSWD);

    let result = executor
        .execute(
            &Node::new("localhost"),
            "echo ran; cat",
            Some(&elevation("hunter2")),
        )
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.stdout_string(), "ran\n");
    assert!(!result.stdout_string().contains("hunter2"));
    assert!(!result.stderr_string().contains("hunter2"));
}
