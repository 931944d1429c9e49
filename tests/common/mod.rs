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

//! In-process stand-in for the remote execution boundary.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleetq::{
    CommandResult, CredentialStore, Elevation, FleetError, FleetRunner, Node, RemoteExecutionError,
    RemoteExecutor, SecretPrompt, SudoPassword,
};

#[derive(Debug, Clone)]
pub enum Reply {
    /// Exit 0 with this stdout
    Output(String),
    /// Exit with this code and stderr
    Exit(i32, String),
    Unreachable,
    /// Never answers in practice
    Hang,
    Panic,
}

/// Executor answering from a per-host script.
#[derive(Default)]
pub struct MockExecutor {
    default: Option<Reply>,
    replies: HashMap<String, Reply>,
    delays: HashMap<String, u64>,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub seen: Mutex<Vec<Seen>>,
}

/// What one `execute` call received.
#[derive(Debug, Clone)]
pub struct Seen {
    pub host: String,
    pub command: String,
    pub sudo_user: Option<String>,
    pub password: Option<Vec<u8>>,
}

impl MockExecutor {
    /// Every host prints `stdout`.
    pub fn printing(stdout: &str) -> Self {
        Self {
            default: Some(Reply::Output(stdout.to_string())),
            ..Self::default()
        }
    }

    pub fn reply(mut self, host: &str, reply: Reply) -> Self {
        self.replies.insert(host.to_string(), reply);
        self
    }

    /// Delay the answer for `host` by `millis`.
    pub fn delay(mut self, host: &str, millis: u64) -> Self {
        self.delays.insert(host.to_string(), millis);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteExecutor for MockExecutor {
    async fn execute(
        &self,
        node: &Node,
        command: &str,
        elevation: Option<&Elevation>,
    ) -> Result<CommandResult, FleetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(Seen {
            host: node.id.clone(),
            command: command.to_string(),
            sudo_user: elevation.map(|e| e.user.clone()),
            password: elevation.map(|e| e.password.as_bytes().to_vec()),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(millis) = self.delays.get(&node.id) {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self
            .replies
            .get(&node.id)
            .or(self.default.as_ref())
            .cloned()
            .unwrap_or(Reply::Output(String::new()));

        match reply {
            Reply::Output(stdout) => Ok(CommandResult::new(node.id.clone(), stdout, 0)),
            Reply::Exit(code, stderr) => {
                Ok(CommandResult::new(node.id.clone(), Vec::new(), code).with_stderr(stderr))
            }
            Reply::Unreachable => Err(RemoteExecutionError::ConnectionFailed {
                host: node.id.clone(),
                message: "Connection refused".to_string(),
            }
            .into()),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(CommandResult::new(node.id.clone(), Vec::new(), 0))
            }
            Reply::Panic => panic!("executor blew up on {}", node.id),
        }
    }
}

/// Prompt that counts how often it is asked.
pub struct CountingPrompt {
    pub calls: AtomicUsize,
    answer: String,
}

impl CountingPrompt {
    pub fn new(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            answer: answer.to_string(),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SecretPrompt for CountingPrompt {
    fn prompt_secret(&self, _prompt: &str) -> Result<SudoPassword, FleetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(10));
        SudoPassword::new(self.answer.clone())
    }
}

/// Runner over `executor` with a prompt answering `unused`.
pub fn runner(executor: Arc<MockExecutor>) -> FleetRunner {
    let store = CredentialStore::new(CountingPrompt::new("unused")).read_env(false);
    FleetRunner::new(executor).with_credentials(Arc::new(store))
}

/// Lines that `echo` would print for an indented here-doc.
pub const SRC_ALL_RUNNING: &str = "\n    process1: running\n    process2: running\n    process3: running\n    ";
pub const SRC_ONE_STOPPED: &str = "\n    process1: running\n    process2: running\n    process3: stopped\n    ";
pub const SRC_THREAD_STATUS: &str = "\n    thread: enable\n    status: OK\n    ";
