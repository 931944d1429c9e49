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

//! One-shot acquisition of the sudo password.

use std::sync::Arc;
use tokio::sync::OnceCell;

use super::sudo::{get_sudo_password_from_env, SecretPrompt, SudoPassword, TerminalPrompt};
use crate::error::FleetError;

/// Holds the sudo password for the lifetime of a runner.
///
/// The first caller of [`CredentialStore::sudo_password`] obtains the secret
/// (environment first, then the prompt); concurrent callers wait on the same
/// initialization and every later caller reuses the stored value. A failed
/// acquisition leaves the store empty so the next call may try again.
pub struct CredentialStore {
    password: OnceCell<Arc<SudoPassword>>,
    prompt: Arc<dyn SecretPrompt>,
    read_env: bool,
}

impl CredentialStore {
    pub fn new(prompt: Arc<dyn SecretPrompt>) -> Self {
        Self {
            password: OnceCell::new(),
            prompt,
            read_env: true,
        }
    }

    /// Store that prompts on the controlling terminal.
    pub fn terminal() -> Self {
        Self::new(Arc::new(TerminalPrompt))
    }

    /// Store preloaded with a password; the prompt is never used.
    pub fn with_password(password: SudoPassword) -> Self {
        Self {
            password: OnceCell::new_with(Some(Arc::new(password))),
            prompt: Arc::new(TerminalPrompt),
            read_env: false,
        }
    }

    /// Whether `FLEETQ_SUDO_PASSWORD` is consulted before prompting.
    pub fn read_env(mut self, enabled: bool) -> Self {
        self.read_env = enabled;
        self
    }

    pub fn is_cached(&self) -> bool {
        self.password.initialized()
    }

    /// Return the sudo password for `user`, acquiring it on first use.
    pub async fn sudo_password(&self, user: &str) -> Result<Arc<SudoPassword>, FleetError> {
        self.password
            .get_or_try_init(|| self.acquire(user))
            .await
            .map(Arc::clone)
    }

    async fn acquire(&self, user: &str) -> Result<Arc<SudoPassword>, FleetError> {
        if self.read_env {
            if let Some(password) = get_sudo_password_from_env()? {
                tracing::debug!("Using sudo password from environment");
                return Ok(Arc::new(password));
            }
        }

        tracing::debug!("Prompting for sudo password for user {}", user);
        let prompt = Arc::clone(&self.prompt);
        let text = format!("[sudo] password for {user}: ");
        let password = tokio::task::spawn_blocking(move || prompt.prompt_secret(&text))
            .await
            .map_err(|e| FleetError::Credential(format!("prompt task failed: {e}")))??;

        Ok(Arc::new(password))
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("cached", &self.is_cached())
            .field("read_env", &self.read_env)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingPrompt {
        calls: AtomicUsize,
        answer: &'static str,
    }

    impl SecretPrompt for CountingPrompt {
        fn prompt_secret(&self, prompt: &str) -> Result<SudoPassword, FleetError> {
            assert!(prompt.contains("root"));
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            SudoPassword::new(self.answer.to_string())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_prompt_runs_once_under_concurrency() {
        let prompt = Arc::new(CountingPrompt {
            calls: AtomicUsize::new(0),
            answer: "hunter2",
        });
        let store = Arc::new(CredentialStore::new(prompt.clone()).read_env(false));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.sudo_password("root").await })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            let password = task.unwrap().unwrap();
            assert_eq!(password.as_bytes(), b"hunter2");
        }
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);
        assert!(store.is_cached());
    }

    #[tokio::test]
    async fn test_preloaded_password_skips_prompt() {
        let store = CredentialStore::with_password(SudoPassword::new("pw".to_string()).unwrap());
        assert!(store.is_cached());
        let password = store.sudo_password("root").await.unwrap();
        assert_eq!(password.as_bytes(), b"pw");
    }

    #[tokio::test]
    async fn test_failed_prompt_is_not_cached() {
        struct Refusing;
        impl SecretPrompt for Refusing {
            fn prompt_secret(&self, _prompt: &str) -> Result<SudoPassword, FleetError> {
                Err(FleetError::Credential("no terminal".to_string()))
            }
        }

        let store = CredentialStore::new(Arc::new(Refusing)).read_env(false);
        let err = store.sudo_password("root").await.unwrap_err();
        assert!(matches!(err, FleetError::Credential(_)));
        assert!(!store.is_cached());
    }
}
