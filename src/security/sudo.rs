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

//! Sudo password handling with automatic memory clearing.
//!
//! This module provides:
//! - `SudoPassword`: a wrapper for sudo passwords with automatic zeroization
//! - Sudo failure detection patterns for remote stderr
//! - Password sources: environment variable and terminal prompt
//!
//! Passwords are never logged or printed and are sent to the remote sudo on
//! its standard input, never on a command line.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::FleetError;

/// Environment variable consulted before prompting for a sudo password.
pub const SUDO_PASSWORD_ENV: &str = "FLEETQ_SUDO_PASSWORD";

/// Prompt handed to `sudo -p`; the password is only sent once it shows up on
/// stderr, and it is removed from the captured stderr afterwards.
pub const SUDO_PROMPT: &str = "[fleetq:sudo-password]";

/// Prompts sudo may print instead of [`SUDO_PROMPT`], e.g. when a PAM module
/// supplies its own. Matched case-insensitively.
pub const SUDO_PROMPT_PATTERNS: &[&str] = &[
    "[sudo] password for ",
    "password for ",
    "password:",
    "'s password:",
    "sudo password",
    "enter password",
];

/// Patterns indicating sudo authentication failure
pub const SUDO_FAILURE_PATTERNS: &[&str] = &[
    "sorry, try again",
    "incorrect password",
    "authentication failure",
    "sudo: 3 incorrect password attempts",
    "sudo: no password was provided",
    "is not in the sudoers file",
    "is not allowed to execute",
];

/// A sudo password that is cleared from memory when dropped.
///
/// Debug output never reveals the password, and each clone is zeroized
/// independently.
#[derive(Clone)]
pub struct SudoPassword {
    inner: SecretString,
}

impl SudoPassword {
    /// Wrap a non-empty password.
    pub fn new(password: String) -> Result<Self, FleetError> {
        if password.is_empty() {
            return Err(FleetError::Credential(
                "password cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            inner: SecretString::new(password.into_boxed_str()),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.expose_secret().as_bytes()
    }

    /// The password followed by the newline sudo waits for.
    ///
    /// The copy is a `Zeroizing<Vec<u8>>` so it is cleared as well.
    pub fn with_newline(&self) -> Zeroizing<Vec<u8>> {
        let mut bytes = self.inner.expose_secret().as_bytes().to_vec();
        bytes.push(b'\n');
        Zeroizing::new(bytes)
    }
}

impl fmt::Debug for SudoPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SudoPassword")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Check if the given output contains a sudo password prompt.
pub fn contains_sudo_prompt(output: &str) -> bool {
    if output.contains(SUDO_PROMPT) {
        return true;
    }
    let lower = output.to_lowercase();
    SUDO_PROMPT_PATTERNS
        .iter()
        .any(|pattern| lower.contains(*pattern))
}

/// Check if the given output contains a sudo authentication failure message.
pub fn contains_sudo_failure(output: &str) -> bool {
    let lower = output.to_lowercase();
    SUDO_FAILURE_PATTERNS
        .iter()
        .any(|pattern| lower.contains(*pattern))
}

/// Read the sudo password from `FLEETQ_SUDO_PASSWORD`, if set.
///
/// Environment variables can leak through process listings; this exists for
/// unattended runs only. A set but empty variable is an error.
pub fn get_sudo_password_from_env() -> Result<Option<SudoPassword>, FleetError> {
    match std::env::var(SUDO_PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => Ok(Some(SudoPassword::new(password)?)),
        Ok(_) => Err(FleetError::Credential(format!(
            "{SUDO_PASSWORD_ENV} is set but empty"
        ))),
        Err(_) => Ok(None),
    }
}

/// Source of a secret typed by the user.
pub trait SecretPrompt: Send + Sync {
    /// Ask for a secret. May block on terminal input.
    fn prompt_secret(&self, prompt: &str) -> Result<SudoPassword, FleetError>;
}

/// Reads the secret from the controlling terminal without echo.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl SecretPrompt for TerminalPrompt {
    fn prompt_secret(&self, prompt: &str) -> Result<SudoPassword, FleetError> {
        let password = rpassword::prompt_password(prompt)
            .map_err(|e| FleetError::Credential(format!("failed to read password: {e}")))?;

        if password.is_empty() {
            return Err(FleetError::Credential(
                "empty password not allowed".to_string(),
            ));
        }

        SudoPassword::new(password)
    }
}
