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

//! Handling of the elevated-privilege credential.
//!
//! The sudo password is requested at most once per [`CredentialStore`] and
//! shared read-only with every host task afterwards.

mod credentials;
mod sudo;

pub use credentials::CredentialStore;
pub use sudo::{
    contains_sudo_failure, contains_sudo_prompt, get_sudo_password_from_env, SecretPrompt,
    SudoPassword, TerminalPrompt, SUDO_FAILURE_PATTERNS, SUDO_PASSWORD_ENV, SUDO_PROMPT,
    SUDO_PROMPT_PATTERNS,
};
