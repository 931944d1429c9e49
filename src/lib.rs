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

//! Run one shell command on many hosts at once and turn each host's output
//! into structured results.
//!
//! ```no_run
//! use fleetq::{FleetRunner, SshOptions, Target};
//!
//! # async fn demo() -> Result<(), fleetq::FleetError> {
//! let runner = FleetRunner::ssh(SshOptions::default());
//! let target = Target::new(["ap01.example.com", "ap02.example.com"]);
//! let states = runner
//!     .check_contains_any("systemctl is-active nginx", &["active"], &target)
//!     .await?;
//! for (host, result) in states.iter() {
//!     println!("{host}: {result:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod interpret;
pub mod node;
pub mod query;
pub mod security;
pub mod ssh;
pub mod ui;
pub mod utils;

pub use error::{FleetError, RemoteExecutionError};
pub use executor::{FleetRunner, HostResults, Target};
pub use filter::{egrep, egrep_startswith, pipe, Excludes};
pub use node::Node;
pub use security::{CredentialStore, SecretPrompt, SudoPassword};
pub use ssh::{CommandResult, Elevation, RemoteExecutor, SshExecutor, SshOptions};
