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

//! Query operations over a fleet.
//!
//! Each operation runs one command on every target host and applies one
//! interpretation strategy to each host's normalized output. Argument errors
//! (empty delimiter, bad regex, empty host list) fail the whole call before
//! anything is dispatched; everything after dispatch is reported per host.

use std::collections::BTreeMap;

use crate::error::FleetError;
use crate::executor::{FleetRunner, HostResults, Target};
use crate::interpret::{self, ValuePattern};

/// Delimiter used by key/value operations when none is given.
pub const DEFAULT_DELIMITER: &str = ":";

impl FleetRunner {
    /// Normalized output lines of `command` on every host.
    pub async fn list_output_lines(
        &self,
        command: &str,
        target: &Target,
    ) -> Result<HostResults<Vec<String>>, FleetError> {
        self.run(command, target, |lines| Ok(lines)).await
    }

    /// Whether each of `values` occurs anywhere in each host's output.
    pub async fn check_contains_any<S: AsRef<str>>(
        &self,
        command: &str,
        values: &[S],
        target: &Target,
    ) -> Result<HostResults<BTreeMap<String, bool>>, FleetError> {
        let values: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        self.run(command, target, move |lines| {
            Ok(interpret::contains(&lines, &values))
        })
        .await
    }

    /// Right-hand sides of `key<delimiter>value` lines on each host.
    ///
    /// Lines are selected when they start with `key` or contain `delimiter`;
    /// see [`interpret::get_values`].
    pub async fn extract_values_by_key(
        &self,
        command: &str,
        key: &str,
        delimiter: &str,
        target: &Target,
    ) -> Result<HostResults<Vec<String>>, FleetError> {
        if delimiter.is_empty() {
            return Err(FleetError::EmptyDelimiter);
        }

        let key = key.to_string();
        let delimiter = delimiter.to_string();
        self.run(command, target, move |lines| {
            interpret::get_values(&lines, &key, &delimiter)
        })
        .await
    }

    /// Map of every `key<delimiter>value` line on each host.
    pub async fn extract_key_value_map(
        &self,
        command: &str,
        delimiter: &str,
        target: &Target,
    ) -> Result<HostResults<BTreeMap<String, String>>, FleetError> {
        if delimiter.is_empty() {
            return Err(FleetError::EmptyDelimiter);
        }

        let delimiter = delimiter.to_string();
        self.run(command, target, move |lines| {
            interpret::get_dict(&lines, &delimiter)
        })
        .await
    }

    /// Whether every line matching the `key` regex also matches `value`.
    pub async fn validate_lines_match_value(
        &self,
        command: &str,
        key: &str,
        value: &str,
        target: &Target,
    ) -> Result<HostResults<bool>, FleetError> {
        let pattern = ValuePattern::new(key, value)?;
        self.run(command, target, move |lines| {
            Ok(interpret::validate_values(&lines, &pattern))
        })
        .await
    }

    /// Per expected key, whether its line carries the expected value.
    pub async fn validate_key_value_map(
        &self,
        command: &str,
        expected: &BTreeMap<String, String>,
        target: &Target,
    ) -> Result<HostResults<BTreeMap<String, bool>>, FleetError> {
        let expected = expected.clone();
        self.run(command, target, move |lines| {
            interpret::validate_keyvalues(&lines, &expected)
        })
        .await
    }
}
