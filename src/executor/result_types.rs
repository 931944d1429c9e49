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

//! Result types for fan-out operations.

use std::collections::BTreeMap;

use crate::error::FleetError;

/// Per-host outcomes of one fan-out call, keyed by host identifier.
///
/// The key set is exactly the requested host set. Each host carries its own
/// result so a failure on one host never hides the others.
#[derive(Debug)]
pub struct HostResults<T> {
    results: BTreeMap<String, Result<T, FleetError>>,
}

impl<T> HostResults<T> {
    pub fn get(&self, host: &str) -> Option<&Result<T, FleetError>> {
        self.results.get(host)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<T, FleetError>)> {
        self.results.iter().map(|(host, result)| (host.as_str(), result))
    }

    /// Hosts that produced a value.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.iter()
            .filter_map(|(host, result)| result.as_ref().ok().map(|value| (host, value)))
    }

    /// Hosts that failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &FleetError)> {
        self.iter()
            .filter_map(|(host, result)| result.as_ref().err().map(|err| (host, err)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.values().all(Result::is_ok)
    }
}

impl<T> Default for HostResults<T> {
    fn default() -> Self {
        Self {
            results: BTreeMap::new(),
        }
    }
}

impl<T> FromIterator<(String, Result<T, FleetError>)> for HostResults<T> {
    fn from_iter<I: IntoIterator<Item = (String, Result<T, FleetError>)>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for HostResults<T> {
    type Item = (String, Result<T, FleetError>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Result<T, FleetError>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
