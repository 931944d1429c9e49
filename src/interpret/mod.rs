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

//! Interpretation of one host's command output.
//!
//! Raw stdout is first normalized into trimmed, non-empty lines (see
//! [`normalize`]); every strategy works on that line sequence.

mod keyvalue;
mod validate;

pub use keyvalue::{get_dict, get_values};
pub use validate::{find_key, validate_keyvalues, validate_values, ValuePattern};

use std::collections::BTreeMap;

/// Split raw output into lines, trim each one and drop the empty ones.
pub fn normalize(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Report, for every value, whether it occurs anywhere in the output.
///
/// Lines are joined with `\n` before searching, so a value may span lines.
pub fn contains<S: AsRef<str>>(lines: &[String], values: &[S]) -> BTreeMap<String, bool> {
    let text = lines.join("\n");
    values
        .iter()
        .map(|v| (v.as_ref().to_string(), text.contains(v.as_ref())))
        .collect()
}
