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

//! Delimiter-based value extraction.

use std::collections::BTreeMap;

use crate::error::FleetError;

/// Extract the right-hand side of `key<delimiter>value` lines.
///
/// A line is selected when it starts with `key` *or* contains `delimiter`, and
/// is split on the first delimiter. A selected line that starts with `key` but
/// has no delimiter cannot be split and yields [`FleetError::MalformedLine`].
pub fn get_values(
    lines: &[String],
    key: &str,
    delimiter: &str,
) -> Result<Vec<String>, FleetError> {
    if delimiter.is_empty() {
        return Err(FleetError::EmptyDelimiter);
    }

    lines
        .iter()
        .filter(|line| line.starts_with(key) || line.contains(delimiter))
        .map(|line| {
            line.split_once(delimiter)
                .map(|(_, value)| value.trim().to_string())
                .ok_or_else(|| FleetError::MalformedLine {
                    line: line.clone(),
                    delimiter: delimiter.to_string(),
                })
        })
        .collect()
}

/// Build a map from every `key<delimiter>value` line.
///
/// Lines where the delimiter is missing or is the first character are skipped.
/// When a key appears more than once the last line wins.
pub fn get_dict(
    lines: &[String],
    delimiter: &str,
) -> Result<BTreeMap<String, String>, FleetError> {
    if delimiter.is_empty() {
        return Err(FleetError::EmptyDelimiter);
    }

    let mut dict = BTreeMap::new();
    for line in lines {
        match line.find(delimiter) {
            Some(pos) if pos > 0 => {
                let key = line[..pos].trim();
                let value = line[pos + delimiter.len()..].trim();
                dict.insert(key.to_string(), value.to_string());
            }
            _ => {}
        }
    }
    Ok(dict)
}
