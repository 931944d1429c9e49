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

//! Line validation strategies.

use regex::Regex;
use std::collections::BTreeMap;

use crate::error::FleetError;

/// Compiled key/value regex pair for [`validate_values`].
///
/// Both patterns are searched anywhere in a line (unanchored).
#[derive(Debug, Clone)]
pub struct ValuePattern {
    key: Regex,
    value: Regex,
}

impl ValuePattern {
    pub fn new(key: &str, value: &str) -> Result<Self, FleetError> {
        Ok(Self {
            key: compile(key)?,
            value: compile(value)?,
        })
    }

    pub fn key(&self) -> &Regex {
        &self.key
    }

    pub fn value(&self) -> &Regex {
        &self.value
    }
}

fn compile(pattern: &str) -> Result<Regex, FleetError> {
    Regex::new(pattern).map_err(|source| FleetError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Check that every line matching the key pattern also matches the value
/// pattern. Vacuously true when no line matches the key.
pub fn validate_values(lines: &[String], pattern: &ValuePattern) -> bool {
    lines
        .iter()
        .filter(|line| pattern.key.is_match(line))
        .all(|line| pattern.value.is_match(line))
}

/// Return the single key that occurs in `line`.
///
/// `Ok(None)` when no key occurs, [`FleetError::AmbiguousKey`] when more than
/// one does.
pub fn find_key<'a, I>(line: &str, keys: I) -> Result<Option<&'a str>, FleetError>
where
    I: IntoIterator<Item = &'a str>,
{
    let found: Vec<&str> = keys.into_iter().filter(|k| line.contains(k)).collect();
    match found.as_slice() {
        [] => Ok(None),
        [key] => Ok(Some(*key)),
        _ => Err(FleetError::AmbiguousKey {
            keys: found.iter().map(|k| k.to_string()).collect(),
            line: line.to_string(),
        }),
    }
}

/// For every line naming exactly one expected key, record whether the
/// expected value occurs in that line.
///
/// Keys never seen are absent from the result; a key seen on several lines
/// keeps the outcome of the last one.
pub fn validate_keyvalues(
    lines: &[String],
    expected: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, bool>, FleetError> {
    let mut result = BTreeMap::new();
    for line in lines {
        if let Some(key) = find_key(line, expected.keys().map(String::as_str))? {
            let matched = line.contains(expected[key].as_str());
            result.insert(key.to_string(), matched);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::normalize;

    fn expected(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_validate_values_all_running() {
        let lines = normalize("process1: running\nprocess2: running\nprocess3: running\n");
        let pattern = ValuePattern::new("process", "running").unwrap();
        assert!(validate_values(&lines, &pattern));
    }

    #[test]
    fn test_validate_values_one_stopped() {
        let lines = normalize("process1: running\nprocess2: running\nprocess3: stopped\n");
        let pattern = ValuePattern::new("process", "running").unwrap();
        assert!(!validate_values(&lines, &pattern));
    }

    #[test]
    fn test_validate_values_vacuous_truth() {
        let lines = normalize("thread: enable\n");
        let pattern = ValuePattern::new("process", "running").unwrap();
        assert!(validate_values(&lines, &pattern));
        assert!(validate_values(&[], &pattern));
    }

    #[test]
    fn test_validate_values_regex_alternation() {
        let lines = normalize("nginx: active\nsshd: running\ncron: inactive\n");
        let pattern = ValuePattern::new("nginx|sshd", "active|running").unwrap();
        assert!(validate_values(&lines, &pattern));

        let pattern = ValuePattern::new("nginx|cron", "^\\w+: active$").unwrap();
        assert!(!validate_values(&lines, &pattern));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ValuePattern::new("process(", "running").unwrap_err();
        match err {
            FleetError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "process("),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_find_key() {
        let keys = ["thread", "status"];
        assert_eq!(find_key("thread: enable", keys).unwrap(), Some("thread"));
        assert_eq!(find_key("uptime: 3 days", keys).unwrap(), None);

        let err = find_key("thread status: OK", keys).unwrap_err();
        match err {
            FleetError::AmbiguousKey { keys, line } => {
                assert_eq!(keys, vec!["thread", "status"]);
                assert_eq!(line, "thread status: OK");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_keyvalues_all_match() {
        let lines = normalize("thread: enable\nstatus: OK\n");
        let result =
            validate_keyvalues(&lines, &expected(&[("thread", "enable"), ("status", "OK")]))
                .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result["thread"]);
        assert!(result["status"]);
    }

    #[test]
    fn test_validate_keyvalues_mismatch() {
        let lines = normalize("thread: enable\nstatus: OK\n");
        let result =
            validate_keyvalues(&lines, &expected(&[("thread", "disable"), ("status", "OK")]))
                .unwrap();
        assert!(!result["thread"]);
        assert!(result["status"]);
    }

    #[test]
    fn test_validate_keyvalues_unmatched_key_is_absent() {
        let lines = normalize("thread: enable\n");
        let result =
            validate_keyvalues(&lines, &expected(&[("thread", "enable"), ("status", "OK")]))
                .unwrap();
        assert_eq!(result.len(), 1);
        assert!(!result.contains_key("status"));
    }

    #[test]
    fn test_validate_keyvalues_last_line_wins() {
        let lines = normalize("status: OK\nstatus: FAILED\n");
        let result = validate_keyvalues(&lines, &expected(&[("status", "OK")])).unwrap();
        assert!(!result["status"]);
    }

    #[test]
    fn test_validate_keyvalues_ambiguous() {
        let lines = normalize("thread status: OK\n");
        let err = validate_keyvalues(&lines, &expected(&[("thread", "enable"), ("status", "OK")]))
            .unwrap_err();
        assert!(matches!(err, FleetError::AmbiguousKey { .. }));
    }
}
