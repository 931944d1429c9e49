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

//! `egrep` filter construction.
//!
//! Builds shell filter commands from positive keywords and exclusions:
//!
//! | keywords | exclusions | result |
//! |----------|------------|--------|
//! | some     | none       | `egrep "a|b"` |
//! | none     | some       | `egrep -v "x|y"` |
//! | some     | some       | `egrep "a|b" | egrep -v "x|y"` |
//! | none     | none       | [`FleetError::EmptyPattern`] |
//!
//! Keywords are regex fragments and are inserted verbatim.

use crate::error::FleetError;

/// Exclusion patterns for an `egrep` filter.
///
/// A single string converts into a one-element set, so `"python".into()` and
/// `vec!["python"].into()` build the same filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Excludes(Vec<String>);

impl Excludes {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Excludes {
    fn from(pattern: &str) -> Self {
        Self(vec![pattern.to_string()])
    }
}

impl From<String> for Excludes {
    fn from(pattern: String) -> Self {
        Self(vec![pattern])
    }
}

impl From<Vec<String>> for Excludes {
    fn from(patterns: Vec<String>) -> Self {
        Self(patterns)
    }
}

impl From<Vec<&str>> for Excludes {
    fn from(patterns: Vec<&str>) -> Self {
        Self(patterns.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Excludes {
    fn from(patterns: &[&str]) -> Self {
        Self(patterns.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Excludes {
    fn from(patterns: [&str; N]) -> Self {
        Self(patterns.iter().map(|p| p.to_string()).collect())
    }
}

/// Build an `egrep` filter command.
pub fn egrep<S: AsRef<str>>(
    keywords: &[S],
    excludes: impl Into<Excludes>,
) -> Result<String, FleetError> {
    let excludes = excludes.into();
    let keywords = join_patterns(keywords.iter().map(AsRef::as_ref));
    let excludes = join_patterns(excludes.patterns().iter().map(String::as_str));

    match (keywords, excludes) {
        (Some(kw), Some(ex)) => Ok(format!("egrep \"{kw}\" | egrep -v \"{ex}\"")),
        (Some(kw), None) => Ok(format!("egrep \"{kw}\"")),
        (None, Some(ex)) => Ok(format!("egrep -v \"{ex}\"")),
        (None, None) => Err(FleetError::EmptyPattern),
    }
}

/// Build an `egrep` filter whose keywords and exclusions only match at the
/// start of a line.
pub fn egrep_startswith<S: AsRef<str>>(
    keywords: &[S],
    excludes: impl Into<Excludes>,
) -> Result<String, FleetError> {
    let keywords: Vec<String> = keywords.iter().map(|k| anchor(k.as_ref())).collect();
    let excludes: Vec<String> = excludes
        .into()
        .patterns()
        .iter()
        .map(|e| anchor(e))
        .collect();
    egrep(&keywords, excludes)
}

/// Pipe `command` into `filter`.
pub fn pipe(command: &str, filter: &str) -> String {
    format!("{command} | {filter}")
}

fn anchor(pattern: &str) -> String {
    format!("^({pattern})")
}

fn join_patterns<'a>(patterns: impl Iterator<Item = &'a str>) -> Option<String> {
    let patterns: Vec<&str> = patterns.collect();
    (!patterns.is_empty()).then(|| patterns.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_KEYWORDS: &[&str] = &[];

    #[test]
    fn test_keywords_only() {
        assert_eq!(
            egrep(&["glibc", "libxml2"], Excludes::none()).unwrap(),
            "egrep \"glibc|libxml2\""
        );
    }

    #[test]
    fn test_excludes_only() {
        assert_eq!(
            egrep(NO_KEYWORDS, ["python", "perl"]).unwrap(),
            "egrep -v \"python|perl\""
        );
    }

    #[test]
    fn test_keywords_and_excludes() {
        assert_eq!(
            egrep(&["nss"], ["python"]).unwrap(),
            "egrep \"nss\" | egrep -v \"python\""
        );
    }

    #[test]
    fn test_empty_pattern() {
        let err = egrep(NO_KEYWORDS, Excludes::none()).unwrap_err();
        assert!(matches!(err, FleetError::EmptyPattern));

        let err = egrep_startswith(NO_KEYWORDS, Excludes::none()).unwrap_err();
        assert!(matches!(err, FleetError::EmptyPattern));
    }

    #[test]
    fn test_single_exclude_equals_one_element_set() {
        assert_eq!(
            egrep(&["nss"], "python").unwrap(),
            egrep(&["nss"], vec!["python"]).unwrap()
        );
        assert_eq!(
            egrep_startswith(&["nss"], "python").unwrap(),
            egrep_startswith(&["nss"], ["python"]).unwrap()
        );
    }

    #[test]
    fn test_startswith_anchors_everything() {
        assert_eq!(
            egrep_startswith(&["glibc"], Excludes::none()).unwrap(),
            "egrep \"^(glibc)\""
        );
        assert_eq!(
            egrep_startswith(&["libxml2", "nss"], "python").unwrap(),
            "egrep \"^(libxml2)|^(nss)\" | egrep -v \"^(python)\""
        );
        assert_eq!(
            egrep_startswith(NO_KEYWORDS, ["a", "b"]).unwrap(),
            "egrep -v \"^(a)|^(b)\""
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        assert_eq!(
            egrep(&["a", "a"], Excludes::none()).unwrap(),
            "egrep \"a|a\""
        );
    }

    #[test]
    fn test_pipe() {
        let filter = egrep_startswith(&["glibc"], Excludes::none()).unwrap();
        assert_eq!(pipe("apt list", &filter), "apt list | egrep \"^(glibc)\"");
    }
}
