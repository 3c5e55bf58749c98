//! Parses the comma-separated lists used to select workflow states and run conclusions.

use std::fmt::Display;

/// A normalized comma-separated list of values, such as `"failure, cancelled"`.
///
/// Values are trimmed, empty values are dropped, and matching is case-sensitive. A list left with
/// no values matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternList {
    values: Vec<String>,
}

impl PatternList {
    /// Parses a comma-separated list. Returns [`None`] only if `pattern` is empty.
    pub fn parse(pattern: &str) -> Option<Self> {
        if pattern.is_empty() {
            return None;
        }

        let values = pattern
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
            .collect();

        Some(Self { values })
    }

    /// Returns `true` if `value` is one of the listed values.
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|listed| listed == value)
    }

    /// The listed values, in the order they were given.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Display for PatternList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.values.join(","))
    }
}
