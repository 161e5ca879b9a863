//! Statistic selectors.
//!
//! A selector names the statistic a modifier applies to, such as `"ac"`,
//! `"damage"` or `"longsword-attack"`. Rule sources may build selectors
//! through property injection, so by the time a `Selector` exists the
//! string is final.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a bucket in the synthetics registry.
///
/// # Examples
///
/// ```rust
/// use zzmod::Selector;
///
/// let ac: Selector = "ac".into();
/// assert_eq!(ac, Selector::from(String::from("ac")));
/// assert_eq!(ac.to_string(), "ac");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(String);

impl Selector {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty selector never receives modifiers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_empty() {
        assert!(Selector::from("").is_empty());
        assert!(!Selector::from("damage").is_empty());
    }

    #[test]
    fn test_selectors_sort_by_name() {
        let mut selectors = vec![Selector::from("damage"), Selector::from("ac")];
        selectors.sort();
        assert_eq!(selectors[0].as_str(), "ac");
    }

    #[test]
    fn test_selector_serde_is_plain_string() {
        let selector: Selector = serde_json::from_str("\"str-based\"").unwrap();
        assert_eq!(selector, Selector::from("str-based"));
        assert_eq!(serde_json::to_string(&selector).unwrap(), "\"str-based\"");
    }
}
