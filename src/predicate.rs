//! Predicates gate whether a modifier applies in a given roll.
//!
//! A rule element only carries its predicate through to the modifier it
//! registers. The statistic calculator evaluates it against the roll
//! options in effect when the statistic is computed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The set of roll options active for one statistic computation.
///
/// # Examples
///
/// ```rust
/// use zzmod::predicate::RollOptions;
///
/// let options: RollOptions = ["self:flanking", "target:undead"].into_iter().collect();
/// assert!(options.contains("self:flanking"));
/// assert!(!options.contains("self:prone"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollOptions(BTreeSet<String>);

impl RollOptions {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option.
    pub fn insert(&mut self, option: impl Into<String>) {
        self.0.insert(option.into());
    }

    /// Check whether an option is present.
    pub fn contains(&self, option: &str) -> bool {
        self.0.contains(option)
    }

    /// Iterate over the options in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RollOptions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A single predicate statement.
///
/// Deserializes from the compact JSON form used in rule sources:
/// a bare string is an atom, and `{"not": ..}`, `{"and": [..]}`,
/// `{"or": [..]}`, `{"nor": [..]}` are the compound forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateStatement {
    /// Holds when the roll option is present.
    Atom(String),
    Not { not: Box<PredicateStatement> },
    And { and: Vec<PredicateStatement> },
    Or { or: Vec<PredicateStatement> },
    Nor { nor: Vec<PredicateStatement> },
}

impl PredicateStatement {
    fn test(&self, options: &RollOptions) -> bool {
        match self {
            PredicateStatement::Atom(option) => options.contains(option),
            PredicateStatement::Not { not } => !not.test(options),
            PredicateStatement::And { and } => and.iter().all(|s| s.test(options)),
            PredicateStatement::Or { or } => or.iter().any(|s| s.test(options)),
            PredicateStatement::Nor { nor } => !nor.iter().any(|s| s.test(options)),
        }
    }
}

/// A conjunction of predicate statements.
///
/// The empty predicate always passes.
///
/// # Examples
///
/// ```rust
/// use zzmod::predicate::{Predicate, RollOptions};
/// use serde_json::json;
///
/// let predicate: Predicate =
///     serde_json::from_value(json!(["self:flanking", {"not": "target:immune"}])).unwrap();
///
/// let flanking: RollOptions = ["self:flanking"].into_iter().collect();
/// assert!(predicate.test(&flanking));
///
/// let immune: RollOptions = ["self:flanking", "target:immune"].into_iter().collect();
/// assert!(!predicate.test(&immune));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate(Vec<PredicateStatement>);

impl Predicate {
    /// Create a predicate from statements.
    pub fn new(statements: Vec<PredicateStatement>) -> Self {
        Self(statements)
    }

    /// Whether there are no statements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The statements, in declaration order.
    pub fn statements(&self) -> &[PredicateStatement] {
        &self.0
    }

    /// Test every statement against the given roll options.
    pub fn test(&self, options: &RollOptions) -> bool {
        self.0.iter().all(|s| s.test(options))
    }
}
