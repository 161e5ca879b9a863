//! Error types for rule element validation and preparation.
//!
//! All errors a rule element can report are represented by the
//! `RuleError` enum. None of them are fatal: a failing element becomes
//! inert for the current preparation pass and its siblings keep running.

use crate::modifier::ModifierType;
use thiserror::Error;

/// Format the closed set of modifier types as a readable list.
fn format_modifier_types() -> String {
    ModifierType::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur while validating or preparing a rule element.
///
/// # Examples
///
/// ```rust
/// use zzmod::RuleError;
///
/// let err = RuleError::InvalidType("bogus".to_string());
/// assert!(err.to_string().contains("untyped"));
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleError {
    /// The declared `type` is not a member of the modifier type set.
    ///
    /// Contains the offending value as written in the source.
    #[error(
        "A flat modifier must have one of the following types: {} (got {0})",
        format_modifier_types()
    )]
    InvalidType(String),

    /// A modifier of type `ability` without a valid ability abbreviation.
    #[error(
        "A flat modifier of type \"ability\" must also have an \"ability\" property with an ability abbreviation"
    )]
    InvalidAbility,

    /// The owning actor's type cannot carry flat modifiers.
    #[error("Flat modifiers are not valid on actors of type {0}")]
    InvalidActorType(String),

    /// The declared `phase` is not one of the known pipeline phases.
    #[error("Unknown modifier phase: {0}")]
    InvalidPhase(String),

    /// A `min` or `max` bound that is not a number.
    #[error("The {0} bound of a flat modifier must be a number")]
    InvalidBound(&'static str),

    /// The rule declaration does not have the shape of a rule element.
    #[error("Malformed rule element source: {0}")]
    InvalidSource(String),

    /// The `predicate` could not be parsed.
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// Selector or value was missing outside the zero-value case.
    ///
    /// Only reported when rule element debugging is enabled.
    #[error("Flat modifier requires selector and value properties")]
    MissingSelectorOrValue,

    /// A `{root|path}` injection referenced data that does not exist.
    #[error("Failed to resolve injected property: {0}")]
    UnresolvedInjection(String),

    /// A value formula could not be parsed or evaluated.
    #[error("Invalid formula {formula:?}: {reason}")]
    Formula { formula: String, reason: String },

    /// Configuration could not be loaded.
    #[error("Invalid rule configuration: {0}")]
    Config(String),
}
