//! Configuration injected into rule element construction and preparation.
//!
//! Nothing in the crate reads global state: localized ability labels and
//! the diagnostic switch travel in a `RuleConfig` owned by the host.

use crate::error::RuleError;
use crate::modifier::Ability;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a deferred value that turns out to be zero is treated.
///
/// Immediate values of zero are always omitted. For deferred values the
/// zero check can happen at two different moments, and they disagree when
/// clamping moves a value to or away from zero, so both are offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferredZeroCheck {
    /// Probe the unclamped value once at registration, with empty roll-time
    /// parameters, and omit the modifier if it is zero.
    PreCheck,
    /// Always register; drop the modifier when its clamped value is zero
    /// at evaluation time.
    #[default]
    AtEvaluation,
}

/// Host configuration for flat modifier rule elements.
///
/// # Examples
///
/// ```rust
/// use zzmod::{Ability, RuleConfig};
///
/// let config = RuleConfig::from_json(r#"{
///     "abilityLabels": {"str": "Stärke"},
///     "debugRuleElements": true
/// }"#).unwrap();
///
/// assert_eq!(config.ability_label(Ability::Str), "Stärke");
/// assert_eq!(config.ability_label(Ability::Dex), "Dexterity");
/// assert!(config.debug_rule_elements);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleConfig {
    /// Localized ability display names. Missing entries fall back to English.
    pub ability_labels: HashMap<Ability, String>,
    /// Report selector/value problems that production silently skips.
    pub debug_rule_elements: bool,
    pub deferred_zero_check: DeferredZeroCheck,
}

impl RuleConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        serde_json::from_str(json).map_err(|e| RuleError::Config(e.to_string()))
    }

    /// Display name for an ability.
    pub fn ability_label(&self, ability: Ability) -> &str {
        self.ability_labels
            .get(&ability)
            .map(String::as_str)
            .unwrap_or_else(|| ability.default_label())
    }
}
