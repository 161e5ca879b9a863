//! Modifier module.
//!
//! A `Modifier` is the immutable numeric contribution a rule element
//! registers against a selector. Its value is either known at
//! registration time or deferred until a later phase supplies the
//! roll-time parameters it needs.

use crate::context::DeferredValueParams;
use crate::error::RuleError;
use crate::predicate::Predicate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Category of a modifier.
///
/// The statistic calculator uses the category for stacking: untyped
/// modifiers always stack, every other category keeps only its highest
/// bonus and its lowest penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierType {
    Ability,
    Proficiency,
    Circumstance,
    Item,
    Potency,
    Status,
    Untyped,
}

impl ModifierType {
    /// Every modifier type, in canonical order.
    pub const ALL: [ModifierType; 7] = [
        ModifierType::Ability,
        ModifierType::Proficiency,
        ModifierType::Circumstance,
        ModifierType::Item,
        ModifierType::Potency,
        ModifierType::Status,
        ModifierType::Untyped,
    ];

    /// The canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ModifierType::Ability => "ability",
            ModifierType::Proficiency => "proficiency",
            ModifierType::Circumstance => "circumstance",
            ModifierType::Item => "item",
            ModifierType::Potency => "potency",
            ModifierType::Status => "status",
            ModifierType::Untyped => "untyped",
        }
    }
}

impl FromStr for ModifierType {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModifierType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RuleError::InvalidType(s.to_string()))
    }
}

impl fmt::Display for ModifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the six ability scores.
///
/// # Examples
///
/// ```rust
/// use zzmod::Ability;
///
/// let ability: Ability = "str".parse().unwrap();
/// assert_eq!(ability, Ability::Str);
/// assert_eq!(ability.modifier_formula(), "@actor.abilities.str.mod");
/// assert!("strength".parse::<Ability>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    /// All six abilities.
    pub const ALL: [Ability; 6] = [
        Ability::Str,
        Ability::Dex,
        Ability::Con,
        Ability::Int,
        Ability::Wis,
        Ability::Cha,
    ];

    /// The three-letter abbreviation.
    pub fn as_str(self) -> &'static str {
        match self {
            Ability::Str => "str",
            Ability::Dex => "dex",
            Ability::Con => "con",
            Ability::Int => "int",
            Ability::Wis => "wis",
            Ability::Cha => "cha",
        }
    }

    /// English display name, used when no localized label is configured.
    pub fn default_label(self) -> &'static str {
        match self {
            Ability::Str => "Strength",
            Ability::Dex => "Dexterity",
            Ability::Con => "Constitution",
            Ability::Int => "Intelligence",
            Ability::Wis => "Wisdom",
            Ability::Cha => "Charisma",
        }
    }

    /// Formula referencing the owning actor's modifier for this ability.
    pub fn modifier_formula(self) -> String {
        format!("@actor.abilities.{}.mod", self.as_str())
    }
}

impl FromStr for Ability {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ability::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or(RuleError::InvalidAbility)
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An actor-supplied adjustment to modifiers with a given slug.
///
/// Adjustments are looked up when a modifier is built and applied by the
/// statistic calculator when their predicate passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModifierAdjustment {
    /// Only modifiers with this slug are adjusted. `None` matches all.
    pub slug: Option<String>,
    pub predicate: Predicate,
    /// Disable the modifier.
    pub suppress: bool,
    /// Replacement label.
    pub relabel: Option<String>,
    /// Replacement value.
    pub new_value: Option<f64>,
}

type DeferredFn = dyn Fn(&DeferredValueParams) -> f64 + Send + Sync;

/// A value computed on demand from roll-time parameters.
///
/// Every call to [`evaluate`](Self::evaluate) resolves and clamps from
/// scratch, so two evaluations with different parameters are independent.
///
/// # Examples
///
/// ```rust
/// use zzmod::{DeferredValue, DeferredValueParams};
///
/// let deferred = DeferredValue::new(|params: &DeferredValueParams| {
///     params
///         .resolvable("bonus")
///         .and_then(|v| v.as_f64())
///         .unwrap_or(0.0)
/// });
///
/// let params = DeferredValueParams::new().with_resolvable("bonus", 2);
/// assert_eq!(deferred.evaluate(&params), 2.0);
/// assert_eq!(deferred.evaluate(&DeferredValueParams::new()), 0.0);
/// ```
#[derive(Clone)]
pub struct DeferredValue {
    compute: Arc<DeferredFn>,
    suppress_zero: bool,
}

impl DeferredValue {
    /// Wrap a computation.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&DeferredValueParams) -> f64 + Send + Sync + 'static,
    {
        Self {
            compute: Arc::new(compute),
            suppress_zero: false,
        }
    }

    /// Drop the owning modifier when this value evaluates to zero.
    pub fn suppressing_zero(mut self, suppress: bool) -> Self {
        self.suppress_zero = suppress;
        self
    }

    /// Whether a zero result drops the owning modifier.
    pub fn suppresses_zero(&self) -> bool {
        self.suppress_zero
    }

    /// Run the computation.
    pub fn evaluate(&self, params: &DeferredValueParams) -> f64 {
        (self.compute)(params)
    }
}

impl fmt::Debug for DeferredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredValue")
            .field("suppress_zero", &self.suppress_zero)
            .finish_non_exhaustive()
    }
}

/// The magnitude of a modifier.
#[derive(Debug, Clone)]
pub enum ModifierValue {
    /// Known at registration.
    Immediate(f64),
    /// Computed by the consuming phase.
    Deferred(DeferredValue),
}

impl ModifierValue {
    /// The value, if it is already known.
    pub fn immediate(&self) -> Option<f64> {
        match self {
            ModifierValue::Immediate(v) => Some(*v),
            ModifierValue::Deferred(_) => None,
        }
    }

    /// Whether evaluation has been deferred.
    pub fn is_deferred(&self) -> bool {
        matches!(self, ModifierValue::Deferred(_))
    }
}

impl From<f64> for ModifierValue {
    fn from(value: f64) -> Self {
        ModifierValue::Immediate(value)
    }
}

/// Inputs for [`Modifier::new`].
#[derive(Debug, Clone)]
pub struct ModifierParams {
    pub slug: String,
    pub label: String,
    pub value: ModifierValue,
    pub adjustments: Vec<ModifierAdjustment>,
    pub modifier_type: ModifierType,
    pub ability: Option<Ability>,
    pub predicate: Predicate,
    pub damage_type: Option<String>,
    pub damage_category: Option<String>,
    pub hide_if_disabled: bool,
}

/// An immutable numeric contribution to a statistic.
///
/// # Examples
///
/// ```rust
/// use zzmod::{Modifier, ModifierParams, ModifierType, Predicate};
///
/// let modifier = Modifier::new(ModifierParams {
///     slug: "shield".to_string(),
///     label: "Shield".to_string(),
///     value: 2.0.into(),
///     adjustments: Vec::new(),
///     modifier_type: ModifierType::Circumstance,
///     ability: None,
///     predicate: Predicate::default(),
///     damage_type: None,
///     damage_category: None,
///     hide_if_disabled: false,
/// });
///
/// assert_eq!(modifier.value().immediate(), Some(2.0));
/// assert_eq!(modifier.modifier_type(), ModifierType::Circumstance);
/// ```
#[derive(Debug, Clone)]
pub struct Modifier {
    slug: String,
    label: String,
    value: ModifierValue,
    adjustments: Vec<ModifierAdjustment>,
    modifier_type: ModifierType,
    ability: Option<Ability>,
    predicate: Predicate,
    damage_type: Option<String>,
    damage_category: Option<String>,
    hide_if_disabled: bool,
}

impl Modifier {
    /// Build a modifier. An ability is only kept for `ability` modifiers.
    pub fn new(params: ModifierParams) -> Self {
        let ability = match params.modifier_type {
            ModifierType::Ability => params.ability,
            _ => None,
        };
        Self {
            slug: params.slug,
            label: params.label,
            value: params.value,
            adjustments: params.adjustments,
            modifier_type: params.modifier_type,
            ability,
            predicate: params.predicate,
            damage_type: params.damage_type,
            damage_category: params.damage_category,
            hide_if_disabled: params.hide_if_disabled,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &ModifierValue {
        &self.value
    }

    pub fn adjustments(&self) -> &[ModifierAdjustment] {
        &self.adjustments
    }

    pub fn modifier_type(&self) -> ModifierType {
        self.modifier_type
    }

    pub fn ability(&self) -> Option<Ability> {
        self.ability
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn damage_type(&self) -> Option<&str> {
        self.damage_type.as_deref()
    }

    pub fn damage_category(&self) -> Option<&str> {
        self.damage_category.as_deref()
    }

    pub fn hide_if_disabled(&self) -> bool {
        self.hide_if_disabled
    }

    /// Produce a copy with an immediate value.
    ///
    /// Immediate modifiers are cloned as they are. A deferred value is
    /// evaluated with `params`; if it evaluates to zero and was registered
    /// with zero suppression, the modifier drops out and `None` is returned.
    /// `self` is never changed.
    pub fn finalized(&self, params: &DeferredValueParams) -> Option<Modifier> {
        match &self.value {
            ModifierValue::Immediate(_) => Some(self.clone()),
            ModifierValue::Deferred(deferred) => {
                let value = deferred.evaluate(params);
                tracing::trace!(slug = %self.slug, value, "Evaluated deferred modifier");
                if value == 0.0 && deferred.suppresses_zero() {
                    return None;
                }
                Some(Modifier {
                    value: ModifierValue::Immediate(value),
                    ..self.clone()
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: ModifierValue, modifier_type: ModifierType) -> ModifierParams {
        ModifierParams {
            slug: "test".to_string(),
            label: "Test".to_string(),
            value,
            adjustments: Vec::new(),
            modifier_type,
            ability: Some(Ability::Dex),
            predicate: Predicate::default(),
            damage_type: None,
            damage_category: None,
            hide_if_disabled: false,
        }
    }

    #[test]
    fn test_modifier_type_parse() {
        assert_eq!("status".parse::<ModifierType>(), Ok(ModifierType::Status));
        assert_eq!(
            "Status".parse::<ModifierType>(),
            Err(RuleError::InvalidType("Status".to_string()))
        );
        for modifier_type in ModifierType::ALL {
            assert_eq!(modifier_type.as_str().parse::<ModifierType>(), Ok(modifier_type));
        }
    }

    #[test]
    fn test_ability_parse() {
        for ability in Ability::ALL {
            assert_eq!(ability.as_str().parse::<Ability>(), Ok(ability));
        }
        assert_eq!("luck".parse::<Ability>(), Err(RuleError::InvalidAbility));
    }

    #[test]
    fn test_ability_dropped_for_non_ability_types() {
        let modifier = Modifier::new(params(1.0.into(), ModifierType::Item));
        assert_eq!(modifier.ability(), None);

        let modifier = Modifier::new(params(1.0.into(), ModifierType::Ability));
        assert_eq!(modifier.ability(), Some(Ability::Dex));
    }

    #[test]
    fn test_finalized_immediate_is_unchanged() {
        let modifier = Modifier::new(params(3.0.into(), ModifierType::Untyped));
        let finalized = modifier.finalized(&DeferredValueParams::new()).unwrap();
        assert_eq!(finalized.value().immediate(), Some(3.0));
    }

    #[test]
    fn test_finalized_deferred_leaves_original_deferred() {
        let deferred = DeferredValue::new(|_| 4.0);
        let modifier = Modifier::new(params(
            ModifierValue::Deferred(deferred),
            ModifierType::Status,
        ));

        let finalized = modifier.finalized(&DeferredValueParams::new()).unwrap();
        assert_eq!(finalized.value().immediate(), Some(4.0));
        assert!(modifier.value().is_deferred());
    }

    #[test]
    fn test_finalized_zero_suppression() {
        let keep = Modifier::new(params(
            ModifierValue::Deferred(DeferredValue::new(|_| 0.0)),
            ModifierType::Status,
        ));
        assert_eq!(
            keep.finalized(&DeferredValueParams::new())
                .and_then(|m| m.value().immediate()),
            Some(0.0)
        );

        let drop = Modifier::new(params(
            ModifierValue::Deferred(DeferredValue::new(|_| 0.0).suppressing_zero(true)),
            ModifierType::Status,
        ));
        assert!(drop.finalized(&DeferredValueParams::new()).is_none());
    }

    #[test]
    fn test_adjustment_deserialize() {
        let adjustment: ModifierAdjustment = serde_json::from_value(serde_json::json!({
            "slug": "rage",
            "suppress": true
        }))
        .unwrap();
        assert_eq!(adjustment.slug.as_deref(), Some("rage"));
        assert!(adjustment.suppress);
        assert!(adjustment.predicate.is_empty());
        assert_eq!(adjustment.new_value, None);
    }
}
