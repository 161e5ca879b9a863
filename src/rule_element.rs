//! Flat modifier rule element.
//!
//! Turns a declarative source such as
//!
//! ```json
//! { "key": "FlatModifier", "selector": "ac", "type": "status", "value": 1 }
//! ```
//!
//! into a `Modifier` in the owning actor's synthetics registry. The
//! element is validated once at construction; preparation then resolves
//! the selector, computes the value now or defers it to a later phase,
//! clamps it, and registers at most one modifier.

use crate::actor::{Actor, ActorType};
use crate::config::{DeferredZeroCheck, RuleConfig};
use crate::context::ItemContext;
use crate::error::RuleError;
use crate::formula::{inject_properties, resolve_value, ResolveContext};
use crate::modifier::{
    Ability, DeferredValue, Modifier, ModifierParams, ModifierType, ModifierValue,
};
use crate::numeric::{clamp_declared, is_truthy, parse_bound};
use crate::predicate::Predicate;
use crate::selector::Selector;
use crate::slug::{sluggify, strip_label};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Rule element key handled by this module.
pub const FLAT_MODIFIER_KEY: &str = "FlatModifier";

/// Actor types that can carry flat modifiers.
const VALID_ACTOR_TYPES: [ActorType; 3] =
    [ActorType::Character, ActorType::Familiar, ActorType::Npc];

/// Raw, unvalidated rule element declaration.
///
/// Fields whose shape is not trusted are kept as JSON and checked during
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleElementSource {
    pub key: Option<String>,
    pub selector: Option<String>,
    pub value: Option<Value>,
    #[serde(rename = "type")]
    pub modifier_type: Option<Value>,
    pub ability: Option<Value>,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub damage_type: Option<Value>,
    pub damage_category: Option<Value>,
    pub hide_if_disabled: Option<Value>,
    pub phase: Option<Value>,
    pub predicate: Option<Value>,
    pub slug: Option<String>,
    pub label: Option<String>,
    pub ignored: bool,
}

impl RuleElementSource {
    /// Read a source from raw rule JSON.
    ///
    /// # Errors
    ///
    /// `InvalidSource` when a field has the wrong shape, such as a numeric
    /// `selector`.
    pub fn from_value(raw: &Value) -> Result<Self, RuleError> {
        Self::deserialize(raw).map_err(|e| RuleError::InvalidSource(e.to_string()))
    }
}

/// Pipeline stage at which a modifier's value is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModifierPhase {
    /// Computed during preparation, before derived data exists.
    #[default]
    BeforeDerived,
    /// Computed after the actor's derived data has been prepared.
    AfterDerived,
    /// Computed when a roll is made.
    BeforeRoll,
}

impl ModifierPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ModifierPhase::BeforeDerived => "beforeDerived",
            ModifierPhase::AfterDerived => "afterDerived",
            ModifierPhase::BeforeRoll => "beforeRoll",
        }
    }
}

impl FromStr for ModifierPhase {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ModifierPhase::BeforeDerived,
            ModifierPhase::AfterDerived,
            ModifierPhase::BeforeRoll,
        ]
        .into_iter()
        .find(|phase| phase.as_str() == s)
        .ok_or_else(|| RuleError::InvalidPhase(s.to_string()))
    }
}

impl fmt::Display for ModifierPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modifier category, with the ability attached when the category needs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatModifierKind {
    Ability(Ability),
    /// Never `ModifierType::Ability`.
    Other(ModifierType),
}

/// Validated rule element data.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatModifierData {
    /// Selector before property injection.
    pub selector: String,
    /// Raw value; `Null` when none was declared.
    pub value: Value,
    pub kind: FlatModifierKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Damage type before property injection.
    pub damage_type: Option<String>,
    pub damage_category: Option<String>,
    pub hide_if_disabled: bool,
    pub phase: ModifierPhase,
    pub predicate: Predicate,
    pub slug: Option<String>,
    pub label: String,
}

impl FlatModifierData {
    pub fn modifier_type(&self) -> ModifierType {
        match self.kind {
            FlatModifierKind::Ability(_) => ModifierType::Ability,
            FlatModifierKind::Other(modifier_type) => modifier_type,
        }
    }

    pub fn ability(&self) -> Option<Ability> {
        match self.kind {
            FlatModifierKind::Ability(ability) => Some(ability),
            FlatModifierKind::Other(_) => None,
        }
    }
}

/// Construction outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleElementState {
    /// Validation failed; the element is inert for this pass.
    Invalid(RuleError),
    /// The source asked to be ignored.
    Ignored,
    Active(FlatModifierData),
}

/// Preparation outcome for a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A modifier was appended to the registry.
    Registered,
    /// The value was zero; nothing registered.
    OmittedZero,
    /// Selector missing or empty; nothing registered.
    Skipped,
    /// The element is invalid or ignored.
    Inert,
}

/// A flat modifier rule element bound to its owning item.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use zzmod::{Actor, ActorType, FlatModifierRuleElement, ItemContext, Registration, RuleConfig,
///     RuleElementSource, Selector};
/// use serde_json::json;
///
/// let config = RuleConfig::default();
/// let mut actor = Actor::new(ActorType::Character, json!({}));
/// let item = Arc::new(ItemContext::new("Effect: Shield"));
/// let source: RuleElementSource = serde_json::from_value(json!({
///     "key": "FlatModifier", "selector": "ac", "type": "circumstance", "value": 1
/// })).unwrap();
///
/// let element = FlatModifierRuleElement::new(source, item, &actor, &config);
/// assert_eq!(element.before_prepare_data(&mut actor, &config), Ok(Registration::Registered));
///
/// let modifiers = actor.synthetics().modifiers(&Selector::from("ac"));
/// assert_eq!(modifiers[0].label(), "Shield");
/// assert_eq!(modifiers[0].slug(), "effect-shield");
/// ```
#[derive(Debug, Clone)]
pub struct FlatModifierRuleElement {
    item: Arc<ItemContext>,
    rule: Arc<Value>,
    state: RuleElementState,
}

impl FlatModifierRuleElement {
    /// Validate `source` for `actor`.
    ///
    /// Never fails outright: a validation failure is recorded as
    /// [`RuleElementState::Invalid`] and logged.
    pub fn new(
        source: RuleElementSource,
        item: Arc<ItemContext>,
        actor: &Actor,
        config: &RuleConfig,
    ) -> Self {
        let rule = Arc::new(serde_json::to_value(&source).unwrap_or(Value::Null));
        let state = if source.ignored {
            RuleElementState::Ignored
        } else {
            match validate(source, &item, actor, config) {
                Ok(data) => RuleElementState::Active(data),
                Err(error) => {
                    tracing::warn!(item = %item.name, error = %error, "Rule element failed validation");
                    RuleElementState::Invalid(error)
                }
            }
        };
        Self { item, rule, state }
    }

    pub fn state(&self) -> &RuleElementState {
        &self.state
    }

    /// Validated data, if the element is active.
    pub fn data(&self) -> Option<&FlatModifierData> {
        match &self.state {
            RuleElementState::Active(data) => Some(data),
            _ => None,
        }
    }

    pub fn item(&self) -> &ItemContext {
        &self.item
    }

    /// Whether the element will do nothing this pass.
    pub fn is_inert(&self) -> bool {
        self.data().is_none()
    }

    /// Compute the value and register a modifier on `actor`.
    ///
    /// With a selector and a phase other than `beforeDerived`, the value is
    /// deferred: the registered modifier carries a computation that the
    /// statistic calculator runs later. Otherwise the value is computed and
    /// clamped now and a zero value registers nothing.
    ///
    /// # Errors
    ///
    /// `UnresolvedInjection` when the selector or damage type references
    /// missing data. `MissingSelectorOrValue` when nothing could be
    /// registered for a reason other than a zero value and
    /// `config.debug_rule_elements` is set; without it that case returns
    /// `Ok(Registration::Skipped)`.
    pub fn before_prepare_data(
        &self,
        actor: &mut Actor,
        config: &RuleConfig,
    ) -> Result<Registration, RuleError> {
        let Some(data) = self.data() else {
            return Ok(Registration::Inert);
        };

        let ctx = ResolveContext::new(actor.roll_data(), &self.item, &self.rule);
        let selector = inject_properties(&data.selector, &ctx)?;
        let damage_type = match &data.damage_type {
            Some(damage_type) => Some(inject_properties(damage_type, &ctx)?),
            None => None,
        }
        .filter(|damage_type| !damage_type.is_empty());

        let defer = !selector.is_empty() && data.phase != ModifierPhase::BeforeDerived;
        let value = if defer {
            if config.deferred_zero_check == DeferredZeroCheck::PreCheck
                && resolve_value(&data.value, &ctx) == 0.0
            {
                tracing::debug!(item = %self.item.name, %selector, "Deferred modifier probed to zero, omitted");
                return Ok(Registration::OmittedZero);
            }
            ModifierValue::Deferred(self.deferred_value(actor, data, config))
        } else {
            let resolved = resolve_value(&data.value, &ctx);
            ModifierValue::Immediate(clamp_declared(resolved, data.min, data.max))
        };

        match value.immediate() {
            Some(v) if v == 0.0 => {
                tracing::debug!(item = %self.item.name, %selector, "Flat modifier has value 0, omitted");
                return Ok(Registration::OmittedZero);
            }
            _ if selector.is_empty() => {
                return if config.debug_rule_elements {
                    tracing::warn!(item = %self.item.name, "Flat modifier requires selector and value properties");
                    Err(RuleError::MissingSelectorOrValue)
                } else {
                    Ok(Registration::Skipped)
                };
            }
            _ => {}
        }

        let selector = Selector::from(selector);
        let slug = data.slug.clone().unwrap_or_else(|| sluggify(&data.label));
        let adjustments = actor.get_modifier_adjustments(std::slice::from_ref(&selector), &slug);
        let modifier = Modifier::new(ModifierParams {
            label: strip_label(&data.label).to_string(),
            slug,
            value,
            adjustments,
            modifier_type: data.modifier_type(),
            ability: data.ability(),
            predicate: data.predicate.clone(),
            damage_type,
            damage_category: data.damage_category.clone(),
            hide_if_disabled: data.hide_if_disabled,
        });

        tracing::debug!(
            item = %self.item.name,
            %selector,
            slug = modifier.slug(),
            deferred = modifier.value().is_deferred(),
            "Registered flat modifier"
        );
        actor.synthetics_mut().push(selector, modifier);
        Ok(Registration::Registered)
    }

    /// Build the deferred computation.
    ///
    /// The actor's roll data is captured as it is now and used only when
    /// the caller passes no `actor` resolvable.
    /// `StatisticModifier::from_actor` always passes the live data.
    fn deferred_value(
        &self,
        actor: &Actor,
        data: &FlatModifierData,
        config: &RuleConfig,
    ) -> DeferredValue {
        let actor_data = actor.roll_data().clone();
        let item = Arc::clone(&self.item);
        let rule = Arc::clone(&self.rule);
        let raw = data.value.clone();
        let (min, max) = (data.min, data.max);

        DeferredValue::new(move |params| {
            let ctx = ResolveContext::new(&actor_data, &item, &rule).with_params(params);
            clamp_declared(resolve_value(&raw, &ctx), min, max)
        })
        .suppressing_zero(config.deferred_zero_check == DeferredZeroCheck::AtEvaluation)
    }
}

fn validate(
    source: RuleElementSource,
    item: &ItemContext,
    actor: &Actor,
    config: &RuleConfig,
) -> Result<FlatModifierData, RuleError> {
    if !VALID_ACTOR_TYPES.contains(&actor.actor_type()) {
        return Err(RuleError::InvalidActorType(actor.actor_type().to_string()));
    }

    let predicate = match source.predicate {
        None | Some(Value::Null) => Predicate::default(),
        Some(raw) => serde_json::from_value(raw).map_err(|e| RuleError::InvalidPredicate(e.to_string()))?,
    };

    let phase = match &source.phase {
        None | Some(Value::Null) => ModifierPhase::default(),
        Some(Value::String(s)) => s.parse()?,
        Some(other) => return Err(RuleError::InvalidPhase(other.to_string())),
    };

    let modifier_type = match &source.modifier_type {
        None | Some(Value::Null) => ModifierType::Untyped,
        Some(Value::String(s)) => s.parse()?,
        Some(other) => return Err(RuleError::InvalidType(other.to_string())),
    };

    let hide_if_disabled = source.hide_if_disabled.as_ref().is_some_and(is_truthy);

    let (kind, label, value) = if modifier_type == ModifierType::Ability {
        let ability: Ability = source
            .ability
            .as_ref()
            .and_then(Value::as_str)
            .ok_or(RuleError::InvalidAbility)?
            .parse()?;
        let label = source
            .label
            .unwrap_or_else(|| config.ability_label(ability).to_string());
        let value = source
            .value
            .unwrap_or_else(|| Value::String(ability.modifier_formula()));
        (FlatModifierKind::Ability(ability), label, value)
    } else {
        let label = source.label.unwrap_or_else(|| item.name.clone());
        (
            FlatModifierKind::Other(modifier_type),
            label,
            source.value.unwrap_or(Value::Null),
        )
    };

    Ok(FlatModifierData {
        selector: source.selector.unwrap_or_default(),
        value,
        kind,
        min: parse_bound("min", source.min.as_ref())?,
        max: parse_bound("max", source.max.as_ref())?,
        damage_type: source.damage_type.as_ref().and_then(Value::as_str).map(str::to_string),
        damage_category: source
            .damage_category
            .as_ref()
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        hide_if_disabled,
        phase,
        predicate,
        slug: source.slug,
        label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DeferredValueParams;
    use serde_json::json;

    fn source(value: Value) -> RuleElementSource {
        serde_json::from_value(value).unwrap()
    }

    fn character() -> Actor {
        Actor::new(
            ActorType::Character,
            json!({"level": 4, "abilities": {"str": {"mod": 4}, "dex": {"mod": 2}}}),
        )
    }

    fn build(actor: &Actor, value: Value) -> FlatModifierRuleElement {
        FlatModifierRuleElement::new(
            source(value),
            Arc::new(ItemContext::new("Effect: Bless (Level 1)")),
            actor,
            &RuleConfig::default(),
        )
    }

    #[test]
    fn test_defaults() {
        let actor = character();
        let element = build(&actor, json!({"selector": "attack", "value": 1}));
        let data = element.data().unwrap();
        assert_eq!(data.modifier_type(), ModifierType::Untyped);
        assert_eq!(data.phase, ModifierPhase::BeforeDerived);
        assert!(!data.hide_if_disabled);
        assert_eq!(data.label, "Effect: Bless (Level 1)");
        assert_eq!(data.ability(), None);
    }

    #[test]
    fn test_invalid_type() {
        let actor = character();
        for bad in [json!("bonus"), json!("Status"), json!(3), json!(["status"])] {
            let element = build(&actor, json!({"selector": "ac", "value": 1, "type": bad}));
            assert!(
                matches!(element.state(), RuleElementState::Invalid(RuleError::InvalidType(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_ability_requires_valid_ability() {
        let actor = character();
        for ability in [None, Some(json!("strength")), Some(json!(1)), Some(json!(""))] {
            let mut raw = json!({"selector": "damage", "type": "ability"});
            if let Some(ability) = ability {
                raw["ability"] = ability;
            }
            let element = build(&actor, raw);
            assert_eq!(element.state(), &RuleElementState::Invalid(RuleError::InvalidAbility));
        }
    }

    #[test]
    fn test_ability_defaults() {
        let actor = character();
        let element = build(&actor, json!({"selector": "damage", "type": "ability", "ability": "dex"}));
        let data = element.data().unwrap();
        assert_eq!(data.kind, FlatModifierKind::Ability(Ability::Dex));
        assert_eq!(data.label, "Dexterity");
        assert_eq!(data.value, json!("@actor.abilities.dex.mod"));

        let explicit = build(
            &actor,
            json!({"selector": "damage", "type": "ability", "ability": "dex", "value": 7, "label": "Finesse"}),
        );
        let data = explicit.data().unwrap();
        assert_eq!(data.label, "Finesse");
        assert_eq!(data.value, json!(7));
    }

    #[test]
    fn test_hide_if_disabled_coercion() {
        let actor = character();
        let truthy = build(&actor, json!({"selector": "ac", "value": 1, "hideIfDisabled": "yes"}));
        assert!(truthy.data().unwrap().hide_if_disabled);
        let falsy = build(&actor, json!({"selector": "ac", "value": 1, "hideIfDisabled": 0}));
        assert!(!falsy.data().unwrap().hide_if_disabled);
    }

    #[test]
    fn test_invalid_phase_bound_and_predicate() {
        let actor = character();
        let phase = build(&actor, json!({"selector": "ac", "value": 1, "phase": "afterRoll"}));
        assert_eq!(
            phase.state(),
            &RuleElementState::Invalid(RuleError::InvalidPhase("afterRoll".to_string()))
        );

        let bound = build(&actor, json!({"selector": "ac", "value": 1, "max": {"x": 1}}));
        assert_eq!(bound.state(), &RuleElementState::Invalid(RuleError::InvalidBound("max")));

        let predicate = build(&actor, json!({"selector": "ac", "value": 1, "predicate": [7]}));
        assert!(matches!(
            predicate.state(),
            RuleElementState::Invalid(RuleError::InvalidPredicate(_))
        ));
    }

    #[test]
    fn test_invalid_actor_type() {
        let hazard = Actor::new(ActorType::Hazard, json!({}));
        let element = build(&hazard, json!({"selector": "ac", "value": 1}));
        assert_eq!(
            element.state(),
            &RuleElementState::Invalid(RuleError::InvalidActorType("hazard".to_string()))
        );
    }

    #[test]
    fn test_ignored_source_is_inert() {
        let mut actor = character();
        let element = build(&actor, json!({"selector": "ac", "value": 1, "ignored": true}));
        assert_eq!(element.state(), &RuleElementState::Ignored);
        assert_eq!(
            element.before_prepare_data(&mut actor, &RuleConfig::default()),
            Ok(Registration::Inert)
        );
        assert!(actor.synthetics().is_empty());
    }

    #[test]
    fn test_label_and_slug() {
        let mut actor = character();
        let element = build(&actor, json!({"selector": "attack", "value": 1, "type": "status"}));
        element.before_prepare_data(&mut actor, &RuleConfig::default()).unwrap();

        let modifier = &actor.synthetics().modifiers(&Selector::from("attack"))[0];
        assert_eq!(modifier.label(), "Bless");
        assert_eq!(modifier.slug(), "effect-bless-level-1");
        assert_eq!(modifier.modifier_type(), ModifierType::Status);
    }

    #[test]
    fn test_explicit_slug_wins() {
        let mut actor = character();
        let element = build(&actor, json!({"selector": "attack", "value": 1, "slug": "bless"}));
        element.before_prepare_data(&mut actor, &RuleConfig::default()).unwrap();
        assert_eq!(actor.synthetics().modifiers(&Selector::from("attack"))[0].slug(), "bless");
    }

    #[test]
    fn test_selector_and_damage_type_injection() {
        let mut actor = Actor::new(
            ActorType::Character,
            json!({"weapon": {"slug": "longsword", "damage": "slashing"}}),
        );
        let element = build(
            &actor,
            json!({"selector": "{actor|weapon.slug}-damage", "value": 2, "damageType": "{actor|weapon.damage}"}),
        );
        assert_eq!(
            element.before_prepare_data(&mut actor, &RuleConfig::default()),
            Ok(Registration::Registered)
        );
        let modifier = &actor.synthetics().modifiers(&Selector::from("longsword-damage"))[0];
        assert_eq!(modifier.damage_type(), Some("slashing"));
    }

    #[test]
    fn test_unresolved_selector_injection() {
        let mut actor = character();
        let element = build(&actor, json!({"selector": "{actor|nothing}", "value": 2}));
        assert_eq!(
            element.before_prepare_data(&mut actor, &RuleConfig::default()),
            Err(RuleError::UnresolvedInjection("actor|nothing".to_string()))
        );
        assert!(actor.synthetics().is_empty());
    }

    #[test]
    fn test_empty_damage_fields_become_none() {
        let mut actor = character();
        let element = build(
            &actor,
            json!({"selector": "damage", "value": 1, "damageType": "", "damageCategory": ""}),
        );
        element.before_prepare_data(&mut actor, &RuleConfig::default()).unwrap();
        let modifier = &actor.synthetics().modifiers(&Selector::from("damage"))[0];
        assert_eq!(modifier.damage_type(), None);
        assert_eq!(modifier.damage_category(), None);
    }

    #[test]
    fn test_missing_selector_debug_only() {
        let mut actor = character();
        let element = build(&actor, json!({"value": 3}));

        assert_eq!(
            element.before_prepare_data(&mut actor, &RuleConfig::default()),
            Ok(Registration::Skipped)
        );

        let debug = RuleConfig {
            debug_rule_elements: true,
            ..RuleConfig::default()
        };
        assert_eq!(
            element.before_prepare_data(&mut actor, &debug),
            Err(RuleError::MissingSelectorOrValue)
        );
        assert!(actor.synthetics().is_empty());
    }

    #[test]
    fn test_zero_is_silent_even_in_debug() {
        let mut actor = character();
        let debug = RuleConfig {
            debug_rule_elements: true,
            ..RuleConfig::default()
        };
        let no_value = build(&actor, json!({"selector": "ac"}));
        assert_eq!(no_value.before_prepare_data(&mut actor, &debug), Ok(Registration::OmittedZero));

        let no_selector = build(&actor, json!({"value": 0}));
        assert_eq!(no_selector.before_prepare_data(&mut actor, &debug), Ok(Registration::OmittedZero));
    }

    #[test]
    fn test_deferred_without_selector_is_immediate() {
        let mut actor = character();
        let element = build(&actor, json!({"value": 2, "phase": "beforeRoll"}));
        assert_eq!(
            element.before_prepare_data(&mut actor, &RuleConfig::default()),
            Ok(Registration::Skipped)
        );
    }

    #[test]
    fn test_deferred_pre_check() {
        let config = RuleConfig {
            deferred_zero_check: DeferredZeroCheck::PreCheck,
            ..RuleConfig::default()
        };
        let mut actor = character();
        let item = Arc::new(ItemContext::new("Aura"));

        // unclamped probe is 0 even though the clamp would lift it to 1
        let zero = FlatModifierRuleElement::new(
            source(json!({"selector": "ac", "value": "@target.bonus", "min": 1, "phase": "beforeRoll"})),
            Arc::clone(&item),
            &actor,
            &config,
        );
        assert_eq!(zero.before_prepare_data(&mut actor, &config), Ok(Registration::OmittedZero));

        // unclamped probe is 4, so it registers even though it clamps to 0
        let clamped_to_zero = FlatModifierRuleElement::new(
            source(json!({"selector": "ac", "value": "@actor.level", "max": 0, "phase": "beforeRoll"})),
            item,
            &actor,
            &config,
        );
        assert_eq!(
            clamped_to_zero.before_prepare_data(&mut actor, &config),
            Ok(Registration::Registered)
        );

        let modifiers = actor.synthetics().modifiers(&Selector::from("ac"));
        assert_eq!(modifiers.len(), 1);
        let finalized = modifiers[0].finalized(&DeferredValueParams::new()).unwrap();
        assert_eq!(finalized.value().immediate(), Some(0.0));
    }

    #[test]
    fn test_deferred_at_evaluation() {
        let config = RuleConfig::default();
        let mut actor = character();
        let element = FlatModifierRuleElement::new(
            source(json!({"selector": "ac", "value": "@target.bonus", "min": 1, "phase": "afterDerived"})),
            Arc::new(ItemContext::new("Aura")),
            &actor,
            &config,
        );
        assert_eq!(element.before_prepare_data(&mut actor, &config), Ok(Registration::Registered));

        let modifier = &actor.synthetics().modifiers(&Selector::from("ac"))[0];
        // clamped to 1, so it survives finalization
        let finalized = modifier.finalized(&DeferredValueParams::new()).unwrap();
        assert_eq!(finalized.value().immediate(), Some(1.0));
    }

    #[test]
    fn test_source_roundtrips_as_camel_case() {
        let raw = json!({"key": "FlatModifier", "selector": "ac", "type": "item", "hideIfDisabled": true, "damageCategory": "precision"});
        let parsed = source(raw);
        assert_eq!(parsed.modifier_type, Some(json!("item")));
        assert_eq!(parsed.hide_if_disabled, Some(json!(true)));
        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["type"], json!("item"));
        assert_eq!(back["damageCategory"], json!("precision"));
    }
}
