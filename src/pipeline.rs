//! The host preparation pass.
//!
//! One pass prepares one actor: the registry is reset, every rule element
//! of every item is built fresh in document order, and then each active
//! element runs its preparation hook in that same order. A failing element
//! produces a diagnostic and the pass moves on.

use crate::actor::Actor;
use crate::config::RuleConfig;
use crate::context::ItemContext;
use crate::error::RuleError;
use crate::rule_element::{
    FlatModifierRuleElement, Registration, RuleElementSource, RuleElementState, FLAT_MODIFIER_KEY,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// An item owning rule element sources.
///
/// Rules are kept as raw JSON and converted one at a time during a pass,
/// so a malformed rule never hides its siblings.
///
/// # Examples
///
/// ```rust
/// use zzmod::pipeline::Item;
///
/// let item = Item::from_json(r#"{
///     "name": "Effect: Inspire Courage",
///     "rules": [{"key": "FlatModifier", "selector": "attack", "type": "status", "value": 1}]
/// }"#).unwrap();
///
/// assert_eq!(item.context().name, "Effect: Inspire Courage");
/// assert_eq!(item.rules().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Item {
    context: Arc<ItemContext>,
    rules: Vec<Value>,
}

#[derive(Deserialize)]
struct ItemDocument {
    #[serde(flatten)]
    context: ItemContext,
    #[serde(default)]
    rules: Vec<Value>,
}

impl Item {
    pub fn new(context: ItemContext, rules: Vec<Value>) -> Self {
        Self {
            context: Arc::new(context),
            rules,
        }
    }

    /// Parse an item document: `name`, optional `slug` and `data`, and `rules`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let document: ItemDocument = serde_json::from_str(json)?;
        Ok(Self::new(document.context, document.rules))
    }

    pub fn context(&self) -> &ItemContext {
        &self.context
    }

    pub fn rules(&self) -> &[Value] {
        &self.rules
    }
}

/// Whether a raw rule belongs to this crate. A rule without a key does.
fn is_flat_modifier(rule: &Value) -> bool {
    match rule.get("key") {
        None | Some(Value::Null) => true,
        Some(key) => key.as_str() == Some(FLAT_MODIFIER_KEY),
    }
}

/// A rule element problem found during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Name of the owning item.
    pub item: String,
    /// Index of the rule within the item.
    pub rule_index: usize,
    pub error: RuleError,
}

/// Outcome of one preparation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparationReport {
    /// Modifiers appended to the registry.
    pub registered: usize,
    /// Elements whose value was zero.
    pub omitted: usize,
    /// Elements that were invalid, ignored or skipped.
    pub inert: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run one preparation pass over `items` for `actor`.
///
/// Rule sources whose key names another rule element kind are passed over.
/// A rule that cannot be read as a source is reported against its index
/// and the rest of the item still runs.
///
/// # Examples
///
/// ```rust
/// use zzmod::pipeline::{prepare_actor, Item};
/// use zzmod::{Actor, ActorType, RuleConfig, Selector};
/// use serde_json::json;
///
/// let item = Item::from_json(r#"{"name": "Shield", "rules": [
///     {"key": "FlatModifier", "selector": "ac", "type": "circumstance", "value": 2},
///     {"key": "FlatModifier", "selector": "ac", "type": "bogus", "value": 2}
/// ]}"#).unwrap();
///
/// let mut actor = Actor::new(ActorType::Character, json!({}));
/// let report = prepare_actor(&mut actor, &[item], &RuleConfig::default());
///
/// assert_eq!(report.registered, 1);
/// assert_eq!(report.diagnostics.len(), 1);
/// assert_eq!(actor.synthetics().modifiers(&Selector::from("ac")).len(), 1);
/// ```
pub fn prepare_actor(actor: &mut Actor, items: &[Item], config: &RuleConfig) -> PreparationReport {
    actor.synthetics_mut().clear();

    // Build every element before any hook runs.
    let elements: Vec<(&Item, usize, Result<FlatModifierRuleElement, RuleError>)> = items
        .iter()
        .flat_map(|item| {
            item.rules
                .iter()
                .enumerate()
                .filter(|(_, raw)| is_flat_modifier(raw))
                .map(move |(rule_index, raw)| (item, rule_index, raw))
        })
        .map(|(item, rule_index, raw)| {
            let element = RuleElementSource::from_value(raw).map(|source| {
                FlatModifierRuleElement::new(source, Arc::clone(&item.context), actor, config)
            });
            (item, rule_index, element)
        })
        .collect();

    let mut report = PreparationReport::default();
    for (item, rule_index, element) in &elements {
        let diagnostic = |error: RuleError| Diagnostic {
            item: item.context.name.clone(),
            rule_index: *rule_index,
            error,
        };
        let element = match element {
            Ok(element) => element,
            Err(error) => {
                tracing::warn!(item = %item.context.name, rule_index, error = %error, "Malformed rule skipped");
                report.inert += 1;
                report.diagnostics.push(diagnostic(error.clone()));
                continue;
            }
        };
        if let RuleElementState::Invalid(error) = element.state() {
            report.diagnostics.push(diagnostic(error.clone()));
        }
        match element.before_prepare_data(actor, config) {
            Ok(Registration::Registered) => report.registered += 1,
            Ok(Registration::OmittedZero) => report.omitted += 1,
            Ok(Registration::Skipped | Registration::Inert) => report.inert += 1,
            Err(error) => {
                tracing::warn!(
                    item = %item.context.name,
                    rule_index,
                    error = %error,
                    "Rule element failed during preparation"
                );
                report.inert += 1;
                report.diagnostics.push(diagnostic(error));
            }
        }
    }

    tracing::debug!(
        registered = report.registered,
        omitted = report.omitted,
        inert = report.inert,
        diagnostics = report.diagnostics.len(),
        "Preparation pass complete"
    );
    report
}
