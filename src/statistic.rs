//! Statistic totals computed from registered modifiers.
//!
//! This is the consuming side of the synthetics registry. It finalizes
//! deferred values with the roll-time parameters, applies actor
//! adjustments, tests predicates, and applies stacking:
//!
//! - untyped modifiers always stack;
//! - for every other type only the highest bonus and the lowest penalty
//!   count (the earliest wins a tie).
//!
//! The breakdown keeps registration order so explanations read the way
//! the rule elements were declared.

use crate::actor::Actor;
use crate::context::DeferredValueParams;
use crate::modifier::{Modifier, ModifierType};
use crate::predicate::RollOptions;
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One line of a statistic breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub slug: String,
    pub label: String,
    pub modifier_type: ModifierType,
    pub value: f64,
    /// Whether the modifier counts toward the total.
    pub enabled: bool,
    /// Whether the modifier should be hidden when disabled.
    pub hide_if_disabled: bool,
}

/// A statistic total with full breakdown.
///
/// # Examples
///
/// ```rust
/// use zzmod::{DeferredValueParams, Modifier, ModifierParams, ModifierType, Predicate,
///     StatisticModifier};
///
/// let make = |slug: &str, value: f64, modifier_type| Modifier::new(ModifierParams {
///     slug: slug.to_string(),
///     label: slug.to_string(),
///     value: value.into(),
///     adjustments: Vec::new(),
///     modifier_type,
///     ability: None,
///     predicate: Predicate::default(),
///     damage_type: None,
///     damage_category: None,
///     hide_if_disabled: false,
/// });
///
/// let modifiers = vec![
///     make("bless", 1.0, ModifierType::Status),
///     make("heroism", 2.0, ModifierType::Status),
///     make("flank", 2.0, ModifierType::Untyped),
/// ];
/// let stat = StatisticModifier::new("attack", &modifiers, &DeferredValueParams::new());
/// assert_eq!(stat.total(), 4.0); // best status bonus (2) + untyped (2)
/// assert!(!stat.breakdown()[0].enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticModifier {
    slug: String,
    total: f64,
    breakdown: Vec<BreakdownEntry>,
}

impl StatisticModifier {
    /// Compute a statistic from modifiers in registration order.
    pub fn new(
        slug: impl Into<String>,
        modifiers: &[Modifier],
        params: &DeferredValueParams,
    ) -> Self {
        let options = params.roll_options();
        let mut breakdown: Vec<BreakdownEntry> = modifiers
            .iter()
            .filter_map(|modifier| modifier.finalized(params))
            .map(|modifier| adjusted_entry(&modifier, options))
            .collect();

        apply_stacking(&mut breakdown);
        let total = breakdown
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.value)
            .sum();

        Self {
            slug: slug.into(),
            total,
            breakdown,
        }
    }

    /// Compute a statistic from an actor's registry.
    ///
    /// Modifiers are gathered selector by selector, in the order given.
    /// Deferred values read the actor's current roll data unless `params`
    /// already supplies an `actor` resolvable.
    pub fn from_actor(
        slug: impl Into<String>,
        actor: &Actor,
        selectors: &[Selector],
        params: &DeferredValueParams,
    ) -> Self {
        let modifiers: Vec<Modifier> = selectors
            .iter()
            .flat_map(|selector| actor.synthetics().modifiers(selector))
            .cloned()
            .collect();

        let mut params = params.clone();
        if params.resolvable("actor").is_none() {
            params.set_resolvable("actor", actor.roll_data());
        }
        Self::new(slug, &modifiers, &params)
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Sum of the enabled modifiers.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn breakdown(&self) -> &[BreakdownEntry] {
        &self.breakdown
    }
}

fn adjusted_entry(modifier: &Modifier, options: &RollOptions) -> BreakdownEntry {
    let mut entry = BreakdownEntry {
        slug: modifier.slug().to_string(),
        label: modifier.label().to_string(),
        modifier_type: modifier.modifier_type(),
        value: modifier.value().immediate().unwrap_or(0.0),
        enabled: modifier.predicate().test(options),
        hide_if_disabled: modifier.hide_if_disabled(),
    };
    for adjustment in modifier
        .adjustments()
        .iter()
        .filter(|adjustment| adjustment.predicate.test(options))
    {
        if adjustment.suppress {
            entry.enabled = false;
        }
        if let Some(label) = &adjustment.relabel {
            entry.label = label.clone();
        }
        if let Some(value) = adjustment.new_value {
            entry.value = value;
        }
    }
    entry
}

fn apply_stacking(breakdown: &mut [BreakdownEntry]) {
    // (type, is_bonus) -> index of the entry that currently counts
    let mut best: HashMap<(ModifierType, bool), usize> = HashMap::new();
    for idx in 0..breakdown.len() {
        let entry = &breakdown[idx];
        if !entry.enabled || entry.modifier_type == ModifierType::Untyped || entry.value == 0.0 {
            continue;
        }
        let is_bonus = entry.value > 0.0;
        let key = (entry.modifier_type, is_bonus);
        match best.get(&key).copied() {
            None => {
                best.insert(key, idx);
            }
            Some(current) => {
                let beats = if is_bonus {
                    entry.value > breakdown[current].value
                } else {
                    entry.value < breakdown[current].value
                };
                if beats {
                    breakdown[current].enabled = false;
                    best.insert(key, idx);
                } else {
                    breakdown[idx].enabled = false;
                }
            }
        }
    }
}
