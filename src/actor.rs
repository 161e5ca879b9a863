//! Actor state touched by rule elements.
//!
//! The actor owns the synthetics registry that every rule element on it
//! appends to during a preparation pass, the roll data that `@actor.*`
//! formulas read, and the table of modifier adjustments.

use crate::modifier::{Modifier, ModifierAdjustment};
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Kind of actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    Character,
    Familiar,
    Npc,
    Hazard,
    Loot,
    Vehicle,
}

impl ActorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorType::Character => "character",
            ActorType::Familiar => "familiar",
            ActorType::Npc => "npc",
            ActorType::Hazard => "hazard",
            ActorType::Loot => "loot",
            ActorType::Vehicle => "vehicle",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-actor registry of modifiers keyed by selector.
///
/// Within one preparation pass the registry is append-only: modifiers
/// are pushed in rule element order and never removed or reordered.
///
/// # Examples
///
/// ```rust
/// use zzmod::{Selector, Synthetics};
///
/// let synthetics = Synthetics::new();
/// assert!(synthetics.modifiers(&Selector::from("ac")).is_empty());
/// assert!(synthetics.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Synthetics {
    statistics_modifiers: BTreeMap<Selector, Vec<Modifier>>,
}

impl Synthetics {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a modifier to the bucket for `selector`, creating the bucket
    /// if needed.
    pub fn push(&mut self, selector: Selector, modifier: Modifier) {
        self.statistics_modifiers
            .entry(selector)
            .or_default()
            .push(modifier);
    }

    /// Modifiers registered for `selector`, in registration order.
    pub fn modifiers(&self, selector: &Selector) -> &[Modifier] {
        self.statistics_modifiers
            .get(selector)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Selectors that have at least one modifier, in sorted order.
    pub fn selectors(&self) -> impl Iterator<Item = &Selector> {
        self.statistics_modifiers.keys()
    }

    /// Total number of registered modifiers.
    pub fn len(&self) -> usize {
        self.statistics_modifiers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.statistics_modifiers.is_empty()
    }

    /// Drop everything. Only called at the start of a new preparation pass.
    pub(crate) fn clear(&mut self) {
        self.statistics_modifiers.clear();
    }
}

/// An actor being prepared.
///
/// # Examples
///
/// ```rust
/// use zzmod::{Actor, ActorType, ModifierAdjustment, Selector};
/// use serde_json::json;
///
/// let mut actor = Actor::new(ActorType::Character, json!({"level": 5}));
/// actor.add_modifier_adjustment(
///     "ac",
///     ModifierAdjustment { slug: Some("shield".into()), suppress: true, ..Default::default() },
/// );
///
/// let found = actor.get_modifier_adjustments(&[Selector::from("ac")], "shield");
/// assert_eq!(found.len(), 1);
/// assert!(actor.get_modifier_adjustments(&[Selector::from("ac")], "other").is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Actor {
    actor_type: ActorType,
    roll_data: Value,
    adjustments: HashMap<Selector, Vec<ModifierAdjustment>>,
    synthetics: Synthetics,
}

impl Actor {
    /// Create an actor from its roll data.
    pub fn new(actor_type: ActorType, roll_data: Value) -> Self {
        Self {
            actor_type,
            roll_data,
            adjustments: HashMap::new(),
            synthetics: Synthetics::new(),
        }
    }

    pub fn actor_type(&self) -> ActorType {
        self.actor_type
    }

    /// Data reachable from formulas as `@actor.*`.
    pub fn roll_data(&self) -> &Value {
        &self.roll_data
    }

    /// Mutable roll data, for hosts that derive data between phases.
    pub fn roll_data_mut(&mut self) -> &mut Value {
        &mut self.roll_data
    }

    /// Register an adjustment for modifiers on `selector`.
    pub fn add_modifier_adjustment(
        &mut self,
        selector: impl Into<Selector>,
        adjustment: ModifierAdjustment,
    ) {
        self.adjustments
            .entry(selector.into())
            .or_default()
            .push(adjustment);
    }

    /// Adjustments applying to a modifier with `slug` on any of `selectors`.
    ///
    /// Adjustments without a slug match every modifier. Results follow
    /// selector order, then registration order.
    pub fn get_modifier_adjustments(
        &self,
        selectors: &[Selector],
        slug: &str,
    ) -> Vec<ModifierAdjustment> {
        selectors
            .iter()
            .filter_map(|selector| self.adjustments.get(selector))
            .flatten()
            .filter(|adjustment| adjustment.slug.as_deref().map_or(true, |s| s == slug))
            .cloned()
            .collect()
    }

    pub fn synthetics(&self) -> &Synthetics {
        &self.synthetics
    }

    pub fn synthetics_mut(&mut self) -> &mut Synthetics {
        &mut self.synthetics
    }
}
