//! # zzmod - Declarative Flat Modifier Rule Elements
//!
//! Turns small JSON rule declarations into live, phase-aware numeric
//! contributions to character statistics:
//! - **Validated** sources (closed modifier type set, ability checks)
//! - **Phase-aware** values (computed now, or deferred to a later phase)
//! - **Clamped** results (optional `min` / `max` bounds)
//! - **Ordered** registration into a per-actor synthetics registry
//!
//! ## Core Concepts
//!
//! ### Preparation Pipeline
//!
//! ```text
//! [RuleElementSource] → [FlatModifierRuleElement] → [Modifier] → [Synthetics]
//!                                                                     ↓
//!                                                         [StatisticModifier]
//! ```
//!
//! 1. **Sources** are untrusted JSON declarations attached to items
//! 2. **Rule elements** validate their source once per preparation pass
//! 3. **Modifiers** are registered under a selector, in document order
//! 4. **Statistics** finalize deferred values, apply predicates and
//!    stacking, and produce a total with breakdown
//!
//! A validation failure never aborts a pass: the element becomes inert
//! and the failure is reported as a diagnostic.
//!
//! ## Example
//!
//! ```rust
//! use zzmod::pipeline::{prepare_actor, Item};
//! use zzmod::*;
//! use serde_json::json;
//!
//! let item = Item::from_json(r#"{
//!     "name": "Effect: Heroism",
//!     "rules": [
//!         {"key": "FlatModifier", "selector": "ac", "type": "status", "value": 5, "min": 0, "max": 3},
//!         {"key": "FlatModifier", "selector": "damage", "type": "ability", "ability": "str"}
//!     ]
//! }"#).unwrap();
//!
//! let mut actor = Actor::new(
//!     ActorType::Character,
//!     json!({"abilities": {"str": {"mod": 4}}}),
//! );
//! let config = RuleConfig::default();
//! let report = prepare_actor(&mut actor, &[item], &config);
//! assert_eq!(report.registered, 2);
//!
//! let params = DeferredValueParams::new();
//! let ac = StatisticModifier::from_actor("ac", &actor, &[Selector::from("ac")], &params);
//! assert_eq!(ac.total(), 3.0); // clamped to max
//!
//! let damage = StatisticModifier::from_actor("damage", &actor, &[Selector::from("damage")], &params);
//! assert_eq!(damage.total(), 4.0);
//! assert_eq!(damage.breakdown()[0].label, "Strength");
//! ```
//!
//! ## Modules
//!
//! - [`rule_element`] - Flat modifier validation, resolution and registration
//! - [`pipeline`] - One preparation pass over an actor's items
//! - [`modifier`] - Modifier record, types and deferred values
//! - [`actor`] - Actor state and the synthetics registry
//! - [`statistic`] - Totals with stacking and breakdown
//! - [`formula`] - Property injection and formula evaluation
//! - [`predicate`] - Roll option predicates
//! - [`context`] - Item context and roll-time parameters
//! - [`config`] - Injected configuration
//! - [`selector`] - Statistic selector keys
//! - [`numeric`] - Coercion and clamping
//! - [`slug`] - Slugs and label cleanup
//! - [`error`] - Error types

pub mod actor;
pub mod config;
pub mod context;
pub mod error;
pub mod formula;
pub mod modifier;
pub mod numeric;
pub mod pipeline;
pub mod predicate;
pub mod rule_element;
pub mod selector;
pub mod slug;
pub mod statistic;

// Re-export main types for convenience
pub use actor::{Actor, ActorType, Synthetics};
pub use config::{DeferredZeroCheck, RuleConfig};
pub use context::{DeferredValueParams, ItemContext};
pub use error::RuleError;
pub use selector::Selector;
pub use statistic::{BreakdownEntry, StatisticModifier};

// Re-export modifier types
pub use modifier::{
    Ability, DeferredValue, Modifier, ModifierAdjustment, ModifierParams, ModifierType,
    ModifierValue,
};
pub use predicate::{Predicate, RollOptions};

// Re-export rule element types
pub use rule_element::{
    FlatModifierData, FlatModifierKind, FlatModifierRuleElement, ModifierPhase, Registration,
    RuleElementSource, RuleElementState,
};
