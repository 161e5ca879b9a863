//! Tests for the preparation pass.
//!
//! These tests verify:
//! - Items parsed from JSON feed the registry in document order
//! - Diagnostics for invalid and unresolvable rules
//! - Debug configuration surfacing skipped rules
//! - Deferred modifiers surviving the pass and finalizing per roll

use serde_json::json;
use zzmod::pipeline::{prepare_actor, Item};
use zzmod::*;

fn items() -> Vec<Item> {
    vec![
        Item::from_json(
            r#"{
                "name": "Effect: Frightened",
                "slug": "frightened",
                "data": {"badge": {"value": 2}},
                "rules": [
                    {"key": "FlatModifier", "selector": "all", "type": "status", "value": "-@item.badge.value"}
                ]
            }"#,
        )
        .unwrap(),
        Item::from_json(
            r#"{
                "name": "Feat: Weapon Focus",
                "rules": [
                    {"key": "FlatModifier", "selector": "{actor|weapon}-attack", "value": 1},
                    {"key": "FlatModifier", "selector": "ac", "value": 1, "type": "typo"},
                    {"key": "FlatModifier", "value": 1}
                ]
            }"#,
        )
        .unwrap(),
    ]
}

#[test]
fn test_pass_registers_and_reports() {
    let mut actor = Actor::new(ActorType::Character, json!({"weapon": "longsword"}));
    let report = prepare_actor(&mut actor, &items(), &RuleConfig::default());

    assert_eq!(report.registered, 2);
    assert_eq!(report.inert, 2);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].item, "Feat: Weapon Focus");
    assert_eq!(report.diagnostics[0].rule_index, 1);
    assert_eq!(
        report.diagnostics[0].error,
        RuleError::InvalidType("typo".to_string())
    );

    let all = actor.synthetics().modifiers(&Selector::from("all"));
    assert_eq!(all[0].value().immediate(), Some(-2.0));
    assert_eq!(all[0].label(), "Frightened");
    assert_eq!(
        actor.synthetics().modifiers(&Selector::from("longsword-attack")).len(),
        1
    );
}

#[test]
fn test_debug_config_reports_skipped_rules() {
    let mut actor = Actor::new(ActorType::Character, json!({"weapon": "longsword"}));
    let config = RuleConfig::from_json(r#"{"debugRuleElements": true}"#).unwrap();
    let report = prepare_actor(&mut actor, &items(), &config);

    assert_eq!(report.diagnostics.len(), 2);
    assert_eq!(report.diagnostics[1].rule_index, 2);
    assert_eq!(report.diagnostics[1].error, RuleError::MissingSelectorOrValue);
}

#[test]
fn test_unresolved_injection_is_reported() {
    let mut actor = Actor::new(ActorType::Character, json!({}));
    let report = prepare_actor(&mut actor, &items(), &RuleConfig::default());

    assert_eq!(report.registered, 1);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.error == RuleError::UnresolvedInjection("actor|weapon".to_string())));
}

#[test]
fn test_non_character_actor_is_rejected() {
    let mut actor = Actor::new(ActorType::Vehicle, json!({"weapon": "ram"}));
    let report = prepare_actor(&mut actor, &items(), &RuleConfig::default());

    assert_eq!(report.registered, 0);
    assert_eq!(report.diagnostics.len(), 4);
    assert!(report
        .diagnostics
        .iter()
        .all(|d| matches!(d.error, RuleError::InvalidActorType(_))));
}

#[test]
fn test_deferred_modifiers_finalize_per_roll() {
    let item = Item::from_json(
        r#"{"name": "Aura", "rules": [
            {"key": "FlatModifier", "selector": "save", "type": "status",
             "value": "@origin.bonus", "max": 2, "phase": "beforeRoll"}
        ]}"#,
    )
    .unwrap();
    let mut actor = Actor::new(ActorType::Npc, json!({}));
    let report = prepare_actor(&mut actor, &[item], &RuleConfig::default());
    assert_eq!(report.registered, 1);

    let selectors = [Selector::from("save")];
    let none = StatisticModifier::from_actor("save", &actor, &selectors, &DeferredValueParams::new());
    assert_eq!(none.total(), 0.0);
    assert!(none.breakdown().is_empty());

    let params = DeferredValueParams::new().with_resolvable("origin", json!({"bonus": 5}));
    let strong = StatisticModifier::from_actor("save", &actor, &selectors, &params);
    assert_eq!(strong.total(), 2.0);
}

#[test]
fn test_item_with_malformed_rule_still_loads() {
    let item = Item::from_json(
        r#"{"name": "Shield", "rules": [
            {"key": "FlatModifier", "selector": "ac", "value": 2},
            {"key": "FlatModifier", "selector": 5, "value": 1}
        ]}"#,
    )
    .unwrap();
    assert_eq!(item.rules().len(), 2);

    let mut actor = Actor::new(ActorType::Character, json!({}));
    let report = prepare_actor(&mut actor, &[item], &RuleConfig::default());

    assert_eq!(report.registered, 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].rule_index, 1);
    assert!(matches!(
        report.diagnostics[0].error,
        RuleError::InvalidSource(_)
    ));
    let ac = actor.synthetics().modifiers(&Selector::from("ac"));
    assert_eq!(ac[0].value().immediate(), Some(2.0));
}
