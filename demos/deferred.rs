//! Deferred example: values computed at roll time
//!
//! This example demonstrates:
//! - Modifiers whose phase defers evaluation to roll time
//! - Evaluating the same deferred modifier against different targets
//! - Clamping applied at evaluation time
//! - Predicates gated by roll options

use serde_json::json;
use std::sync::Arc;
use zzmod::*;

fn main() -> Result<(), serde_json::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = RuleConfig::default();
    let mut actor = Actor::new(ActorType::Character, json!({"level": 8}));
    let item = Arc::new(ItemContext::new("Feat: Giant Hunter"));

    // Bonus equal to half the level difference, at most +3, never negative
    let hunter: RuleElementSource = serde_json::from_value(json!({
        "key": "FlatModifier",
        "selector": "attack",
        "type": "circumstance",
        "value": "floor((@target.level - @actor.level) / 2)",
        "min": 0,
        "max": 3,
        "phase": "beforeRoll"
    }))?;
    let flanking: RuleElementSource = serde_json::from_value(json!({
        "key": "FlatModifier",
        "selector": "attack",
        "value": 2,
        "label": "Flanking",
        "predicate": ["self:flanking"]
    }))?;

    for source in [hunter, flanking] {
        let element = FlatModifierRuleElement::new(source, Arc::clone(&item), &actor, &config);
        match element.before_prepare_data(&mut actor, &config) {
            Ok(registration) => println!("{:?}", registration),
            Err(e) => println!("Error: {}", e),
        }
    }

    let selectors = [Selector::from("attack")];
    println!("\n=== Attack vs. different targets ===");
    for target_level in [6, 11, 20] {
        let mut params =
            DeferredValueParams::new().with_resolvable("target", json!({"level": target_level}));
        params.add_roll_option("self:flanking");

        let stat = StatisticModifier::from_actor("attack", &actor, &selectors, &params);
        println!("Target level {:>2}: total {:+}", target_level, stat.total());
        for entry in stat.breakdown() {
            println!("    {}: {:+}", entry.label, entry.value);
        }
    }

    Ok(())
}
