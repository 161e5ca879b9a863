//! Basic example: one preparation pass over an actor's items
//!
//! This example demonstrates:
//! - Loading items with flat modifier rules from JSON
//! - Running a preparation pass and reading its diagnostics
//! - Computing statistics with stacking and breakdown
//!
//! Run with `RUST_LOG=zzmod=debug` to see every registration.

use serde_json::json;
use tracing_subscriber::filter::EnvFilter;
use zzmod::pipeline::{prepare_actor, Item};
use zzmod::*;

fn main() -> Result<(), serde_json::Error> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let items = [
        Item::from_json(
            r#"{
                "name": "Effect: Inspire Courage",
                "rules": [
                    {"key": "FlatModifier", "selector": "attack", "type": "status", "value": 1},
                    {"key": "FlatModifier", "selector": "damage", "type": "status", "value": 1}
                ]
            }"#,
        )?,
        Item::from_json(
            r#"{
                "name": "Effect: Heroism (Greater)",
                "rules": [
                    {"key": "FlatModifier", "selector": "attack", "type": "status", "value": 5, "max": 3}
                ]
            }"#,
        )?,
        Item::from_json(
            r#"{
                "name": "Strength Damage",
                "rules": [
                    {"key": "FlatModifier", "selector": "damage", "type": "ability", "ability": "str"},
                    {"key": "FlatModifier", "selector": "damage", "type": "ability", "ability": "luck"}
                ]
            }"#,
        )?,
    ];

    let mut actor = Actor::new(
        ActorType::Character,
        json!({"level": 5, "abilities": {"str": {"mod": 4}}}),
    );
    let config = RuleConfig::default();

    println!("=== Preparation pass ===");
    let report = prepare_actor(&mut actor, &items, &config);
    println!("Registered: {}", report.registered);
    println!("Omitted (zero): {}", report.omitted);
    println!("Inert: {}", report.inert);
    for diagnostic in &report.diagnostics {
        println!(
            "  {} rule #{}: {}",
            diagnostic.item, diagnostic.rule_index, diagnostic.error
        );
    }

    let params = DeferredValueParams::new();
    for selector in ["attack", "damage"] {
        let stat =
            StatisticModifier::from_actor(selector, &actor, &[Selector::from(selector)], &params);
        println!("\n=== {} ===", stat.slug());
        for entry in stat.breakdown() {
            let marker = if entry.enabled { " " } else { "x" };
            println!(
                "  [{}] {} ({}): {:+}",
                marker, entry.label, entry.modifier_type, entry.value
            );
        }
        println!("  Total: {:+}", stat.total());
    }

    Ok(())
}
