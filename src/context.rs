//! Context data that value formulas and injections resolve against.
//!
//! Two kinds of context exist. `ItemContext` describes the item that owns
//! a rule element and is fixed for the whole preparation pass.
//! `DeferredValueParams` is supplied later, by whoever invokes a deferred
//! value, and carries the roll-time data (targets, roll options) that did
//! not exist when the modifier was registered.

use crate::predicate::RollOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Look up a dotted path (`"abilities.str.mod"`) inside a JSON value.
///
/// Array elements are addressed by numeric segments. An empty path
/// returns the value itself.
///
/// # Examples
///
/// ```rust
/// use zzmod::context::lookup_path;
/// use serde_json::json;
///
/// let data = json!({"abilities": {"str": {"mod": 4}}, "list": [10, 20]});
/// assert_eq!(lookup_path(&data, "abilities.str.mod"), Some(&json!(4)));
/// assert_eq!(lookup_path(&data, "list.1"), Some(&json!(20)));
/// assert_eq!(lookup_path(&data, "abilities.dex.mod"), None);
/// ```
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// The item that owns a set of rule elements.
///
/// # Examples
///
/// ```rust
/// use zzmod::ItemContext;
/// use serde_json::json;
///
/// let item = ItemContext::new("Effect: Inspire Courage")
///     .with_data(json!({"level": {"value": 1}}));
///
/// assert_eq!(item.lookup("level.value"), Some(json!(1)));
/// assert_eq!(item.lookup("name"), Some(json!("Effect: Inspire Courage")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemContext {
    /// Display name, also the default rule element label.
    pub name: String,
    /// Explicit item slug, if the item has one.
    #[serde(default)]
    pub slug: Option<String>,
    /// Item data reachable as `@item.*` and `{item|*}`.
    #[serde(default)]
    pub data: Value,
}

impl ItemContext {
    /// Create an item context with no data.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
            data: Value::Null,
        }
    }

    /// Set the item slug.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Set the item data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Look up a path in the item.
    ///
    /// `name` and `slug` refer to the item's own fields; every other path
    /// is looked up in the item data.
    pub fn lookup(&self, path: &str) -> Option<Value> {
        match path {
            "name" => Some(Value::String(self.name.clone())),
            "slug" => self.slug.clone().map(Value::String),
            _ => lookup_path(&self.data, path).cloned(),
        }
    }
}

/// Parameters passed to a deferred value when it is finally evaluated.
///
/// Resolvables are named JSON documents addressable from formulas as
/// `@name.path`; a resolvable named `actor`, `item` or `rule` takes
/// precedence over the data captured at registration time. Injectables
/// are addressable from `{name|path}` injections.
///
/// # Examples
///
/// ```rust
/// use zzmod::DeferredValueParams;
///
/// let mut params = DeferredValueParams::new();
/// params.set_resolvable("target", serde_json::json!({"level": 3}));
/// params.add_roll_option("target:undead");
///
/// assert!(params.resolvable("target").is_some());
/// assert!(params.roll_options().contains("target:undead"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeferredValueParams {
    #[serde(default)]
    resolvables: HashMap<String, Value>,
    #[serde(default)]
    injectables: HashMap<String, Value>,
    #[serde(default)]
    roll_options: RollOptions,
}

impl DeferredValueParams {
    /// Create empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a resolvable.
    ///
    /// The value must be serializable. If serialization fails, the value
    /// is silently not added.
    pub fn set_resolvable(&mut self, name: impl Into<String>, value: impl Serialize) {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.resolvables.insert(name.into(), json_value);
        }
    }

    /// Builder form of [`set_resolvable`](Self::set_resolvable).
    pub fn with_resolvable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.set_resolvable(name, value);
        self
    }

    /// Get a resolvable by name.
    pub fn resolvable(&self, name: &str) -> Option<&Value> {
        self.resolvables.get(name)
    }

    /// Set an injectable.
    ///
    /// Same serialization behavior as [`set_resolvable`](Self::set_resolvable).
    pub fn set_injectable(&mut self, name: impl Into<String>, value: impl Serialize) {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.injectables.insert(name.into(), json_value);
        }
    }

    /// Get an injectable by name.
    pub fn injectable(&self, name: &str) -> Option<&Value> {
        self.injectables.get(name)
    }

    /// Add a roll option.
    pub fn add_roll_option(&mut self, option: impl Into<String>) {
        self.roll_options.insert(option);
    }

    /// Builder form that replaces the roll options.
    pub fn with_roll_options(mut self, options: RollOptions) -> Self {
        self.roll_options = options;
        self
    }

    /// The roll options active for this evaluation.
    pub fn roll_options(&self) -> &RollOptions {
        &self.roll_options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_path_nested() {
        let data = json!({"a": {"b": [{"c": 7}]}});
        assert_eq!(lookup_path(&data, "a.b.0.c"), Some(&json!(7)));
        assert_eq!(lookup_path(&data, "a.b.x"), None);
        assert_eq!(lookup_path(&data, "a.b.0.c.d"), None);
        assert_eq!(lookup_path(&data, ""), Some(&data));
    }

    #[test]
    fn test_item_lookup() {
        let item = ItemContext::new("Rage")
            .with_slug("rage")
            .with_data(json!({"level": 2}));
        assert_eq!(item.lookup("name"), Some(json!("Rage")));
        assert_eq!(item.lookup("slug"), Some(json!("rage")));
        assert_eq!(item.lookup("level"), Some(json!(2)));
        assert_eq!(item.lookup("missing"), None);
    }

    #[test]
    fn test_params_resolvables_and_injectables() {
        let mut params = DeferredValueParams::new().with_resolvable("target", json!({"ac": 18}));
        params.set_injectable("weapon", json!({"slug": "longsword"}));

        assert_eq!(
            params.resolvable("target").and_then(|t| lookup_path(t, "ac")),
            Some(&json!(18))
        );
        assert_eq!(params.injectable("weapon"), Some(&json!({"slug": "longsword"})));
        assert!(params.resolvable("weapon").is_none());
    }

    #[test]
    fn test_params_roll_options() {
        let mut params = DeferredValueParams::new();
        assert!(!params.roll_options().contains("self:prone"));
        params.add_roll_option("self:prone");
        assert!(params.roll_options().contains("self:prone"));
    }
}
