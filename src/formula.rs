//! Value resolution: property injection and formula evaluation.
//!
//! Rule sources refer to other data in two ways:
//!
//! - **Injections** `{root|path}` are replaced textually, before a string
//!   is used as a selector, damage type or formula.
//! - **References** `@root.path` inside a value formula are looked up and
//!   read as numbers while the formula is evaluated.
//!
//! Roots are `actor`, `item` and `rule`, plus whatever named data the
//! caller of a deferred value supplies in `DeferredValueParams`.
//!
//! Formulas support `+ - * / %`, parentheses, unary signs and the
//! functions `floor`, `ceil`, `round`, `trunc`, `abs`, `min` and `max`.
//! References are substituted here; `evalexpr` does the arithmetic.

use crate::context::{lookup_path, DeferredValueParams, ItemContext};
use crate::error::RuleError;
use crate::numeric::coerce_number;
use evalexpr::{
    ContextWithMutableFunctions, EvalexprError, EvalexprResult, Function, HashMapContext,
    Value as EvalValue,
};
use serde_json::{Map, Value};

/// Everything a value or injection may refer to.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    actor: &'a Value,
    item: &'a ItemContext,
    rule: &'a Value,
    params: Option<&'a DeferredValueParams>,
}

impl<'a> ResolveContext<'a> {
    /// Context for registration-time resolution.
    pub fn new(actor: &'a Value, item: &'a ItemContext, rule: &'a Value) -> Self {
        Self {
            actor,
            item,
            rule,
            params: None,
        }
    }

    /// Add roll-time parameters. Their resolvables shadow the fixed roots.
    pub fn with_params(mut self, params: &'a DeferredValueParams) -> Self {
        self.params = Some(params);
        self
    }

    fn fixed_root(&self, root: &str, path: &str) -> Option<Value> {
        match root {
            "actor" => lookup_path(self.actor, path).cloned(),
            "item" => self.item.lookup(path),
            "rule" => lookup_path(self.rule, path).cloned(),
            _ => None,
        }
    }

    /// Resolve an `@root.path` reference.
    pub fn reference(&self, root: &str, path: &str) -> Option<Value> {
        match self.params.and_then(|p| p.resolvable(root)) {
            Some(data) => lookup_path(data, path).cloned(),
            None => self.fixed_root(root, path),
        }
    }

    /// Resolve a `{root|path}` injection.
    pub fn injection(&self, root: &str, path: &str) -> Option<Value> {
        self.fixed_root(root, path).or_else(|| {
            self.params
                .and_then(|p| p.injectable(root))
                .and_then(|data| lookup_path(data, path).cloned())
        })
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_root_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Replace every `{root|path}` in `source` with the referenced value.
///
/// Braces that do not enclose a `root|path` pair are left alone.
///
/// # Errors
///
/// `RuleError::UnresolvedInjection` if a referenced value does not exist.
///
/// # Examples
///
/// ```rust
/// use zzmod::formula::{inject_properties, ResolveContext};
/// use zzmod::ItemContext;
/// use serde_json::json;
///
/// let actor = json!({"skills": {"best": "athletics"}});
/// let item = ItemContext::new("Feat");
/// let rule = json!({});
/// let ctx = ResolveContext::new(&actor, &item, &rule);
///
/// assert_eq!(inject_properties("{actor|skills.best}-check", &ctx).unwrap(), "athletics-check");
/// assert!(inject_properties("{actor|skills.worst}", &ctx).is_err());
/// ```
pub fn inject_properties(source: &str, ctx: &ResolveContext<'_>) -> Result<String, RuleError> {
    let mut output = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let injection = after_open.find('}').and_then(|close| {
            let (root, path) = after_open[..close].split_once('|')?;
            is_root_name(root).then_some((root, path, close))
        });
        match injection {
            Some((root, path, close)) => {
                let value = ctx
                    .injection(root, path)
                    .ok_or_else(|| RuleError::UnresolvedInjection(format!("{root}|{path}")))?;
                output.push_str(&display_value(&value));
                rest = &after_open[close + 1..];
            }
            None => {
                output.push('{');
                rest = after_open;
            }
        }
    }
    output.push_str(rest);
    Ok(output)
}

/// Resolve a raw rule value to a number.
///
/// Numbers pass through. Strings are injected and then evaluated as
/// formulas; an empty string is zero. Objects with a `brackets` list pick
/// the bracket containing the value of `field` (default `actor|level`).
/// Anything that cannot be resolved, including a malformed formula,
/// is zero.
///
/// # Examples
///
/// ```rust
/// use zzmod::formula::{resolve_value, ResolveContext};
/// use zzmod::ItemContext;
/// use serde_json::json;
///
/// let actor = json!({"level": 7, "abilities": {"str": {"mod": 4}}});
/// let item = ItemContext::new("Feat");
/// let rule = json!({});
/// let ctx = ResolveContext::new(&actor, &item, &rule);
///
/// assert_eq!(resolve_value(&json!(2), &ctx), 2.0);
/// assert_eq!(resolve_value(&json!("@actor.abilities.str.mod + 1"), &ctx), 5.0);
/// assert_eq!(resolve_value(&json!("floor(@actor.level / 2)"), &ctx), 3.0);
/// assert_eq!(
///     resolve_value(&json!({"brackets": [{"end": 4, "value": 1}, {"start": 5, "value": 2}]}), &ctx),
///     2.0
/// );
/// ```
pub fn resolve_value(raw: &Value, ctx: &ResolveContext<'_>) -> f64 {
    let value = match raw {
        Value::String(formula) if formula.trim().is_empty() => 0.0,
        Value::String(formula) => match inject_properties(formula, ctx)
            .and_then(|injected| evaluate_formula(&injected, ctx))
        {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Could not resolve rule value, using 0");
                0.0
            }
        },
        Value::Object(map) if map.contains_key("brackets") => resolve_bracketed(map, ctx),
        other => coerce_number(other),
    };
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

fn resolve_bracketed(map: &Map<String, Value>, ctx: &ResolveContext<'_>) -> f64 {
    let field = map
        .get("field")
        .and_then(Value::as_str)
        .unwrap_or("actor|level");
    let Some((root, path)) = field.split_once('|') else {
        tracing::warn!(field, "Bracketed value field must have the form root|path");
        return 0.0;
    };
    let field_value = ctx
        .reference(root, path)
        .map(|v| coerce_number(&v))
        .unwrap_or(0.0);

    let brackets = map.get("brackets").and_then(Value::as_array);
    let bracket = brackets.into_iter().flatten().find(|bracket| {
        let start = bracket.get("start").map(coerce_number).unwrap_or(f64::NEG_INFINITY);
        let end = bracket.get("end").map(coerce_number).unwrap_or(f64::INFINITY);
        start <= field_value && field_value <= end
    });
    match bracket.and_then(|b| b.get("value")) {
        Some(value) => resolve_value(value, ctx),
        None => 0.0,
    }
}

/// Longest formula accepted, in bytes.
const MAX_FORMULA_LEN: usize = 1024;

/// Deepest parenthesis nesting, and longest run of signs, accepted.
const MAX_NESTING: usize = 64;

/// Evaluate an arithmetic formula. References are read as numbers;
/// missing references count as zero.
///
/// References are substituted first; the arithmetic itself is handed to
/// `evalexpr` with the formula functions registered in its context.
///
/// # Errors
///
/// `RuleError::Formula` when the formula cannot be parsed, is nested too
/// deeply, or does not evaluate to a number.
pub fn evaluate_formula(formula: &str, ctx: &ResolveContext<'_>) -> Result<f64, RuleError> {
    let fail = |reason: String| RuleError::Formula {
        formula: formula.to_string(),
        reason,
    };
    let expression = substitute_references(formula, ctx).map_err(fail)?;
    let functions = function_context().map_err(|e| fail(e.to_string()))?;
    evalexpr::eval_number_with_context(&expression, &functions).map_err(|e| fail(e.to_string()))
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Rewrite a formula for the expression engine.
///
/// `@root.path` references become parenthesized numbers, and integer
/// literals become float literals so `10 / 4` is `2.5`.
fn substitute_references(formula: &str, ctx: &ResolveContext<'_>) -> Result<String, String> {
    if formula.len() > MAX_FORMULA_LEN {
        return Err(format!("longer than {MAX_FORMULA_LEN} bytes"));
    }

    let mut output = String::with_capacity(formula.len() + 16);
    let mut depth = 0usize;
    let mut signs = 0usize;
    let mut chars = formula.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        let mut end = start + c.len_utf8();
        if c == '@' || is_word_char(c) {
            while let Some(&(i, d)) = chars.peek() {
                if !is_word_char(d) {
                    break;
                }
                end = i + d.len_utf8();
                chars.next();
            }
        }

        match c {
            '@' => {
                let path = formula[start + 1..end].trim_end_matches('.');
                if path.is_empty() {
                    return Err("empty reference".to_string());
                }
                let (root, rest) = path.split_once('.').unwrap_or((path, ""));
                let value = ctx
                    .reference(root, rest)
                    .map(|v| coerce_number(&v))
                    .unwrap_or(0.0);
                output.push_str(&format!("({value:?})"));
            }
            c if is_word_char(c) => {
                let word = &formula[start..end];
                output.push_str(word);
                if word.bytes().all(|b| b.is_ascii_digit()) {
                    output.push_str(".0");
                }
            }
            c if c.is_whitespace() => {
                output.push(c);
                continue;
            }
            '+' | '-' => {
                signs += 1;
                if signs > MAX_NESTING {
                    return Err(format!("more than {MAX_NESTING} consecutive signs"));
                }
                output.push(c);
                continue;
            }
            '(' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(format!("nested deeper than {MAX_NESTING}"));
                }
                output.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                output.push(c);
            }
            '*' | '/' | '%' | ',' => output.push(c),
            other => return Err(format!("unexpected character {other:?}")),
        }
        signs = 0;
    }
    Ok(output)
}

/// The functions formulas may call. `round` sends halves toward positive
/// infinity; `min` and `max` take any number of arguments.
fn function_context() -> EvalexprResult<HashMapContext> {
    let mut context = HashMapContext::new();
    context.set_function("floor".to_string(), unary_function(f64::floor))?;
    context.set_function("ceil".to_string(), unary_function(f64::ceil))?;
    context.set_function("round".to_string(), unary_function(|x| (x + 0.5).floor()))?;
    context.set_function("trunc".to_string(), unary_function(f64::trunc))?;
    context.set_function("abs".to_string(), unary_function(f64::abs))?;
    context.set_function(
        "min".to_string(),
        Function::new(|argument| fold_arguments(argument, f64::INFINITY, f64::min)),
    )?;
    context.set_function(
        "max".to_string(),
        Function::new(|argument| fold_arguments(argument, f64::NEG_INFINITY, f64::max)),
    )?;
    Ok(context)
}

fn unary_function(f: fn(f64) -> f64) -> Function {
    Function::new(move |argument| Ok(EvalValue::Float(f(argument.as_number()?))))
}

fn fold_arguments(
    argument: &EvalValue,
    init: f64,
    f: fn(f64, f64) -> f64,
) -> EvalexprResult<EvalValue> {
    let values = match argument {
        EvalValue::Tuple(values) => values
            .iter()
            .map(EvalValue::as_number)
            .collect::<EvalexprResult<Vec<_>>>()?,
        EvalValue::Empty => Vec::new(),
        value => vec![value.as_number()?],
    };
    if values.is_empty() {
        return Err(EvalexprError::CustomMessage(
            "expected at least one argument".to_string(),
        ));
    }
    Ok(EvalValue::Float(values.into_iter().fold(init, f)))
}
