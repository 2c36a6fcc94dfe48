//! Template rendering over a schema-less value context.
//!
//! Rendering is pure: the same (template, context, now) triple always
//! produces the same output. Wall-clock time only enters through the
//! injected [`Clock`], which feeds the built-in date variables.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use indexmap::IndexMap;

use baseops_core::{Clock, SystemClock, Value};

use crate::parser::{parse, Node};
use crate::TemplateError;

/// Renders templates against a [`Value`] context.
pub struct Renderer {
    clock: Arc<dyn Clock>,
}

impl Renderer {
    /// Renderer using the system clock for built-in date variables.
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
        }
    }

    /// Renderer with an injected clock (fixed clocks make output fully
    /// deterministic in tests).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Parse and render `template` against `context`.
    ///
    /// Missing dotted paths render as the empty string; an each-target
    /// that exists but is not a list is a [`TemplateError::Render`].
    pub fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError> {
        let nodes = parse(template)?;
        let builtins = builtin_vars(self.clock.now());
        let mut out = String::with_capacity(template.len());
        let mut scope = Scope {
            context,
            builtins: &builtins,
            elements: Vec::new(),
            indices: Vec::new(),
        };
        render_nodes(&nodes, &mut scope, &mut out)?;
        Ok(out)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in date variables, computed once per render call.
fn builtin_vars(now: DateTime<Utc>) -> IndexMap<String, Value> {
    let today = now.date_naive();
    // Monday of the current ISO week.
    let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let mut vars = IndexMap::new();
    vars.insert(
        "TODAY".to_string(),
        Value::String(today.format("%Y-%m-%d").to_string()),
    );
    vars.insert(
        "YESTERDAY".to_string(),
        Value::String((today - Duration::days(1)).format("%Y-%m-%d").to_string()),
    );
    vars.insert(
        "NOW".to_string(),
        Value::String(now.format("%Y-%m-%d %H:%M").to_string()),
    );
    vars.insert(
        "WEEK_START".to_string(),
        Value::String(week_start.format("%Y-%m-%d").to_string()),
    );
    vars.insert(
        "WEEK_END".to_string(),
        Value::String(
            (week_start + Duration::days(6))
                .format("%Y-%m-%d")
                .to_string(),
        ),
    );
    vars
}

/// Resolution scope: loop element stack over the root context, with
/// built-ins as the final fallback.
struct Scope<'a> {
    context: &'a Value,
    builtins: &'a IndexMap<String, Value>,
    /// Innermost-last stack of current each-block elements.
    elements: Vec<Value>,
    /// Zero-based iteration indices, parallel to `elements`.
    indices: Vec<usize>,
}

impl<'a> Scope<'a> {
    /// Resolve a variable path. `None` renders as the empty string.
    fn resolve(&self, path: &str) -> Option<Value> {
        if path == "@index" {
            return self.indices.last().map(|i| Value::Number(*i as f64));
        }

        if let Some(rest) = path.strip_prefix("this") {
            if rest.is_empty() {
                return self.elements.last().cloned();
            }
            if let Some(sub) = rest.strip_prefix('.') {
                return self.elements.last()?.get_path(sub).cloned();
            }
            // e.g. `thistle` — an ordinary variable, not the loop binding.
        }

        self.lookup(path)
    }

    /// Plain lookup: loop elements innermost-first, then the root context,
    /// then built-ins. The first scope whose map contains the leading
    /// segment wins.
    fn lookup(&self, path: &str) -> Option<Value> {
        let head = path.split('.').next().unwrap_or(path);
        for element in self.elements.iter().rev() {
            if let Value::Map(map) = element {
                if map.contains_key(head) {
                    return element.get_path(path).cloned();
                }
            }
        }
        if let Some(found) = self.context.get_path(path) {
            return Some(found.clone());
        }
        self.builtins.get(path).cloned()
    }
}

fn render_nodes(
    nodes: &[Node],
    scope: &mut Scope<'_>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(path) => {
                if let Some(value) = scope.resolve(path) {
                    out.push_str(&value.display());
                }
            }
            Node::If { path, body } => {
                let truthy = scope.resolve(path).map(|v| v.is_truthy()).unwrap_or(false);
                if truthy {
                    render_nodes(body, scope, out)?;
                }
            }
            Node::Each { path, body } => render_each(path, body, scope, out)?,
        }
    }
    Ok(())
}

fn render_each(
    path: &str,
    body: &[Node],
    scope: &mut Scope<'_>,
    out: &mut String,
) -> Result<(), TemplateError> {
    let target = match scope.resolve(path) {
        // A missing each-target renders nothing (sparse contexts are
        // routine); only a present non-list value is a structural error.
        None => return Ok(()),
        Some(Value::Null) => return Ok(()),
        Some(Value::List(items)) => items,
        Some(other) => {
            return Err(TemplateError::Render(format!(
                "each-target '{}' is not a list (found {})",
                path,
                kind_name(&other)
            )));
        }
    };

    for (index, item) in target.into_iter().enumerate() {
        // Skip rows whose every field is empty — sparse table exports
        // frequently carry such placeholder records.
        if let Value::Map(map) = &item {
            if !map.is_empty() && map.values().all(Value::is_empty_content) {
                continue;
            }
        }

        scope.elements.push(item);
        scope.indices.push(index);
        let result = render_nodes(body, scope, out);
        scope.elements.pop();
        scope.indices.pop();
        result?;
    }
    Ok(())
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::List(_) => "a list",
        Value::Map(_) => "a mapping",
    }
}

// ── Tests ───────────────────────────────────────────────────────────
