//! Template filters that turn template values into Ruby source literals.
//!
//! - `sym`: identifiers as symbols (`:payer`, `[:a, :b]`)
//! - `ruby`: any value as a literal (`"text"`, `42`, `nil`, `{ a: 1 }`)
//! - `kwargs(exclude...)`: a map as trailing keyword arguments (`, a: 1`)

use minijinja::value::{Rest, Value};
use minijinja::{Error, ErrorKind};
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

/// Option keys whose string values name database objects and render as symbols
pub(crate) const SYMBOL_OPTIONS: &[&str] = &[
    "algorithm",
    "column",
    "on_delete",
    "on_update",
    "primary_key",
    "to_table",
    "type",
    "using",
];

static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();

fn identifier_regex() -> &'static Regex {
    IDENTIFIER_RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*[?!]?$").expect("valid regex"))
}

fn to_json(value: &Value) -> Result<JsonValue, Error> {
    serde_json::to_value(value).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot convert template value: {}", e),
        )
    })
}

fn require_defined(value: &Value, filter: &str) -> Result<(), Error> {
    if value.is_undefined() {
        return Err(Error::new(
            ErrorKind::UndefinedError,
            format!("{}: missing argument", filter),
        ));
    }
    Ok(())
}

/// Double-quoted Ruby string with interpolation disabled
pub(crate) fn ruby_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('#', "\\#")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}

fn hash_key(key: &str) -> String {
    if identifier_regex().is_match(key) {
        key.to_string()
    } else {
        ruby_string(key)
    }
}

/// Render a JSON value as a Ruby literal
pub(crate) fn ruby_literal(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "nil".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => ruby_string(s),
        JsonValue::Array(items) => {
            let items: Vec<String> = items.iter().map(ruby_literal).collect();
            format!("[{}]", items.join(", "))
        }
        JsonValue::Object(map) if map.is_empty() => "{}".to_string(),
        JsonValue::Object(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", hash_key(k), ruby_literal(v)))
                .collect();
            format!("{{ {} }}", pairs.join(", "))
        }
    }
}

/// Render strings as symbols, recursing into arrays
pub(crate) fn ruby_symbol(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) if identifier_regex().is_match(s) => format!(":{}", s),
        JsonValue::String(s) => format!(":{}", ruby_string(s)),
        JsonValue::Array(items) => {
            let items: Vec<String> = items.iter().map(ruby_symbol).collect();
            format!("[{}]", items.join(", "))
        }
        other => ruby_literal(other),
    }
}

/// Render a map as keyword arguments, each pair prefixed with `, `
pub(crate) fn ruby_kwargs(options: &JsonValue, exclude: &[String]) -> Result<String, String> {
    let map = match options {
        JsonValue::Null => return Ok(String::new()),
        JsonValue::Object(map) => map,
        other => return Err(format!("expected a map of options, got {}", other)),
    };

    let mut out = String::new();
    for (key, value) in map {
        if exclude.iter().any(|e| e == key) {
            continue;
        }
        let rendered = if SYMBOL_OPTIONS.contains(&key.as_str()) {
            ruby_symbol(value)
        } else {
            ruby_literal(value)
        };
        out.push_str(&format!(", {}: {}", hash_key(key), rendered));
    }
    Ok(out)
}

/// `{{ value | sym }}`
pub(crate) fn sym(value: Value) -> Result<String, Error> {
    require_defined(&value, "sym")?;
    Ok(ruby_symbol(&to_json(&value)?))
}

/// `{{ value | ruby }}`
pub(crate) fn ruby(value: Value) -> Result<String, Error> {
    require_defined(&value, "ruby")?;
    Ok(ruby_literal(&to_json(&value)?))
}

/// `{{ options | kwargs("skip", ...) }}`
pub(crate) fn kwargs(options: Value, exclude: Rest<String>) -> Result<String, Error> {
    if options.is_undefined() {
        return Ok(String::new());
    }
    ruby_kwargs(&to_json(&options)?, &exclude)
        .map_err(|message| Error::new(ErrorKind::InvalidOperation, message))
}

#[cfg(test)]
#[path = "filters_test.rs"]
mod tests;
