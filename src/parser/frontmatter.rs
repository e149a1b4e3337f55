//! Frontmatter extraction.
//!
//! A document has frontmatter when its first line is `---`. The header runs
//! to the next `---` (or `...`) line and is parsed as YAML. Headers that
//! are not valid YAML still yield whatever `key: value` pairs can be read.

use crate::models::Frontmatter;
use serde_json::Value;

const DELIMITER: &str = "---";
const ALT_CLOSER: &str = "...";

/// Extract the frontmatter mapping and the 1-based line of its closing
/// delimiter (0 when the document has no frontmatter).
pub fn extract(text: &str) -> (Frontmatter, usize) {
    let mut lines = text.lines();
    if lines.next().map(str::trim_end) != Some(DELIMITER) {
        return (Frontmatter::new(), 0);
    }

    let mut body = Vec::new();
    for (idx, line) in lines.enumerate() {
        let trimmed = line.trim_end();
        if trimmed == DELIMITER || trimmed == ALT_CLOSER {
            let end_line = idx + 2;
            return (parse_header(&body.join("\n")), end_line);
        }
        body.push(line);
    }

    (Frontmatter::new(), 0)
}

/// Parse a header body, YAML first and line-by-line as a fallback.
pub fn parse_header(body: &str) -> Frontmatter {
    match serde_yaml::from_str::<serde_yaml::Value>(body) {
        Ok(serde_yaml::Value::Mapping(map)) => map
            .into_iter()
            .map(|(key, value)| (yaml_key(&key), yaml_to_json(value)))
            .collect(),
        Ok(serde_yaml::Value::Null) => Frontmatter::new(),
        _ => parse_loose(body),
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (yaml_key(&key), yaml_to_json(value)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Line-oriented reader for headers YAML rejects.
fn parse_loose(body: &str) -> Frontmatter {
    let mut map = Frontmatter::new();
    let mut list_key: Option<String> = None;

    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix('-') {
            if let Some(key) = &list_key {
                let entry = map.entry(key.clone()).or_insert(Value::Null);
                if !entry.is_array() {
                    *entry = Value::Array(Vec::new());
                }
                if let Value::Array(items) = entry {
                    items.push(scalar(item.trim()));
                }
            }
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            list_key = None;
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            list_key = None;
            continue;
        }

        let value = value.trim();
        if value.is_empty() {
            map.insert(key.to_string(), Value::Null);
            list_key = Some(key.to_string());
        } else {
            map.insert(key.to_string(), inline_value(value));
            list_key = None;
        }
    }

    map
}

fn inline_value(value: &str) -> Value {
    match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        Some(inner) if inner.trim().is_empty() => Value::Array(Vec::new()),
        Some(inner) => Value::Array(inner.split(',').map(|item| scalar(item.trim())).collect()),
        None => scalar(value),
    }
}

fn scalar(value: &str) -> Value {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return Value::String(value[1..value.len() - 1].to_string());
        }
    }
    match value {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "~" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = value.parse::<i64>() {
        return Value::from(i);
    }
    if let Some(n) = value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return Value::Number(n);
    }
    Value::String(value.to_string())
}
