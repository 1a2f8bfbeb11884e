//! Kubernetes-style JSONPath subset
//!
//! Supports `{...}` wrappers, `$`, `.field`, `['field']`, `[N]` (negative
//! counts from the end), `[*]` and equality filters such as
//! `[?(@.type=="Ready")]`.

use serde_json::Value;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(i64),
    Wildcard,
    Filter {
        path: Vec<String>,
        negate: bool,
        value: String,
    },
}

/// A compiled JSONPath expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    expression: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(expression: &str) -> Result<Self> {
        let error = |message: &str| CoreError::JsonPath {
            expression: expression.to_string(),
            message: message.to_string(),
        };

        let mut rest = expression.trim();
        if let Some(inner) = rest.strip_prefix('{') {
            rest = inner
                .strip_suffix('}')
                .ok_or_else(|| error("unterminated '{'"))?
                .trim();
        }
        rest = rest.strip_prefix('$').unwrap_or(rest);

        let mut segments = Vec::new();
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let end = closing_bracket(after).ok_or_else(|| error("unterminated '['"))?;
                segments.push(parse_bracket(after[..end].trim()).map_err(|m| error(&m))?);
                rest = &after[end + 1..];
            } else {
                let after = rest.strip_prefix('.').unwrap_or(rest);
                let end = after.find(['.', '[']).unwrap_or(after.len());
                let field = &after[..end];
                if field.is_empty() {
                    return Err(error("empty field name"));
                }
                segments.push(if field == "*" {
                    Segment::Wildcard
                } else {
                    Segment::Field(field.to_string())
                });
                rest = &after[end..];
            }
        }

        Ok(Self {
            expression: expression.to_string(),
            segments,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// All values the expression selects from `root`
    pub fn query<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];
        for segment in &self.segments {
            current = current
                .into_iter()
                .flat_map(|value| select(segment, value))
                .collect();
        }
        current
    }

    /// Whether any selected value renders as `expected`
    pub fn matches(&self, root: &Value, expected: &str) -> bool {
        self.query(root).into_iter().any(|v| render(v) == expected)
    }
}

/// Render a selected value: strings raw, everything else as JSON
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn closing_bracket(s: &str) -> Option<usize> {
    let mut quote = None;
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') if depth == 0 => return Some(i),
            (None, ']') => depth -= 1,
            _ => {}
        }
    }
    None
}

fn parse_bracket(content: &str) -> std::result::Result<Segment, String> {
    if content == "*" {
        return Ok(Segment::Wildcard);
    }
    if let Some(field) = unquote(content) {
        return Ok(Segment::Field(field.to_string()));
    }
    if let Some(filter) = content
        .strip_prefix("?(")
        .and_then(|f| f.strip_suffix(')'))
    {
        return parse_filter(filter.trim());
    }
    content
        .parse::<i64>()
        .map(Segment::Index)
        .map_err(|_| format!("unsupported selector '[{}]'", content))
}

fn parse_filter(filter: &str) -> std::result::Result<Segment, String> {
    let (lhs, rhs, negate) = if let Some((lhs, rhs)) = filter.split_once("!=") {
        (lhs, rhs, true)
    } else if let Some((lhs, rhs)) = filter.split_once("==") {
        (lhs, rhs, false)
    } else {
        return Err(format!("filter '{}' must use == or !=", filter));
    };

    let path = lhs
        .trim()
        .strip_prefix('@')
        .ok_or_else(|| format!("filter '{}' must start with @", filter))?;
    let path: Vec<String> = path
        .split('.')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    let rhs = rhs.trim();
    let value = unquote(rhs).unwrap_or(rhs).to_string();

    Ok(Segment::Filter {
        path,
        negate,
        value,
    })
}

fn unquote(s: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|q| {
        s.strip_prefix(q)
            .and_then(|inner| inner.strip_suffix(q))
    })
}

fn select<'a>(segment: &Segment, value: &'a Value) -> Vec<&'a Value> {
    match segment {
        Segment::Field(name) => value.get(name).into_iter().collect(),
        Segment::Index(index) => {
            let Some(items) = value.as_array() else {
                return Vec::new();
            };
            let len = items.len() as i64;
            let index = if *index < 0 { len + index } else { *index };
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .into_iter()
                .collect()
        }
        Segment::Wildcard => match value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            _ => Vec::new(),
        },
        Segment::Filter {
            path,
            negate,
            value: expected,
        } => {
            let candidates: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                Value::Object(map) => map.values().collect(),
                _ => Vec::new(),
            };
            candidates
                .into_iter()
                .filter(|candidate| {
                    let actual = path
                        .iter()
                        .try_fold(*candidate, |v, key| v.get(key))
                        .map(render);
                    match actual {
                        Some(actual) => (actual == *expected) != *negate,
                        None => *negate,
                    }
                })
                .collect()
        }
    }
}
