//! Conversion between Terraform state and Kubernetes object JSON
//!
//! State uses the snake_case attribute names of a [`Schema`](crate::attribute::Schema),
//! objects use the camelCase JSON names recorded on each attribute.

use serde_json::{Map, Number, Value};

use crate::attribute::{AttributeKind, AttributePath, Attributes, is_integral, json_type};
use crate::error::{CoreError, Result};

/// Convert state values into Kubernetes JSON fields
///
/// Null attributes are omitted and attributes without a JSON name are
/// skipped. State keys unknown to the schema are rejected.
pub fn state_to_object(attributes: &Attributes, state: &Map<String, Value>) -> Result<Map<String, Value>> {
    attributes_to_json(attributes, state, &AttributePath::root())
}

/// Convert Kubernetes JSON fields into state values
///
/// Every attribute appears in the result, null when the object lacks it.
/// Fields unknown to the schema are dropped.
pub fn object_to_state(attributes: &Attributes, object: &Map<String, Value>) -> Result<Map<String, Value>> {
    json_to_attributes(attributes, object, &AttributePath::root())
}

fn attributes_to_json(
    attributes: &Attributes,
    state: &Map<String, Value>,
    path: &AttributePath,
) -> Result<Map<String, Value>> {
    if let Some(unknown) = state.keys().find(|name| !attributes.contains_key(*name)) {
        return Err(CoreError::conversion(
            path.attribute(unknown),
            "unsupported attribute",
        ));
    }

    let mut object = Map::new();
    for (name, attribute) in attributes {
        let Some(json_name) = &attribute.json_name else {
            continue;
        };
        let value = match state.get(name) {
            None | Some(Value::Null) => continue,
            Some(value) => value,
        };
        let attribute_path = path.attribute(name);
        let converted = if attribute.int_or_string {
            int_or_string_to_json(value, &attribute_path)?
        } else {
            value_to_json(&attribute.kind, value, &attribute_path)?
        };
        object.insert(json_name.clone(), converted);
    }
    Ok(object)
}

fn int_or_string_to_json(value: &Value, path: &AttributePath) -> Result<Value> {
    match value {
        Value::String(s) => Ok(s
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or_else(|_| value.clone())),
        Value::Number(n) if is_integral(n) => Ok(integer(n)),
        other => Err(mismatch("string or integer", other, path)),
    }
}

fn value_to_json(kind: &AttributeKind, value: &Value, path: &AttributePath) -> Result<Value> {
    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (AttributeKind::Dynamic, value) => Ok(value.clone()),
        (AttributeKind::String, Value::String(_))
        | (AttributeKind::Bool, Value::Bool(_))
        | (AttributeKind::Float64, Value::Number(_)) => Ok(value.clone()),
        (AttributeKind::Int64, Value::Number(n)) if is_integral(n) => Ok(integer(n)),
        (AttributeKind::Int64, Value::Number(n)) => Err(CoreError::conversion(
            path,
            format!("{} is not a 64-bit integer", n),
        )),
        (AttributeKind::List { element }, Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| value_to_json(element, item, &path.index(i)))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        (AttributeKind::Map { element }, Value::Object(entries)) => {
            let mut map = Map::new();
            for (key, entry) in entries {
                if entry.is_null() {
                    continue;
                }
                map.insert(key.clone(), value_to_json(element, entry, &path.key(key))?);
            }
            Ok(Value::Object(map))
        }
        (AttributeKind::Object { attributes }, Value::Object(state)) => {
            attributes_to_json(attributes, state, path).map(Value::Object)
        }
        (kind, value) => Err(mismatch(&kind.type_name(), value, path)),
    }
}

fn json_to_attributes(
    attributes: &Attributes,
    object: &Map<String, Value>,
    path: &AttributePath,
) -> Result<Map<String, Value>> {
    let mut state = Map::new();
    for (name, attribute) in attributes {
        let value = match attribute.json_name.as_ref().and_then(|json| object.get(json)) {
            Some(value) => json_to_value(&attribute.kind, value, &path.attribute(name))?,
            None => Value::Null,
        };
        state.insert(name.clone(), value);
    }
    Ok(state)
}

fn json_to_value(kind: &AttributeKind, value: &Value, path: &AttributePath) -> Result<Value> {
    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (AttributeKind::Dynamic, value) => Ok(value.clone()),
        (AttributeKind::String, Value::String(_)) => Ok(value.clone()),
        (AttributeKind::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (AttributeKind::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
        (AttributeKind::Bool, Value::Bool(_)) | (AttributeKind::Float64, Value::Number(_)) => {
            Ok(value.clone())
        }
        (AttributeKind::Int64, Value::Number(n)) if is_integral(n) => Ok(integer(n)),
        (AttributeKind::Int64, Value::Number(n)) => Err(CoreError::conversion(
            path,
            format!("{} is not a 64-bit integer", n),
        )),
        (AttributeKind::Int64, Value::String(s)) => s
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|_| mismatch("number", value, path)),
        (AttributeKind::List { element }, Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| json_to_value(element, item, &path.index(i)))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        (AttributeKind::Map { element }, Value::Object(entries)) => {
            let mut map = Map::new();
            for (key, entry) in entries {
                map.insert(key.clone(), json_to_value(element, entry, &path.key(key))?);
            }
            Ok(Value::Object(map))
        }
        (AttributeKind::Object { attributes }, Value::Object(object)) => {
            json_to_attributes(attributes, object, path).map(Value::Object)
        }
        (kind, value) => Err(mismatch(&kind.type_name(), value, path)),
    }
}

/// Normalize an integral number to an integer representation
fn integer(n: &Number) -> Value {
    if n.is_i64() || n.is_u64() {
        return Value::Number(n.clone());
    }
    match n.as_f64() {
        Some(f) => Value::Number(Number::from(f as i64)),
        None => Value::Number(n.clone()),
    }
}

fn mismatch(expected: &str, value: &Value, path: &AttributePath) -> CoreError {
    CoreError::conversion(
        path,
        format!("expected {}, got {}", expected, json_type(value)),
    )
}
