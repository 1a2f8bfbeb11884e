//! Input helpers shared by the commands

use serde_json::Value;
use std::io::Read;
use std::path::Path;

use crate::error::{CliError, Result};

/// Read a JSON or YAML document from a file, or from stdin when the path is `-`
pub fn read_document(path: &Path) -> Result<Value> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|e| CliError::Io {
            message: format!("{}: {}", path.display(), e),
        })?
    };
    parse_document(&content).map_err(|message| {
        CliError::input(format!("{}: {}", path.display(), message))
    })
}

/// Parse a single JSON or YAML document
pub fn parse_document(content: &str) -> std::result::Result<Value, String> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Err("document is empty".to_string());
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str(trimmed) {
            return Ok(value);
        }
    }

    let value: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Err("document is empty".to_string()),
        other => Err(format!("expected an object, got {}", kind_of(&other))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
