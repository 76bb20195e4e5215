//! Conversion between [`Value`] and `serde_json::Value`.

use serde_json::{Map, Number};

use super::{Object, Shape, Value};
use crate::error::{ReactiveError, Result};

impl Value {
    /// Build fresh plain data from a JSON document.
    ///
    /// Every JSON object and array becomes a new, unobserved [`Object`].
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Object(Object::array(items.iter().map(Value::from_json)))
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), Value::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Snapshot this value as JSON without registering dependencies.
    ///
    /// Non-finite numbers become `null`. Cyclic data is an error.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut path = Vec::new();
        to_json_inner(self, "", &mut path)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

/// Largest integer magnitude an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

fn to_json_inner(value: &Value, key: &str, path: &mut Vec<usize>) -> Result<serde_json::Value> {
    let object = match value {
        Value::Null => return Ok(serde_json::Value::Null),
        Value::Bool(b) => return Ok(serde_json::Value::Bool(*b)),
        Value::Number(n) => return Ok(number_to_json(*n)),
        Value::String(s) => return Ok(serde_json::Value::String(s.clone())),
        Value::Object(object) => object,
    };

    if path.contains(&object.addr()) {
        return Err(ReactiveError::CyclicStructure { key: key.to_owned() });
    }
    path.push(object.addr());

    let entries = object.entries_untracked();
    let json = match object.shape() {
        Shape::Array => serde_json::Value::Array(
            entries
                .iter()
                .map(|(key, value)| to_json_inner(value, key, path))
                .collect::<Result<_>>()?,
        ),
        Shape::Map => {
            let mut map = Map::new();
            for (key, value) in &entries {
                map.insert(key.clone(), to_json_inner(value, key, path)?);
            }
            serde_json::Value::Object(map)
        }
    };

    path.pop();
    Ok(json)
}
