//! Typed lookups used to seed controls at construction time.
//!
//! The declarative file format is not defined here. `Properties` is the
//! seam; `JsonProperties` is a concrete source backed by `serde_json`.

use serde_json::Value;

use crate::Vec2;
use crate::error::Result;

pub trait Properties {
    /// Control type name of this namespace, e.g. `"button"`.
    fn namespace(&self) -> &str;
    fn exists(&self, key: &str) -> bool;
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_float(&self, key: &str) -> Option<f32>;
    fn get_vector2(&self, key: &str) -> Option<Vec2>;
    /// A nested namespace such as `layout`.
    fn get_namespace(&self, key: &str) -> Option<Box<dyn Properties>>;
    /// Child control namespaces, in declaration order.
    fn children(&self) -> Vec<Box<dyn Properties>>;
}

#[derive(Clone, Debug)]
pub struct JsonProperties {
    kind: String,
    value: Value,
}

impl JsonProperties {
    pub fn new(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self { kind, value }
    }

    pub fn from_json(src: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(src)?))
    }
}

fn parse_vector2(v: &Value) -> Option<Vec2> {
    match v {
        Value::Array(a) if a.len() == 2 => Some(Vec2::new(
            a[0].as_f64()? as f32,
            a[1].as_f64()? as f32,
        )),
        Value::Object(o) => Some(Vec2::new(
            o.get("x")?.as_f64()? as f32,
            o.get("y")?.as_f64()? as f32,
        )),
        // "x, y"
        Value::String(s) => {
            let mut it = s.split(',').map(|p| p.trim().parse::<f32>());
            let x = it.next()?.ok()?;
            let y = it.next()?.ok()?;
            Some(Vec2::new(x, y))
        }
        _ => None,
    }
}

impl Properties for JsonProperties {
    fn namespace(&self) -> &str {
        &self.kind
    }

    fn exists(&self, key: &str) -> bool {
        self.value.get(key).is_some()
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.value.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.value.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn get_float(&self, key: &str) -> Option<f32> {
        match self.value.get(key)? {
            Value::Number(n) => n.as_f64().map(|f| f as f32),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn get_vector2(&self, key: &str) -> Option<Vec2> {
        parse_vector2(self.value.get(key)?)
    }

    fn get_namespace(&self, key: &str) -> Option<Box<dyn Properties>> {
        match self.value.get(key)? {
            v @ Value::Object(_) => Some(Box::new(JsonProperties::new(v.clone()))),
            _ => None,
        }
    }

    fn children(&self) -> Vec<Box<dyn Properties>> {
        self.value
            .get("controls")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|v| Box::new(JsonProperties::new(v.clone())) as Box<dyn Properties>)
                    .collect()
            })
            .unwrap_or_default()
    }
}
