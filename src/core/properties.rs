//=========================================================================
// Properties
//=========================================================================
//
// Keyword-style attribute bag used for scene arguments and generic
// nodes.
//
// Usage:
//   Properties::new().with("speed", 4.0).with("name", "player")
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use glam::Vec2;

//=== Internal Dependencies ===============================================

use crate::core::color::Color;

//=== Value ===============================================================

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Color(Color),
    Vector(Vec2),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Value::Color(v)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Value::Vector(v)
    }
}

//=== Properties ==========================================================

/// Named attribute values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: HashMap<String, Value>,
}

/// Keyword arguments handed to scene factories.
pub type SceneArgs = Properties;

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copies every entry of `other` over this bag.
    pub fn merge(&mut self, other: &Properties) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    //--- Typed Accessors --------------------------------------------------

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Reads an integer or float as `f64`.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_color(&self, key: &str) -> Option<Color> {
        match self.get(key)? {
            Value::Color(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_vector(&self, key: &str) -> Option<Vec2> {
        match self.get(key)? {
            Value::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_match_variants() {
        let props = Properties::new()
            .with("speed", 4.5)
            .with("lives", 3)
            .with("name", "hero")
            .with("tint", Color::RED)
            .with("spawn", Vec2::new(1.0, 2.0));

        assert_eq!(props.get_f64("speed"), Some(4.5));
        assert_eq!(props.get_i64("lives"), Some(3));
        assert_eq!(props.get_f64("lives"), Some(3.0));
        assert_eq!(props.get_str("name"), Some("hero"));
        assert_eq!(props.get_color("tint"), Some(Color::RED));
        assert_eq!(props.get_vector("spawn"), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(props.get_str("speed"), None);
    }

    #[test]
    fn merge_overrides_existing_keys() {
        let mut base = Properties::new().with("a", 1).with("b", 2);
        base.merge(&Properties::new().with("b", 20).with("c", 30));
        assert_eq!(base.get_i64("a"), Some(1));
        assert_eq!(base.get_i64("b"), Some(20));
        assert_eq!(base.get_i64("c"), Some(30));
        assert_eq!(base.len(), 3);
    }
}
