//! Field guesses produced by the model path.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scalar value proposed for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Convert a JSON value, keeping only numbers and strings.
    ///
    /// Booleans, nulls, arrays and objects yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Int)
                .or_else(|| n.as_f64().map(FieldValue::Float)),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(_) => None,
        }
    }

    /// String view of the value, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One key/value pair proposed for a single line.
///
/// Serializes as a one-entry object `{"key": value}` so the field that
/// produced a value stays visible in the output.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGuess {
    pub key: String,
    pub value: FieldValue,
}

impl FieldGuess {
    pub fn new(key: impl Into<String>, value: FieldValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl Serialize for FieldGuess {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.value)?;
        map.end()
    }
}

/// Insertion-ordered field map merged across lines.
///
/// Inserting a key that is already present replaces its value but keeps
/// the position of the first insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldGuesses {
    entries: Vec<FieldGuess>,
}

impl FieldGuesses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field value.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => existing.value = value,
            None => self.entries.push(FieldGuess { key, value }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldGuess> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Extend<FieldGuess> for FieldGuesses {
    fn extend<I: IntoIterator<Item = FieldGuess>>(&mut self, iter: I) {
        for guess in iter {
            self.insert(guess.key, guess.value);
        }
    }
}

impl FromIterator<FieldGuess> for FieldGuesses {
    fn from_iter<I: IntoIterator<Item = FieldGuess>>(iter: I) -> Self {
        let mut guesses = Self::new();
        guesses.extend(iter);
        guesses
    }
}

impl Serialize for FieldGuesses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.value)?;
        }
        map.end()
    }
}
