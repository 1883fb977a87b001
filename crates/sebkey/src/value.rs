//! Value model for parsed SEB plist documents

use indexmap::map::{IntoIter, Iter, Keys, Values};
use indexmap::IndexMap;
use std::ops::Index;
use time::OffsetDateTime;

/// A plist value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Unrecognized tag or missing value; never stored by the walker
    #[default]
    Undefined,
    /// `<true/>` or `<false/>`
    Bool(bool),
    /// `<integer>` or `<real>`
    Number(f64),
    /// `<string>` or `<data>` text content
    String(String),
    /// Raw bytes
    Data(Vec<u8>),
    /// Point in time
    Date(OffsetDateTime),
    /// `<array>`
    Array(Vec<Value>),
    /// `<dict>`
    Dict(Dictionary),
}

impl Value {
    /// Returns true unless this value is `Undefined`
    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Undefined)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, Self::Dict(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Data(value)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(value: OffsetDateTime) -> Self {
        Self::Date(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Array(values)
    }
}

impl From<Dictionary> for Value {
    fn from(value: Dictionary) -> Self {
        Self::Dict(value)
    }
}

/// An insertion-ordered map of string keys to values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary(IndexMap<String, Value>);

impl Dictionary {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Inserts a key-value pair.
    /// An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> Values<'_, String, Value> {
        self.0.values()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }
}

static UNDEFINED: Value = Value::Undefined;

impl Index<&str> for Dictionary {
    type Output = Value;

    /// Missing keys read as `Value::Undefined`
    fn index(&self, key: &str) -> &Self::Output {
        self.0.get(key).unwrap_or(&UNDEFINED)
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Dictionary {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::{Dictionary, Value};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::ser::{Error as _, SerializeMap};
    use serde::{Serialize, Serializer};
    use time::format_description::well_known::Rfc3339;

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::Undefined => serializer.serialize_unit(),
                Self::Bool(b) => serializer.serialize_bool(*b),
                Self::Number(n) => match safe_integer(*n) {
                    Some(i) => serializer.serialize_i64(i),
                    None => serializer.serialize_f64(*n),
                },
                Self::String(s) => serializer.serialize_str(s),
                Self::Data(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
                Self::Date(date) => {
                    let text = date.format(&Rfc3339).map_err(S::Error::custom)?;
                    serializer.serialize_str(&text)
                }
                Self::Array(items) => items.serialize(serializer),
                Self::Dict(dict) => dict.serialize(serializer),
            }
        }
    }

    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    /// Whole numbers print without a fraction, as `JSON.stringify` does
    #[allow(clippy::as_conversions)]
    fn safe_integer(n: f64) -> Option<i64> {
        (n.is_finite() && n.trunc() == n && n.abs() <= MAX_SAFE_INTEGER).then(|| n as i64)
    }

    impl Serialize for Dictionary {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_methods() {
        assert!(!Value::Undefined.is_defined());
        assert!(Value::Bool(true).is_bool());
        assert!(Value::Number(42.0).is_number());
        assert!(Value::from("hello").is_string());
        assert!(Value::Array(Vec::new()).is_array());
        assert!(Value::Dict(Dictionary::new()).is_dict());
        assert!(Value::Data(Vec::new()).is_defined());
    }

    #[test]
    fn test_value_as_methods() {
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::Undefined.as_bool(), None);
        assert_eq!(Value::from(7i32).as_number(), Some(7.0));
        assert_eq!(Value::from("x").as_string(), Some("x"));
        assert_eq!(Value::Number(1.0).as_string(), None);
        assert!(Value::from(vec![Value::Bool(true)]).as_array().is_some());
        assert!(Value::Undefined.as_dict().is_none());
    }

    #[test]
    fn test_dictionary_reinsert_keeps_position() {
        let mut dict = Dictionary::new();
        dict.insert("first", 1i32);
        dict.insert("second", 2i32);
        let previous = dict.insert("first", 3i32);

        assert_eq!(previous, Some(Value::Number(1.0)));
        let keys: Vec<_> = dict.keys().collect();
        assert_eq!(keys, vec!["first", "second"]);
        assert_eq!(dict["first"], Value::Number(3.0));
    }

    #[test]
    fn test_dictionary_index_missing_is_undefined() {
        let dict: Dictionary = [("a", true)].into_iter().collect();
        assert_eq!(dict["a"], Value::Bool(true));
        assert_eq!(dict["missing"], Value::Undefined);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_json() -> Result<(), serde_json::Error> {
        let mut nested = Dictionary::new();
        nested.insert("flag", false);
        let mut dict = Dictionary::new();
        dict.insert("startURL", "https://example.com");
        dict.insert("data", vec![1u8, 2, 3]);
        dict.insert("nested", nested);
        dict.insert("list", vec![Value::from(1i32), Value::Undefined]);

        let json = serde_json::to_string(&dict)?;
        assert_eq!(
            json,
            r#"{"startURL":"https://example.com","data":"AQID","nested":{"flag":false},"list":[1,null]}"#
        );
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_numbers_like_json_stringify() -> Result<(), serde_json::Error> {
        let values = vec![
            Value::Number(3.0),
            Value::Number(-0.0),
            Value::Number(1.5),
            Value::Number(1e300),
            Value::Number(f64::NAN),
        ];
        let json = serde_json::to_string(&Value::Array(values))?;
        assert_eq!(json, "[3,0,1.5,1e300,null]");
        Ok(())
    }
}
