//! The value space a constraint can carry.
//!
//! Values are a closed tagged union rather than arbitrary JSON so that the
//! special encodings the service expects (dates, pointers, geo types) are
//! applied wherever the value appears, including inside lists and maps.

use crate::geo::{GeoPoint, Polygon};
use crate::query::SubQuery;
use crate::record::Pointer;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// An accumulated query predicate, as it appears under `where`.
pub type Predicate = serde_json::Map<String, serde_json::Value>;

/// A value held by a constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Literal JSON `null` (distinct from a null-marker constraint)
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// Always encoded as `{"__type":"Date","iso":...}`
    Date(DateTime<Utc>),
    Pointer(Pointer),
    GeoPoint(GeoPoint),
    Polygon(Polygon),
    List(Vec<QueryValue>),
    Map(BTreeMap<String, QueryValue>),
    /// The merged predicate of a nested query
    Predicate(Predicate),
    /// A nested query's class and predicate
    SubQuery(SubQuery),
}

impl QueryValue {
    /// Build a mapping value from `(key, value)` pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<QueryValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        QueryValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list value.
    pub fn list<V, I>(values: I) -> Self
    where
        V: Into<QueryValue>,
        I: IntoIterator<Item = V>,
    {
        QueryValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Encode to a JSON value in the wire format.
    pub fn to_json(&self) -> serde_json::Value {
        // Every variant serializes without fallible steps.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Wire form of a date.
#[derive(Serialize)]
#[serde(tag = "__type", rename = "Date")]
struct DateEnvelope {
    iso: String,
}

impl DateEnvelope {
    fn new(date: &DateTime<Utc>) -> Self {
        Self {
            iso: date.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl Serialize for QueryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QueryValue::Null => serializer.serialize_unit(),
            QueryValue::Bool(b) => serializer.serialize_bool(*b),
            QueryValue::Number(n) => n.serialize(serializer),
            QueryValue::String(s) => serializer.serialize_str(s),
            QueryValue::Date(date) => DateEnvelope::new(date).serialize(serializer),
            QueryValue::Pointer(p) => p.serialize(serializer),
            QueryValue::GeoPoint(p) => p.serialize(serializer),
            QueryValue::Polygon(p) => p.serialize(serializer),
            QueryValue::List(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            QueryValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            QueryValue::Predicate(predicate) => predicate.serialize(serializer),
            QueryValue::SubQuery(query) => query.serialize(serializer),
        }
    }
}

impl From<serde_json::Value> for QueryValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => QueryValue::Null,
            serde_json::Value::Bool(b) => QueryValue::Bool(b),
            serde_json::Value::Number(n) => QueryValue::Number(n),
            serde_json::Value::String(s) => QueryValue::String(s),
            serde_json::Value::Array(values) => {
                QueryValue::List(values.into_iter().map(QueryValue::from).collect())
            }
            serde_json::Value::Object(entries) => QueryValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, QueryValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    QueryValue::Number(value.into())
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(QueryValue::Number)
            .unwrap_or(QueryValue::Null)
    }
}

impl From<f32> for QueryValue {
    fn from(value: f32) -> Self {
        QueryValue::from(f64::from(value))
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::String(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::String(value)
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(value: DateTime<Utc>) -> Self {
        QueryValue::Date(value)
    }
}

impl From<Pointer> for QueryValue {
    fn from(value: Pointer) -> Self {
        QueryValue::Pointer(value)
    }
}

impl From<GeoPoint> for QueryValue {
    fn from(value: GeoPoint) -> Self {
        QueryValue::GeoPoint(value)
    }
}

impl From<Polygon> for QueryValue {
    fn from(value: Polygon) -> Self {
        QueryValue::Polygon(value)
    }
}

impl From<SubQuery> for QueryValue {
    fn from(value: SubQuery) -> Self {
        QueryValue::SubQuery(value)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::list(values)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Null, Into::into)
    }
}
