//! The constraint model and its canonical encoding.
//!
//! A constraint is one field-scoped predicate fragment. Equality and hashing
//! are defined over the serialized value, not over [`QueryValue`] structure,
//! so two constraints are the same exactly when they put the same bytes on
//! the wire.

use crate::value::{Predicate, QueryValue};
use crate::{FieldKey, Operator};
use serde::{Serialize, Serializer};
use std::hash::{Hash, Hasher};

/// One predicate fragment scoped to a key.
#[derive(Debug, Clone)]
pub struct Constraint {
    key: FieldKey,
    value: Option<QueryValue>,
    operator: Option<Operator>,
    is_null: bool,
}

impl Constraint {
    /// A constraint tagged with an operator: `{key: {op: value}}`.
    pub fn new(key: impl Into<FieldKey>, operator: Operator, value: impl Into<QueryValue>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            operator: Some(operator),
            is_null: false,
        }
    }

    /// An operator-less constraint: `{key: value}`.
    pub fn bare(key: impl Into<FieldKey>, value: impl Into<QueryValue>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            operator: None,
            is_null: false,
        }
    }

    /// A null-marker constraint: `{key: null}`.
    pub fn null(key: impl Into<FieldKey>) -> Self {
        Self {
            key: key.into(),
            value: None,
            operator: None,
            is_null: true,
        }
    }

    /// A constraint that carries only an operator and emits nothing.
    pub fn comparator_only(key: impl Into<FieldKey>, operator: Operator) -> Self {
        Self {
            key: key.into(),
            value: None,
            operator: Some(operator),
            is_null: false,
        }
    }

    /// The field (or top-level symbol) this constraint applies to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The held value, if any.
    pub fn value(&self) -> Option<&QueryValue> {
        self.value.as_ref()
    }

    /// The operator tag, if any.
    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    /// Whether this constraint encodes a literal null.
    pub fn is_null_marker(&self) -> bool {
        self.is_null
    }

    /// Whether encoding this constraint produces nothing.
    pub fn is_empty_emission(&self) -> bool {
        !self.is_null && self.value.is_none()
    }

    /// Replace the held value, keeping key and operator.
    pub(crate) fn with_value(mut self, value: QueryValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Encode the held value alone, without operator wrapping.
    ///
    /// A null marker yields JSON `null`; an empty emission yields `None`.
    pub fn encoded_value(&self) -> Option<serde_json::Value> {
        if self.is_null {
            return Some(serde_json::Value::Null);
        }
        self.value.as_ref().map(QueryValue::to_json)
    }

    /// Encode what this constraint places under its key.
    ///
    /// Null markers emit `null`, operator-less constraints emit the value
    /// verbatim and tagged constraints emit `{symbol: value}`.
    pub fn encode(&self) -> Option<serde_json::Value> {
        if self.is_null {
            return Some(serde_json::Value::Null);
        }
        let value = self.value.as_ref()?.to_json();
        Some(match self.operator {
            None => value,
            Some(op) => {
                let mut wrapped = serde_json::Map::new();
                wrapped.insert(op.symbol().to_string(), value);
                serde_json::Value::Object(wrapped)
            }
        })
    }

    /// This constraint alone as a predicate: `{key: encoded}`.
    pub fn to_predicate(&self) -> Predicate {
        let mut predicate = Predicate::new();
        if let Some(encoded) = self.encode() {
            predicate.insert(self.key.clone(), encoded);
        }
        predicate
    }

    /// Canonical bytes of the encoded value, used for equality and hashing.
    fn value_bytes(&self) -> Option<Vec<u8>> {
        self.encoded_value()
            .and_then(|value| serde_json::to_vec(&value).ok())
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.operator == other.operator
            && self.is_null == other.is_null
            && self.value_bytes() == other.value_bytes()
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.operator.hash(state);
        self.is_null.hash(state);
        self.value_bytes().hash(state);
    }
}

impl Serialize for Constraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.encode().serialize(serializer)
    }
}
