//! Class schema definition and validation.
//!
//! Schemas describe the declared fields of a class and let relation
//! descriptors and update operations be checked before they are sent.

use crate::operation::{FieldOp, FieldUpdate, Operation};
use crate::record::Record;
use crate::relation::Relation;
use crate::value::QueryValue;
use crate::{error::Result, ClassName, Error, FieldKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field types supported in schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    /// Arbitrary nested JSON
    Object,
    Array,
    GeoPoint,
    Polygon,
    Pointer {
        #[serde(rename = "targetClass")]
        target_class: ClassName,
    },
    Relation {
        #[serde(rename = "targetClass")]
        target_class: ClassName,
    },
}

impl FieldType {
    pub fn pointer(target_class: impl Into<ClassName>) -> Self {
        FieldType::Pointer {
            target_class: target_class.into(),
        }
    }

    pub fn relation(target_class: impl Into<ClassName>) -> Self {
        FieldType::Relation {
            target_class: target_class.into(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "String"),
            FieldType::Number => write!(f, "Number"),
            FieldType::Boolean => write!(f, "Boolean"),
            FieldType::Date => write!(f, "Date"),
            FieldType::Object => write!(f, "Object"),
            FieldType::Array => write!(f, "Array"),
            FieldType::GeoPoint => write!(f, "GeoPoint"),
            FieldType::Polygon => write!(f, "Polygon"),
            FieldType::Pointer { target_class } => write!(f, "Pointer<{target_class}>"),
            FieldType::Relation { target_class } => write!(f, "Relation<{target_class}>"),
        }
    }
}

/// Schema for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSchema {
    /// Class name
    pub class_name: ClassName,
    /// Declared fields by name
    #[serde(default)]
    pub fields: BTreeMap<FieldKey, FieldType>,
}

impl ClassSchema {
    /// Create a schema with no declared fields.
    pub fn new(class_name: impl Into<ClassName>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Declare a field.
    pub fn add_field(&mut self, name: impl Into<FieldKey>, field_type: FieldType) -> &mut Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    /// Builder-style method to declare a field.
    pub fn with_field(mut self, name: impl Into<FieldKey>, field_type: FieldType) -> Self {
        self.add_field(name, field_type);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }

    fn declared(&self, key: &str) -> Result<&FieldType> {
        self.fields.get(key).ok_or_else(|| Error::UnknownField {
            class_name: self.class_name.clone(),
            field: key.to_string(),
        })
    }

    /// The relation declared under `key`, bound to `parent`.
    ///
    /// The parent must belong to this class and the field must be declared
    /// as a relation. An unsaved parent yields a relation that can build
    /// operations but cannot be queried.
    pub fn relation<R: Record + ?Sized>(&self, parent: &R, key: &str) -> Result<Relation> {
        if parent.class_name() != self.class_name {
            return Err(Error::ClassMismatch {
                expected: self.class_name.clone(),
                actual: parent.class_name().to_string(),
            });
        }

        match self.declared(key)? {
            FieldType::Relation { target_class } => Ok(Relation::new(target_class.as_str())
                .with_key(key)
                .with_parent(parent.to_pointer().ok())),
            other => Err(Error::ClassMismatch {
                expected: "Relation".into(),
                actual: other.to_string(),
            }),
        }
    }

    /// Validate an update operation against the declared fields.
    ///
    /// Undeclared fields may be set freely, but relation operations must
    /// target a declared relation. Pointer and relation targets must match
    /// the declared class.
    pub fn validate_operation(&self, op: &Operation) -> Result<()> {
        for (key, update) in op.updates() {
            if let Err(err) = self.validate_update(key, update) {
                tracing::warn!(class = %self.class_name, field = %key, error = %err, "operation rejected");
                return Err(err);
            }
        }
        Ok(())
    }

    fn validate_update(&self, key: &str, update: &FieldUpdate) -> Result<()> {
        let relation_objects = match update {
            FieldUpdate::Op(op) => op.relation_objects(),
            FieldUpdate::Set(_) => None,
        };

        let field_type = match self.fields.get(key) {
            Some(field_type) => field_type,
            None if relation_objects.is_some() => return self.declared(key).map(|_| ()),
            None => return Ok(()),
        };

        match (field_type, update) {
            (_, FieldUpdate::Op(FieldOp::Delete)) => Ok(()),
            (FieldType::Relation { target_class }, _) => match relation_objects {
                Some(objects) => check_target(target_class, objects.iter().map(|p| p.class_name())),
                None => Err(Error::Validation(format!(
                    "field '{key}' is a relation and only accepts relation operations"
                ))),
            },
            (other, _) if relation_objects.is_some() => Err(Error::ClassMismatch {
                expected: other.to_string(),
                actual: "Relation".into(),
            }),
            (FieldType::Pointer { target_class }, FieldUpdate::Set(value)) => match value {
                QueryValue::Null => Ok(()),
                QueryValue::Pointer(pointer) => {
                    check_target(target_class, std::iter::once(pointer.class_name()))
                }
                _ => Err(Error::Validation(format!(
                    "field '{key}' expects a pointer to {target_class}"
                ))),
            },
            _ => Ok(()),
        }
    }
}

fn check_target<'a>(target: &str, classes: impl Iterator<Item = &'a str>) -> Result<()> {
    for class_name in classes {
        if class_name != target {
            return Err(Error::ClassMismatch {
                expected: target.to_string(),
                actual: class_name.to_string(),
            });
        }
    }
    Ok(())
}
