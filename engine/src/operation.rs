//! Field update operations.
//!
//! Changes to a saved record are expressed as a batch of per-field
//! operations rather than a full replacement. The batch encodes to the body
//! of an update request.

use crate::record::{pointers, Pointer, Record};
use crate::value::QueryValue;
use crate::{error::Result, Error, FieldKey};
use serde::Serialize;
use std::collections::BTreeMap;

/// An operation applied by the server to one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "__op")]
pub enum FieldOp {
    /// Remove the field
    Delete,
    /// Atomically add to a number
    Increment { amount: serde_json::Number },
    /// Append to an array
    Add { objects: Vec<QueryValue> },
    /// Append values not already present
    AddUnique { objects: Vec<QueryValue> },
    /// Remove every occurrence of the values
    Remove { objects: Vec<QueryValue> },
    /// Link records into a relation
    AddRelation { objects: Vec<Pointer> },
    /// Unlink records from a relation
    RemoveRelation { objects: Vec<Pointer> },
}

impl FieldOp {
    /// Pointers carried by a relation operation.
    pub fn relation_objects(&self) -> Option<&[Pointer]> {
        match self {
            FieldOp::AddRelation { objects } | FieldOp::RemoveRelation { objects } => {
                Some(objects)
            }
            _ => None,
        }
    }
}

/// What happens to one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldUpdate {
    /// Replace the field value
    Set(QueryValue),
    /// Apply an operation
    Op(FieldOp),
}

/// A batch of field updates for one record.
///
/// A later update on a key replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Operation {
    updates: BTreeMap<FieldKey, FieldUpdate>,
}

impl Operation {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, key: impl Into<FieldKey>, update: FieldUpdate) -> Self {
        self.updates.insert(key.into(), update);
        self
    }

    /// Set a field.
    pub fn set(self, key: impl Into<FieldKey>, value: impl Into<QueryValue>) -> Self {
        self.with(key, FieldUpdate::Set(value.into()))
    }

    /// Remove a field.
    pub fn unset(self, key: impl Into<FieldKey>) -> Self {
        self.with(key, FieldUpdate::Op(FieldOp::Delete))
    }

    /// Add `amount` to a numeric field.
    pub fn increment(self, key: impl Into<FieldKey>, amount: i64) -> Self {
        self.with(
            key,
            FieldUpdate::Op(FieldOp::Increment {
                amount: amount.into(),
            }),
        )
    }

    /// Append values to an array field.
    pub fn add<V, I>(self, key: impl Into<FieldKey>, values: I) -> Self
    where
        V: Into<QueryValue>,
        I: IntoIterator<Item = V>,
    {
        let objects = values.into_iter().map(Into::into).collect();
        self.with(key, FieldUpdate::Op(FieldOp::Add { objects }))
    }

    /// Append values not already in an array field.
    pub fn add_unique<V, I>(self, key: impl Into<FieldKey>, values: I) -> Self
    where
        V: Into<QueryValue>,
        I: IntoIterator<Item = V>,
    {
        let objects = values.into_iter().map(Into::into).collect();
        self.with(key, FieldUpdate::Op(FieldOp::AddUnique { objects }))
    }

    /// Remove values from an array field.
    pub fn remove<V, I>(self, key: impl Into<FieldKey>, values: I) -> Self
    where
        V: Into<QueryValue>,
        I: IntoIterator<Item = V>,
    {
        let objects = values.into_iter().map(Into::into).collect();
        self.with(key, FieldUpdate::Op(FieldOp::Remove { objects }))
    }

    /// Link records into the relation stored under `key`.
    ///
    /// All records must be saved and belong to the same class.
    pub fn add_relation<'a, R, I>(self, key: impl Into<FieldKey>, objects: I) -> Result<Self>
    where
        R: Record + ?Sized + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let objects = same_class_pointers(objects)?;
        Ok(self.with(key, FieldUpdate::Op(FieldOp::AddRelation { objects })))
    }

    /// Unlink records from the relation stored under `key`.
    pub fn remove_relation<'a, R, I>(self, key: impl Into<FieldKey>, objects: I) -> Result<Self>
    where
        R: Record + ?Sized + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let objects = same_class_pointers(objects)?;
        Ok(self.with(key, FieldUpdate::Op(FieldOp::RemoveRelation { objects })))
    }

    /// Fold another batch into this one; its updates win on shared keys.
    pub fn merge(mut self, other: Operation) -> Self {
        self.updates.extend(other.updates);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldUpdate> {
        self.updates.get(key)
    }

    /// Updates in key order.
    pub fn updates(&self) -> impl Iterator<Item = (&FieldKey, &FieldUpdate)> {
        self.updates.iter()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Encode the update body.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn same_class_pointers<'a, R, I>(objects: I) -> Result<Vec<Pointer>>
where
    R: Record + ?Sized + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let resolved = pointers(objects)?;
    if let Some(first) = resolved.first() {
        if let Some(other) = resolved
            .iter()
            .find(|p| p.class_name() != first.class_name())
        {
            return Err(Error::ClassMismatch {
                expected: first.class_name().to_string(),
                actual: other.class_name().to_string(),
            });
        }
    }
    Ok(resolved)
}
