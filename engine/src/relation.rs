//! Many-to-many relation descriptors.
//!
//! A [`Relation`] names the records linked to a parent under one key. It
//! never holds the members themselves: membership changes are emitted as
//! [`Operation`]s and membership is read back with [`Relation::query`].

use crate::operation::Operation;
use crate::predicate::related_to;
use crate::query::Query;
use crate::record::{pointers, Pointer, Record};
use crate::{error::Result, ClassName, Error, FieldKey};
use serde::{Deserialize, Serialize, Serializer};

/// Relation between a parent record and records of one target class.
///
/// Encodes as `{"__type":"Relation","className":...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relation {
    parent: Option<Pointer>,
    key: Option<FieldKey>,
    class_name: Option<ClassName>,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "__type", rename = "Relation", rename_all = "camelCase")]
struct RelationWire<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class_name: Option<T>,
}

impl Relation {
    /// Relation to records of `class_name`, with no parent or key yet.
    pub fn new(class_name: impl Into<ClassName>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    /// Declare the key the relation lives under on its parent.
    pub fn with_key(mut self, key: impl Into<FieldKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach the owning record.
    pub fn with_parent(mut self, parent: Option<Pointer>) -> Self {
        self.parent = parent;
        self
    }

    pub fn parent(&self) -> Option<&Pointer> {
        self.parent.as_ref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Declared target class.
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Build the operation linking `objects` under `key`.
    ///
    /// Fails with [`Error::ClassMismatch`] if `key` differs from the declared
    /// key or any record is not of the target class, and with
    /// [`Error::IdentityMissing`] if any record is unsaved.
    pub fn add<'a, R, I>(&self, key: &str, objects: I) -> Result<Operation>
    where
        R: Record + ?Sized + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let (key, objects) = self.resolve(key, objects)?;
        tracing::debug!(key = %key, count = objects.len(), "relation add");
        Operation::new().add_relation(key, &objects)
    }

    /// Build the operation unlinking `objects` under `key`.
    ///
    /// Fails under the same conditions as [`Relation::add`].
    pub fn remove<'a, R, I>(&self, key: &str, objects: I) -> Result<Operation>
    where
        R: Record + ?Sized + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let (key, objects) = self.resolve(key, objects)?;
        tracing::debug!(key = %key, count = objects.len(), "relation remove");
        Operation::new().remove_relation(key, &objects)
    }

    fn resolve<'a, R, I>(&self, key: &str, objects: I) -> Result<(FieldKey, Vec<Pointer>)>
    where
        R: Record + ?Sized + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        if let Some(declared) = self.key.as_deref() {
            if declared != key {
                tracing::warn!(declared, requested = key, "relation key mismatch");
                return Err(Error::ClassMismatch {
                    expected: declared.to_string(),
                    actual: key.to_string(),
                });
            }
        }

        let objects: Vec<&R> = objects.into_iter().collect();
        let target = self
            .class_name
            .as_deref()
            .or_else(|| objects.first().map(|record| record.class_name()));
        if let Some(target) = target {
            if let Some(stray) = objects.iter().find(|r| r.class_name() != target) {
                tracing::warn!(
                    expected = target,
                    actual = stray.class_name(),
                    "relation target mismatch"
                );
                return Err(Error::ClassMismatch {
                    expected: target.to_string(),
                    actual: stray.class_name().to_string(),
                });
            }
        }

        Ok((key.to_string(), pointers(objects)?))
    }

    /// Query for the records currently in this relation.
    ///
    /// Requires a saved parent, a key and a target class.
    pub fn query(&self) -> Result<Query> {
        let (Some(parent), Some(key), Some(class_name)) =
            (&self.parent, self.key.as_deref(), self.class_name.as_deref())
        else {
            return Err(Error::InvalidRelation(
                "relation needs a saved parent, a key and a target class to be queried".into(),
            ));
        };
        Ok(Query::new(class_name).filter(related_to(key, parent)?))
    }
}

impl Serialize for Relation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RelationWire {
            class_name: self.class_name.as_deref(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Relation {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = RelationWire::<ClassName>::deserialize(deserializer)?;
        Ok(Self {
            class_name: wire.class_name,
            ..Self::default()
        })
    }
}
