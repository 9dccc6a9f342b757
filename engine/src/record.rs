//! Typed records and the pointers that reference them.

use crate::{error::Result, ClassName, Error, ObjectId};
use serde::{Deserialize, Serialize};

/// A record stored in a class on the remote service.
///
/// Anything that can be turned into a [`Pointer`] implements this trait. The
/// trait is object safe so heterogeneous records can be passed together as
/// `&dyn Record`.
pub trait Record {
    /// Name of the class the record belongs to.
    fn class_name(&self) -> &str;

    /// Server-assigned identity, if the record has been saved.
    fn object_id(&self) -> Option<&str>;

    /// Record-specific checks run before a pointer is produced.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Resolve this record to an immutable pointer.
    ///
    /// Fails with [`Error::IdentityMissing`] when the record has no
    /// non-empty `objectId`. Errors from [`Record::validate`] propagate
    /// unchanged.
    fn to_pointer(&self) -> Result<Pointer> {
        self.validate()?;
        match self.object_id() {
            Some(id) if !id.is_empty() => Ok(Pointer::new(self.class_name(), id)),
            _ => Err(Error::IdentityMissing {
                class_name: self.class_name().to_string(),
            }),
        }
    }
}

/// Resolve every record to a pointer, stopping at the first failure.
pub fn pointers<'a, R, I>(records: I) -> Result<Vec<Pointer>>
where
    R: Record + ?Sized + 'a,
    I: IntoIterator<Item = &'a R>,
{
    records.into_iter().map(Record::to_pointer).collect()
}

/// Lightweight reference to a saved record.
///
/// Encodes as `{"__type":"Pointer","className":...,"objectId":...}`. Only
/// built from a record through [`Record::to_pointer`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "__type", rename = "Pointer", rename_all = "camelCase")]
pub struct Pointer {
    class_name: ClassName,
    object_id: ObjectId,
}

impl Pointer {
    pub(crate) fn new(class_name: impl Into<ClassName>, object_id: impl Into<ObjectId>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: object_id.into(),
        }
    }

    /// Class of the referenced record.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Identity of the referenced record.
    pub fn object_id(&self) -> &str {
        &self.object_id
    }
}

impl Record for Pointer {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn object_id(&self) -> Option<&str> {
        Some(&self.object_id)
    }
}

/// A schemaless record: class name, optional identity and JSON fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    /// Class this record belongs to
    #[serde(skip)]
    pub class_name: ClassName,
    /// Identity assigned by the server once saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    /// Remaining fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Object {
    /// Create an unsaved record of the given class.
    pub fn new(class_name: impl Into<ClassName>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: None,
            fields: serde_json::Map::new(),
        }
    }

    /// Create a record that already has an identity.
    pub fn with_id(class_name: impl Into<ClassName>, object_id: impl Into<ObjectId>) -> Self {
        Self {
            object_id: Some(object_id.into()),
            ..Self::new(class_name)
        }
    }

    /// Set a field value.
    pub fn set(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Read a field value.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// Whether the record has been assigned an identity.
    pub fn is_saved(&self) -> bool {
        self.object_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

impl Record for Object {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }
}
