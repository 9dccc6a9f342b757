//! Access-control roles.

use crate::record::Record;
use crate::relation::Relation;
use crate::{error::Result, Error, ObjectId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Class holding roles.
pub const ROLE_CLASS: &str = "_Role";

/// Class holding users.
pub const USER_CLASS: &str = "_User";

static ROLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-zA-Z\-_ ]+$").expect("role name pattern is valid"));

/// A named group of users and child roles.
///
/// Names may contain only alphanumerics, dashes, underscores and spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    object_id: Option<ObjectId>,
}

impl Role {
    /// Create an unsaved role.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            object_id: None,
        })
    }

    /// Attach the server-assigned identity.
    pub fn with_id(mut self, object_id: impl Into<ObjectId>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Users granted this role.
    pub fn users(&self) -> Relation {
        self.relation("users", USER_CLASS)
    }

    /// Roles that inherit this role's permissions.
    pub fn roles(&self) -> Relation {
        self.relation("roles", ROLE_CLASS)
    }

    fn relation(&self, key: &str, class_name: &str) -> Relation {
        Relation::new(class_name)
            .with_key(key)
            .with_parent(self.to_pointer().ok())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if ROLE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "role name {name:?} may contain only alphanumerics, dashes, underscores and spaces"
        )))
    }
}

impl Record for Role {
    fn class_name(&self) -> &str {
        ROLE_CLASS
    }

    fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.name)
    }
}
