//! # Docket Engine
//!
//! Query constraint algebra and relation operation encoder for a Parse-style
//! REST backend.
//!
//! This crate turns typed query conditions into the JSON mapping a server
//! expects under `where`, and builds the update payloads that link or unlink
//! records in a many-to-many relation. Everything is pure: the same inputs
//! always produce the same bytes.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine never talks to the network
//! - **Canonical**: encoded objects have sorted keys and stable bytes
//! - **Fail early**: unsaved records, mismatched relation classes and bad
//!   option values are rejected while building, not when sending
//!
//! ## Core Concepts
//!
//! ### Constraints
//!
//! A [`Constraint`] is one condition on one field: a key, an optional
//! [`Operator`] and a [`QueryValue`]. Constructors live in [`predicate`],
//! [`geo`] and [`query`]. Equality can be encoded either as a bare value
//! or as `{"$eq": value}`; which one is decided by [`QuerySettings`] at the
//! moment the constraint is built.
//!
//! ### Queries
//!
//! A [`Query`] merges constraints into a [`Where`] and carries paging,
//! ordering and projection options. Queries nest into `$or`, `$inQuery` and
//! `$select` constraints.
//!
//! ### Relations
//!
//! A [`Relation`] describes the records linked to a parent under one key.
//! [`Relation::add`] and [`Relation::remove`] validate the records and emit
//! an [`Operation`] with an `AddRelation` or `RemoveRelation` field update.
//!
//! ## Quick Start
//!
//! ```rust
//! use docket_engine::predicate::greater_than;
//! use docket_engine::{Object, Query, QuerySettings, Relation};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! // 1. Build a query
//! let settings = Arc::new(QuerySettings::default());
//! let query = Query::with_settings("GameScore", settings.clone())
//!     .equal_to("playerName", "Sean Plott")
//!     .filter(greater_than("score", 1000))
//!     .limit(10);
//! assert_eq!(
//!     serde_json::Value::Object(query.predicate()),
//!     json!({"playerName": "Sean Plott", "score": {"$gt": 1000}})
//! );
//!
//! // 2. Switch equality encoding; only later constraints are affected
//! settings.set_use_equal_operator(true);
//! let query = Query::with_settings("GameScore", settings).equal_to("cheatMode", false);
//! assert_eq!(
//!     serde_json::Value::Object(query.predicate()),
//!     json!({"cheatMode": {"$eq": false}})
//! );
//!
//! // 3. Link a user into a role's relation
//! let users = Relation::new("_User").with_key("users");
//! let user = Object::with_id("_User", "heel");
//! let op = users.add("users", [&user])?;
//! assert_eq!(
//!     op.to_value(),
//!     json!({"users": {"__op": "AddRelation", "objects": [
//!         {"__type": "Pointer", "className": "_User", "objectId": "heel"}
//!     ]}})
//! );
//! # Ok::<(), docket_engine::Error>(())
//! ```
//!
//! ## Concurrency
//!
//! Every value built by the engine is immutable once constructed and can be
//! shared across threads. [`QuerySettings`] is the only mutable state and is
//! read atomically by each constructor call.

pub mod constraint;
pub mod error;
pub mod geo;
pub mod operation;
pub mod operator;
pub mod predicate;
pub mod query;
pub mod record;
pub mod relation;
pub mod role;
pub mod schema;
pub mod settings;
pub mod value;

// Re-export main types at crate root
pub use constraint::Constraint;
pub use error::Error;
pub use geo::{GeoPoint, Polygon};
pub use operation::{FieldOp, FieldUpdate, Operation};
pub use operator::{Operator, UnknownOperator};
pub use predicate::TextOption;
pub use query::{Order, Query, SubQuery, Where, DEFAULT_LIMIT};
pub use record::{Object, Pointer, Record};
pub use relation::Relation;
pub use role::{Role, ROLE_CLASS, USER_CLASS};
pub use schema::{ClassSchema, FieldType};
pub use settings::QuerySettings;
pub use value::{Predicate, QueryValue};

/// Type aliases for clarity
pub type ClassName = String;
pub type ObjectId = String;
pub type FieldKey = String;
