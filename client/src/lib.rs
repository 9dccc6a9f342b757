//! # Docket Client
//!
//! Turns engine queries and update operations into request descriptors for a
//! Parse-style REST server. No IO happens here: the resulting [`Request`] is
//! handed to whatever HTTP transport the application uses.
//!
//! ```rust
//! use docket_client::{Client, Config, Method};
//! use docket_engine::predicate::greater_than;
//!
//! let client = Client::new(Config::new("https://api.example.com/parse", "app"));
//! let query = client.query("GameScore").filter(greater_than("score", 1000));
//!
//! let request = client.find(&query)?;
//! assert_eq!(request.method, Method::Post);
//! assert_eq!(request.path, "/classes/GameScore");
//! # Ok::<(), docket_client::ClientError>(())
//! ```

pub mod config;
pub mod error;
pub mod request;

pub use config::{Config, ConfigError};
pub use error::{ClientError, Result};
pub use request::{endpoint, Method, Request};

use docket_engine::{ClassSchema, Error, Operation, Query, QuerySettings, Record};
use request::{HEADER_APPLICATION_ID, HEADER_CLIENT_KEY, HEADER_CONTENT_TYPE};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds requests for one server.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<Config>,
    settings: Arc<QuerySettings>,
}

impl Client {
    pub fn new(config: Config) -> Self {
        let settings = Arc::new(QuerySettings::new(config.use_equal_operator));
        Self {
            config: Arc::new(config),
            settings,
        }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Settings shared by every query this client creates.
    ///
    /// Changes take effect for constraints built afterwards.
    pub fn settings(&self) -> &Arc<QuerySettings> {
        &self.settings
    }

    /// Start a query on `class_name` using the client's settings.
    pub fn query(&self, class_name: impl Into<String>) -> Query {
        Query::with_settings(class_name, self.settings.clone())
    }

    /// Request for every record matching the query.
    pub fn find(&self, query: &Query) -> Result<Request> {
        self.query_request(query)
    }

    /// Request for the first matching record.
    pub fn first(&self, query: &Query) -> Result<Request> {
        self.query_request(&query.clone().limit(1))
    }

    /// Request for the number of matching records.
    pub fn count(&self, query: &Query) -> Result<Request> {
        self.query_request(&query.clone().limit(0).count(true))
    }

    fn query_request(&self, query: &Query) -> Result<Request> {
        let mut body = serde_json::to_value(query)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("_method".into(), "GET".into());
        }
        let path = endpoint(query.class_name());
        tracing::debug!(class = query.class_name(), path = %path, "built query request");
        Ok(self.request(Method::Post, path, Some(body)))
    }

    /// Request applying `operation` to a saved record.
    pub fn update<R: Record + ?Sized>(&self, record: &R, operation: &Operation) -> Result<Request> {
        let pointer = record.to_pointer()?;
        let path = format!("{}/{}", endpoint(pointer.class_name()), pointer.object_id());
        let body = serde_json::to_value(operation)?;
        tracing::debug!(path = %path, fields = operation.len(), "built update request");
        Ok(self.request(Method::Put, path, Some(body)))
    }

    /// Like [`Client::update`], validating the operation against `schema` first.
    pub fn update_checked<R: Record + ?Sized>(
        &self,
        record: &R,
        operation: &Operation,
        schema: &ClassSchema,
    ) -> Result<Request> {
        if record.class_name() != schema.class_name {
            return Err(Error::ClassMismatch {
                expected: schema.class_name.clone(),
                actual: record.class_name().to_string(),
            }
            .into());
        }
        schema.validate_operation(operation)?;
        self.update(record, operation)
    }

    fn request(&self, method: Method, path: String, body: Option<serde_json::Value>) -> Request {
        let mut headers = BTreeMap::new();
        headers.insert(
            HEADER_APPLICATION_ID.to_string(),
            self.config.application_id.clone(),
        );
        if let Some(key) = &self.config.client_key {
            headers.insert(HEADER_CLIENT_KEY.to_string(), key.clone());
        }
        headers.insert(
            HEADER_CONTENT_TYPE.to_string(),
            "application/json".to_string(),
        );

        Request {
            method,
            path,
            headers,
            body,
        }
    }

    /// Absolute URL of a request built by this client.
    pub fn url(&self, request: &Request) -> String {
        request.url(&self.config.server_url)
    }
}
