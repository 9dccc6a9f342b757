//! Transport-ready request descriptors.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const HEADER_APPLICATION_ID: &str = "X-Parse-Application-Id";
pub const HEADER_CLIENT_KEY: &str = "X-Parse-Client-Key";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Queries, sent with `"_method": "GET"` in the body
    Post,
    /// Updates to a saved record
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
        }
    }
}

/// A request ready to hand to an HTTP transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub method: Method,
    /// Path relative to the server URL, starting with `/`
    pub path: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Request {
    /// Absolute URL against `server_url`.
    pub fn url(&self, server_url: &str) -> String {
        format!("{}{}", server_url.trim_end_matches('/'), self.path)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// REST endpoint for a class.
///
/// Built-in classes have dedicated endpoints; everything else lives under
/// `/classes/<name>`.
pub fn endpoint(class_name: &str) -> String {
    match class_name {
        "_User" => "/users".to_string(),
        "_Role" => "/roles".to_string(),
        "_Session" => "/sessions".to_string(),
        "_Installation" => "/installations".to_string(),
        other => format!("/classes/{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_endpoints() {
        assert_eq!(endpoint("_User"), "/users");
        assert_eq!(endpoint("_Role"), "/roles");
        assert_eq!(endpoint("_Session"), "/sessions");
        assert_eq!(endpoint("_Installation"), "/installations");
        assert_eq!(endpoint("GameScore"), "/classes/GameScore");
    }

    #[test]
    fn method_display() {
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(serde_json::to_string(&Method::Put).unwrap(), "\"PUT\"");
    }

    #[test]
    fn url_joins_path() {
        let request = Request {
            method: Method::Post,
            path: "/classes/GameScore".into(),
            headers: BTreeMap::new(),
            body: None,
        };
        assert_eq!(
            request.url("https://api.example.com/parse/"),
            "https://api.example.com/parse/classes/GameScore"
        );
    }
}
