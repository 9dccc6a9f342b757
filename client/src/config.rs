//! Configuration management for the client.

use std::env;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the server, without a trailing slash
    pub server_url: String,
    /// Application identifier sent with every request
    pub application_id: String,
    /// Optional client key
    pub client_key: Option<String>,
    /// Encode equality as `$eq` instead of a bare value
    pub use_equal_operator: bool,
}

impl Config {
    /// Create a configuration with default options.
    pub fn new(server_url: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            server_url: trim_url(server_url.into()),
            application_id: application_id.into(),
            client_key: None,
            use_equal_operator: false,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let server_url = var("DOCKET_SERVER_URL").ok_or(ConfigError::MissingServerUrl)?;

        let application_id =
            var("DOCKET_APPLICATION_ID").ok_or(ConfigError::MissingApplicationId)?;

        let client_key = var("DOCKET_CLIENT_KEY");

        let use_equal_operator = match var("DOCKET_USE_EQUAL_OPERATOR") {
            Some(value) => parse_bool(&value)
                .ok_or(ConfigError::InvalidUseEqualOperator(value))?,
            None => false,
        };

        Ok(Self {
            server_url: trim_url(server_url),
            application_id,
            client_key,
            use_equal_operator,
        })
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("DOCKET_SERVER_URL environment variable is required")]
    MissingServerUrl,

    #[error("DOCKET_APPLICATION_ID environment variable is required")]
    MissingApplicationId,

    #[error("Invalid DOCKET_USE_EQUAL_OPERATOR value: {0}")]
    InvalidUseEqualOperator(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn loads_required_and_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("DOCKET_SERVER_URL", "https://api.example.com/parse/"),
            ("DOCKET_APPLICATION_ID", "app"),
        ]))
        .unwrap();

        assert_eq!(config.server_url, "https://api.example.com/parse");
        assert_eq!(config.application_id, "app");
        assert_eq!(config.client_key, None);
        assert!(!config.use_equal_operator);
    }

    #[test]
    fn loads_optional_values() {
        let config = Config::from_lookup(lookup(&[
            ("DOCKET_SERVER_URL", "http://localhost:1337/parse"),
            ("DOCKET_APPLICATION_ID", "app"),
            ("DOCKET_CLIENT_KEY", "secret"),
            ("DOCKET_USE_EQUAL_OPERATOR", "TRUE"),
        ]))
        .unwrap();

        assert_eq!(config.client_key.as_deref(), Some("secret"));
        assert!(config.use_equal_operator);
    }

    #[test]
    fn missing_required_values() {
        assert_eq!(
            Config::from_lookup(lookup(&[("DOCKET_APPLICATION_ID", "app")])),
            Err(ConfigError::MissingServerUrl)
        );
        assert_eq!(
            Config::from_lookup(lookup(&[
                ("DOCKET_SERVER_URL", "http://localhost"),
                ("DOCKET_APPLICATION_ID", "  "),
            ])),
            Err(ConfigError::MissingApplicationId)
        );
    }

    #[test]
    fn invalid_bool() {
        let result = Config::from_lookup(lookup(&[
            ("DOCKET_SERVER_URL", "http://localhost"),
            ("DOCKET_APPLICATION_ID", "app"),
            ("DOCKET_USE_EQUAL_OPERATOR", "sometimes"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidUseEqualOperator(v)) if v == "sometimes"));
    }
}
