//! Connection-related data models.
//!
//! This module defines the configuration record collected by the UI layer,
//! the connection descriptor derived from it, and the connection form fields.

use crate::error::{DialectError, DialectResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

pub const DEFAULT_REDSHIFT_PORT: u16 = 5439;
pub const DEFAULT_TUNNEL_PORT: u16 = 22;

/// Authentication used to open an SSH tunnel.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "kind", content = "secret")]
pub enum TunnelAuth {
    Password(String),
    PrivateKey(String),
}

impl std::fmt::Debug for TunnelAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password(_) => write!(f, "Password(****)"),
            Self::PrivateKey(_) => write!(f, "PrivateKey(****)"),
        }
    }
}

/// SSH tunnel settings. Opening the tunnel is the connection provider's job;
/// this layer only carries the settings through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TunnelConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub auth: TunnelAuth,
}

impl TunnelConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        auth: TunnelAuth,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            auth,
        }
    }
}

/// Configuration for a Redshift connection.
///
/// Immutable once built; the builder-style setters consume `self`.
#[derive(Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    #[serde(rename = "db")]
    pub database: String,
    pub user: String,
    /// Contains sensitive data - never log
    #[serde(skip_serializing, default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<TunnelConfig>,
    /// Raw driver options as typed into the form, e.g. `"a=b&c=d"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_options: Option<String>,
    /// Passthrough driver properties, preserved unchanged.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl ConnectionConfig {
    /// Create a new connection configuration.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            user: user.into(),
            password: password.into(),
            tunnel: None,
            additional_options: None,
            properties: BTreeMap::new(),
        }
    }

    /// Route the connection through an SSH tunnel.
    pub fn with_tunnel(mut self, tunnel: TunnelConfig) -> Self {
        self.tunnel = Some(tunnel);
        self
    }

    /// Set the additional driver options string.
    pub fn with_additional_options(mut self, options: impl Into<String>) -> Self {
        let options = options.into();
        self.additional_options = if options.trim().is_empty() {
            None
        } else {
            Some(options)
        };
        self
    }

    /// Add a passthrough driver property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Build a configuration from a flat connection-details map, as submitted
    /// by the connection form (see `Redshift::connection_fields`).
    ///
    /// `host`, `port`, `db` and `additional-options` are consumed; `user`,
    /// `password` and the `tunnel-*` keys fill their own slots; every other
    /// key is kept as a passthrough property.
    pub fn from_details(details: &serde_json::Map<String, JsonValue>) -> DialectResult<Self> {
        let host = required_string(details, "host")?;
        let database = required_string(details, "db")?;
        let user = required_string(details, "user")?;
        let password = optional_string(details, "password").unwrap_or_default();
        let port = match details.get("port") {
            None | Some(JsonValue::Null) => DEFAULT_REDSHIFT_PORT,
            Some(value) => parse_port("port", value)?,
        };

        let mut config = Self::new(host, port, database, user, password);
        if let Some(options) = optional_string(details, "additional-options") {
            config = config.with_additional_options(options);
        }
        if details
            .get("tunnel-enabled")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
        {
            config = config.with_tunnel(tunnel_from_details(details)?);
        }

        for (key, value) in details {
            if CONSUMED_DETAIL_KEYS.contains(&key.as_str()) || key.starts_with("tunnel-") {
                continue;
            }
            let value = match value {
                JsonValue::Null => continue,
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            config.properties.insert(key.clone(), value);
        }

        config.validate()?;
        Ok(config)
    }

    /// JSON schema of the connection record, for form renderers.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(ConnectionConfig)
    }

    /// Check the non-emptiness assumptions of the connection builder.
    pub fn validate(&self) -> DialectResult<()> {
        if self.host.trim().is_empty() {
            return Err(DialectError::configuration("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(DialectError::configuration("port", "must be greater than 0"));
        }
        if self.database.trim().is_empty() {
            return Err(DialectError::configuration("db", "must not be empty"));
        }
        if self.user.trim().is_empty() {
            return Err(DialectError::configuration("user", "must not be empty"));
        }
        if let Some(tunnel) = &self.tunnel {
            if tunnel.host.trim().is_empty() {
                return Err(DialectError::configuration("tunnel-host", "must not be empty"));
            }
            if tunnel.port == 0 {
                return Err(DialectError::configuration(
                    "tunnel-port",
                    "must be greater than 0",
                ));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"****")
            .field("tunnel", &self.tunnel)
            .field("additional_options", &self.additional_options)
            .field("properties", &self.properties)
            .finish()
    }
}

const CONSUMED_DETAIL_KEYS: &[&str] = &["host", "port", "db", "user", "password", "additional-options"];

fn optional_string(details: &serde_json::Map<String, JsonValue>, key: &str) -> Option<String> {
    match details.get(key) {
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn required_string(
    details: &serde_json::Map<String, JsonValue>,
    key: &str,
) -> DialectResult<String> {
    optional_string(details, key)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| DialectError::configuration(key, "is required"))
}

fn parse_port(key: &str, value: &JsonValue) -> DialectResult<u16> {
    let parsed = match value {
        JsonValue::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        JsonValue::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| DialectError::configuration(key, format!("invalid port: {}", value)))
}

fn tunnel_from_details(details: &serde_json::Map<String, JsonValue>) -> DialectResult<TunnelConfig> {
    let host = required_string(details, "tunnel-host")?;
    let user = required_string(details, "tunnel-user")?;
    let port = match details.get("tunnel-port") {
        None | Some(JsonValue::Null) => DEFAULT_TUNNEL_PORT,
        Some(value) => parse_port("tunnel-port", value)?,
    };
    let auth = match optional_string(details, "tunnel-private-key").filter(|k| !k.is_empty()) {
        Some(key) => TunnelAuth::PrivateKey(key),
        None => TunnelAuth::Password(optional_string(details, "tunnel-pass").unwrap_or_default()),
    };
    Ok(TunnelConfig::new(host, port, user, auth))
}

/// Fully-qualified connection descriptor handed to the connection provider.
///
/// One descriptor is produced per [`ConnectionConfig`]; nothing is cached.
#[derive(Clone, Serialize)]
pub struct ConnectionDescriptor {
    /// Native driver selection identifier.
    pub driver: &'static str,
    pub subprotocol: &'static str,
    /// `//host:port/database`
    pub subname: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Driver properties: computed transport flags plus passthrough options.
    pub properties: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<TunnelConfig>,
}

impl ConnectionDescriptor {
    /// Driver URL without credentials, e.g.
    /// `jdbc:redshift://host:5439/dev?OpenSourceSubProtocolOverride=false&ssl=true`.
    pub fn url(&self) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.properties.iter())
            .finish();
        if query.is_empty() {
            format!("jdbc:{}:{}", self.subprotocol, self.subname)
        } else {
            format!("jdbc:{}:{}?{}", self.subprotocol, self.subname, query)
        }
    }

    /// Whether the descriptor demands encrypted transport.
    pub fn requires_tls(&self) -> bool {
        self.properties.get("ssl").is_some_and(|v| v == "true")
    }

    /// Look up a driver property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("driver", &self.driver)
            .field("subname", &self.subname)
            .field("user", &self.user)
            .field("password", &"****")
            .field("properties", &self.properties)
            .field("tunnel", &self.tunnel)
            .finish()
    }
}

/// Input widget type of a connection form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    String,
    Integer,
    Password,
    Boolean,
    Secret,
}

/// One field the UI must collect to build a [`ConnectionConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectionField {
    pub name: &'static str,
    pub display_name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

impl ConnectionField {
    pub const fn new(
        name: &'static str,
        display_name: &'static str,
        field_type: FieldType,
        required: bool,
    ) -> Self {
        Self {
            name,
            display_name,
            field_type,
            required,
            default: None,
            placeholder: None,
        }
    }

    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn with_placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details(value: JsonValue) -> serde_json::Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_connection_config_debug_masks_password() {
        let config = ConnectionConfig::new("host", 5439, "dev", "admin", "s3cret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("****"));
    }

    #[test]
    fn test_connection_config_serialization_skips_password() {
        let config = ConnectionConfig::new("host", 5439, "dev", "admin", "s3cret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(json.contains("\"db\":\"dev\""));
    }

    #[test]
    fn test_json_schema_uses_form_names() {
        let schema = serde_json::to_value(ConnectionConfig::json_schema()).unwrap();
        assert_eq!(schema["title"], "ConnectionConfig");
        assert!(schema["properties"]["db"].is_object());
        assert!(schema["properties"]["host"].is_object());
        assert!(schema["properties"].get("database").is_none());
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let empty_host = ConnectionConfig::new(" ", 5439, "dev", "admin", "");
        assert!(matches!(
            empty_host.validate(),
            Err(DialectError::Configuration { ref field, .. }) if field == "host"
        ));

        let zero_port = ConnectionConfig::new("h", 0, "dev", "admin", "");
        assert!(matches!(
            zero_port.validate(),
            Err(DialectError::Configuration { ref field, .. }) if field == "port"
        ));

        let empty_db = ConnectionConfig::new("h", 5439, "", "admin", "");
        assert!(empty_db.validate().is_err());

        let ok = ConnectionConfig::new("h", 5439, "dev", "admin", "");
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_from_details_defaults_port() {
        let config = ConnectionConfig::from_details(&details(json!({
            "host": "cluster.example.com",
            "db": "dev",
            "user": "admin",
            "password": "pw"
        })))
        .unwrap();
        assert_eq!(config.port, DEFAULT_REDSHIFT_PORT);
        assert_eq!(config.password, "pw");
        assert!(config.properties.is_empty());
    }

    #[test]
    fn test_from_details_accepts_string_port() {
        let config = ConnectionConfig::from_details(&details(json!({
            "host": "h", "port": "5440", "db": "dev", "user": "u"
        })))
        .unwrap();
        assert_eq!(config.port, 5440);
    }

    #[test]
    fn test_from_details_rejects_bad_port() {
        let result = ConnectionConfig::from_details(&details(json!({
            "host": "h", "port": 70000, "db": "dev", "user": "u"
        })));
        assert!(matches!(result, Err(DialectError::Configuration { .. })));
    }

    #[test]
    fn test_from_details_missing_host() {
        let result = ConnectionConfig::from_details(&details(json!({
            "db": "dev", "user": "u"
        })));
        assert!(matches!(
            result,
            Err(DialectError::Configuration { ref field, .. }) if field == "host"
        ));
    }

    #[test]
    fn test_from_details_keeps_passthrough_fields() {
        let config = ConnectionConfig::from_details(&details(json!({
            "host": "h",
            "db": "dev",
            "user": "u",
            "additional-options": "loginTimeout=10",
            "ApplicationName": "sync",
            "tcpKeepAlive": true,
            "ignored": null
        })))
        .unwrap();
        assert_eq!(config.additional_options.as_deref(), Some("loginTimeout=10"));
        assert_eq!(config.properties.get("ApplicationName").unwrap(), "sync");
        assert_eq!(config.properties.get("tcpKeepAlive").unwrap(), "true");
        assert!(!config.properties.contains_key("ignored"));
        assert!(!config.properties.contains_key("host"));
    }

    #[test]
    fn test_from_details_tunnel() {
        let config = ConnectionConfig::from_details(&details(json!({
            "host": "h",
            "db": "dev",
            "user": "u",
            "tunnel-enabled": true,
            "tunnel-host": "bastion",
            "tunnel-user": "ec2-user",
            "tunnel-private-key": "-----BEGIN KEY-----"
        })))
        .unwrap();
        let tunnel = config.tunnel.unwrap();
        assert_eq!(tunnel.host, "bastion");
        assert_eq!(tunnel.port, DEFAULT_TUNNEL_PORT);
        assert!(matches!(tunnel.auth, TunnelAuth::PrivateKey(_)));
        assert!(config.properties.is_empty());
    }

    #[test]
    fn test_from_details_tunnel_disabled_ignores_tunnel_keys() {
        let config = ConnectionConfig::from_details(&details(json!({
            "host": "h",
            "db": "dev",
            "user": "u",
            "tunnel-enabled": false,
            "tunnel-host": "bastion"
        })))
        .unwrap();
        assert!(config.tunnel.is_none());
        assert!(config.properties.is_empty());
    }

    #[test]
    fn test_tunnel_auth_debug_masks_secret() {
        let auth = TunnelAuth::Password("hunter2".into());
        assert_eq!(format!("{:?}", auth), "Password(****)");
    }

    #[test]
    fn test_blank_additional_options_dropped() {
        let config = ConnectionConfig::new("h", 5439, "dev", "u", "").with_additional_options("  ");
        assert!(config.additional_options.is_none());
    }
}
