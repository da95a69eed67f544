//! FIX session settings.
//!
//! Settings are a flat string-keyed map, loaded from the `[session]` table of
//! a TOML file. The transport engine reads its own keys (`FileStorePath`,
//! `SocketConnectHost`, ...); the gateway reads the identity keys and the
//! session-scoped order fields.

use crate::domain::errors::ConfigError;
use crate::domain::fix::tags::BEGIN_STRING_FIX42;
use crate::domain::ports::SessionId;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const BEGIN_STRING: &str = "BeginString";
pub const SENDER_COMP_ID: &str = "SenderCompID";
pub const TARGET_COMP_ID: &str = "TargetCompID";
pub const DESTINATION: &str = "Destination";
pub const ACCOUNT: &str = "Account";
pub const TARGET_SUB_ID: &str = "TargetSubID";

#[derive(Debug, Deserialize)]
struct SettingsFile {
    session: HashMap<String, toml::Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSettings {
    values: HashMap<String, String>,
}

impl SessionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: SettingsFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;

        let values = file
            .session
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    toml::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();

        Ok(Self { values })
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn get_string(&self, key: &str) -> Result<&str, ConfigError> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: key.to_string(),
            })
    }

    pub fn get_optional(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn session_id(&self) -> Result<SessionId, ConfigError> {
        Ok(SessionId::new(
            self.get_optional(BEGIN_STRING).unwrap_or(BEGIN_STRING_FIX42),
            self.get_string(SENDER_COMP_ID)?,
            self.get_string(TARGET_COMP_ID)?,
        ))
    }

    pub fn session_fields(&self) -> Result<SessionFields, ConfigError> {
        Ok(SessionFields {
            destination: self.get_string(DESTINATION)?.to_string(),
            account: self.get_string(ACCOUNT)?.to_string(),
            target_sub_id: self.get_string(TARGET_SUB_ID)?.to_string(),
        })
    }

    /// Everything the gateway needs must be present before a session starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session_id()?;
        self.session_fields()?;
        Ok(())
    }
}

/// Session-scoped fields stamped on every outbound order message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFields {
    pub destination: String,
    pub account: String,
    pub target_sub_id: String,
}
