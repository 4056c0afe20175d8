use std::path::PathBuf;

use rehearse_core::Credential;
use rehearse_core::client::{DEFAULT_AGENT_URL, DEFAULT_STORE_URL};
use rehearse_core::session::DEFAULT_OPENING_ACTION;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Default host for `rehearse serve`
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default port for `rehearse serve`
pub const DEFAULT_PORT: u16 = 8000;

const REDACTED: &str = "[REDACTED]";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRehearseConfig {
    #[serde(default)]
    pub agent: RawAgentConfig,

    #[serde(default)]
    pub store: RawStoreConfig,

    #[serde(default)]
    pub auth: RawAuthConfig,

    #[serde(default)]
    pub server: RawServerConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAgentConfig {
    pub base_url: Option<String>,
    pub lazy_init: Option<bool>,
    pub skip_tts: Option<bool>,
    pub opening_action: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStoreConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAuthConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub jwt_secret: Option<String>,
    pub token_leeway_seconds: Option<u64>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RehearseConfig {
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub server: ServeConfig,
}

impl RehearseConfig {
    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.auth.token.is_some() {
            copy.auth.token = Some(REDACTED.to_string());
        }
        if copy.server.jwt_secret.is_some() {
            copy.server.jwt_secret = Some(REDACTED.to_string());
        }
        copy
    }
}

/// Agent service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub base_url: String,

    /// Let the agent defer scene generation until the first turn
    pub lazy_init: bool,

    pub skip_tts: bool,

    /// First action sent when a session starts
    pub opening_action: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AGENT_URL.to_string(),
            lazy_init: true,
            skip_tts: true,
            opening_action: DEFAULT_OPENING_ACTION.to_string(),
        }
    }
}

/// Case and history store connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STORE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Bearer token for the history store; sessions are not saved without one
    pub token: Option<String>,
}

impl AuthConfig {
    pub fn credential(&self) -> Option<Credential> {
        self.token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(Credential::new)
    }
}

/// Settings for `rehearse serve`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,

    /// Database file; history is kept in memory when unset
    pub database: Option<PathBuf>,

    /// Secret shared with the account service for HS256 tokens
    pub jwt_secret: Option<String>,

    pub token_leeway_seconds: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: None,
            jwt_secret: None,
            token_leeway_seconds: 0,
        }
    }
}

impl ServeConfig {
    pub fn jwt_secret(&self) -> Option<SecretString> {
        self.jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| SecretString::from(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_values() {
        let config = RehearseConfig::default();
        assert_eq!(config.agent.base_url, "http://localhost:9000");
        assert!(config.agent.lazy_init);
        assert!(config.agent.skip_tts);
        assert_eq!(config.agent.opening_action, "Begin the mission.");
        assert_eq!(config.store.base_url, "http://localhost:8000");
        assert!(config.auth.token.is_none());
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(config.server.database.is_none());
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let raw: RawRehearseConfig = toml::from_str(
            r#"
[agent]
base_url = "http://agent.internal:9000"

[server]
port = 9100
"#,
        )
        .unwrap();

        assert_eq!(
            raw.agent.base_url.as_deref(),
            Some("http://agent.internal:9000")
        );
        assert!(raw.agent.lazy_init.is_none());
        assert_eq!(raw.server.port, Some(9100));
        assert!(raw.store.base_url.is_none());
        assert!(raw.auth.token.is_none());
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = RehearseConfig::default();
        config.auth.token = Some("eyJhbGciOi".to_string());
        config.server.jwt_secret = Some("shh".to_string());

        let shown = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!shown.contains("eyJhbGciOi"));
        assert!(!shown.contains("shh"));
        assert!(shown.contains(REDACTED));
    }

    #[test]
    fn test_blank_token_is_no_credential() {
        let auth = AuthConfig {
            token: Some("  ".to_string()),
        };
        assert!(auth.credential().is_none());

        let auth = AuthConfig {
            token: Some("abc".to_string()),
        };
        assert_eq!(auth.credential().unwrap().expose_secret(), "abc");
    }

    #[test]
    fn test_jwt_secret_ignores_blank() {
        let mut server = ServeConfig::default();
        assert!(server.jwt_secret().is_none());
        server.jwt_secret = Some("".to_string());
        assert!(server.jwt_secret().is_none());
        server.jwt_secret = Some("s3cret".to_string());
        assert_eq!(server.jwt_secret().unwrap().expose_secret(), "s3cret");
    }
}
