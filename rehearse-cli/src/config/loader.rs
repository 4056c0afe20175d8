use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rehearse_core::auth::TOKEN_ENV_VAR;

use super::types::{
    AgentConfig, AuthConfig, RawAgentConfig, RawAuthConfig, RawRehearseConfig, RawServerConfig,
    RawStoreConfig, RehearseConfig, ServeConfig, StoreConfig,
};

/// Overrides `[agent] base_url`
pub const AGENT_URL_ENV_VAR: &str = "REHEARSE_AGENT_URL";
/// Overrides `[store] base_url`
pub const STORE_URL_ENV_VAR: &str = "REHEARSE_STORE_URL";
/// Overrides `[server] jwt_secret`
pub const JWT_SECRET_ENV_VAR: &str = "REHEARSE_JWT_SECRET";
/// Relocates the project config directory
pub const PROJECT_CONFIG_DIR_ENV_VAR: &str = "REHEARSE_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user, project, then environment)
    pub fn load() -> Result<RehearseConfig> {
        let mut raw = RawRehearseConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        // Layer 3: Environment
        raw = Self::apply_env(raw, |key| std::env::var(key).ok());

        Ok(Self::finalize(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "rehearse").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with REHEARSE_PROJECT_CONFIG_DIR
    pub fn project_config_path() -> PathBuf {
        match std::env::var(PROJECT_CONFIG_DIR_ENV_VAR) {
            Ok(dir) => PathBuf::from(dir).join("config.toml"),
            Err(_) => PathBuf::from(".rehearse/config.toml"),
        }
    }

    fn read_raw(path: &Path) -> Result<RawRehearseConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawRehearseConfig, overlay: RawRehearseConfig) -> RawRehearseConfig {
        RawRehearseConfig {
            agent: RawAgentConfig {
                base_url: overlay.agent.base_url.or(base.agent.base_url),
                lazy_init: overlay.agent.lazy_init.or(base.agent.lazy_init),
                skip_tts: overlay.agent.skip_tts.or(base.agent.skip_tts),
                opening_action: overlay.agent.opening_action.or(base.agent.opening_action),
            },
            store: RawStoreConfig {
                base_url: overlay.store.base_url.or(base.store.base_url),
            },
            auth: RawAuthConfig {
                token: overlay.auth.token.or(base.auth.token),
            },
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
                database: overlay.server.database.or(base.server.database),
                jwt_secret: overlay.server.jwt_secret.or(base.server.jwt_secret),
                token_leeway_seconds: overlay
                    .server
                    .token_leeway_seconds
                    .or(base.server.token_leeway_seconds),
            },
        }
    }

    /// Apply environment overrides; blank values are ignored
    fn apply_env(
        mut raw: RawRehearseConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> RawRehearseConfig {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = var(TOKEN_ENV_VAR) {
            raw.auth.token = Some(token);
        }
        if let Some(url) = var(AGENT_URL_ENV_VAR) {
            raw.agent.base_url = Some(url);
        }
        if let Some(url) = var(STORE_URL_ENV_VAR) {
            raw.store.base_url = Some(url);
        }
        if let Some(secret) = var(JWT_SECRET_ENV_VAR) {
            raw.server.jwt_secret = Some(secret);
        }
        raw
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawRehearseConfig) -> RehearseConfig {
        let agent = AgentConfig::default();
        let store = StoreConfig::default();
        let server = ServeConfig::default();

        RehearseConfig {
            agent: AgentConfig {
                base_url: raw.agent.base_url.unwrap_or(agent.base_url),
                lazy_init: raw.agent.lazy_init.unwrap_or(agent.lazy_init),
                skip_tts: raw.agent.skip_tts.unwrap_or(agent.skip_tts),
                opening_action: raw.agent.opening_action.unwrap_or(agent.opening_action),
            },
            store: StoreConfig {
                base_url: raw.store.base_url.unwrap_or(store.base_url),
            },
            auth: AuthConfig {
                token: raw.auth.token,
            },
            server: ServeConfig {
                host: raw.server.host.unwrap_or(server.host),
                port: raw.server.port.unwrap_or(server.port),
                database: raw.server.database,
                jwt_secret: raw.server.jwt_secret,
                token_leeway_seconds: raw
                    .server
                    .token_leeway_seconds
                    .unwrap_or(server.token_leeway_seconds),
            },
        }
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<RehearseConfig> {
        if path.exists() {
            Ok(Self::finalize(Self::read_raw(path)?))
        } else {
            Ok(RehearseConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn raw(toml_str: &str) -> RawRehearseConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_path(&temp_dir.path().join("missing.toml")).unwrap();

        assert_eq!(config.store.base_url, "http://localhost:8000");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_from_valid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[agent]
lazy_init = false
opening_action = "Start the handover."

[server]
database = "/var/lib/rehearse/store.db"
token_leeway_seconds = 30
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert!(!config.agent.lazy_init);
        assert!(config.agent.skip_tts);
        assert_eq!(config.agent.opening_action, "Start the handover.");
        assert_eq!(
            config.server.database,
            Some(PathBuf::from("/var/lib/rehearse/store.db"))
        );
        assert_eq!(config.server.token_leeway_seconds, 30);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invalid.toml");
        std::fs::write(&path, "this is not valid toml {{").unwrap();

        let err = ConfigLoader::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_merge_raw_overlay_overrides_base() {
        let base = raw(
            r#"
[agent]
base_url = "http://base:9000"
skip_tts = false

[store]
base_url = "http://base:8000"
"#,
        );
        let overlay = raw(
            r#"
[agent]
base_url = "http://project:9000"

[server]
port = 9200
"#,
        );

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(
            merged.agent.base_url.as_deref(),
            Some("http://project:9000")
        );
        // overlay's None falls through to base value via .or()
        assert_eq!(merged.agent.skip_tts, Some(false));
        assert_eq!(merged.store.base_url.as_deref(), Some("http://base:8000"));
        assert_eq!(merged.server.port, Some(9200));
    }

    #[test]
    fn test_env_overrides_files() {
        let file = raw(
            r#"
[auth]
token = "from-file"

[store]
base_url = "http://file:8000"
"#,
        );
        let env: HashMap<&str, &str> = HashMap::from([
            ("REHEARSE_TOKEN", "from-env"),
            ("REHEARSE_AGENT_URL", "http://env:9000"),
            ("REHEARSE_JWT_SECRET", "env-secret"),
        ]);

        let merged = ConfigLoader::apply_env(file, |key| env.get(key).map(|v| v.to_string()));
        let config = ConfigLoader::finalize(merged);

        assert_eq!(config.auth.token.as_deref(), Some("from-env"));
        assert_eq!(config.agent.base_url, "http://env:9000");
        assert_eq!(config.store.base_url, "http://file:8000");
        assert_eq!(config.server.jwt_secret.as_deref(), Some("env-secret"));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let file = raw("[auth]\ntoken = \"from-file\"\n");
        let blank = |key: &str| (key == "REHEARSE_TOKEN").then(|| "   ".to_string());
        let merged = ConfigLoader::apply_env(file, blank);
        assert_eq!(merged.auth.token.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_user_config_path_returns_some() {
        let path = ConfigLoader::user_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("rehearse"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
