use std::{fs, path::PathBuf};

use common::crypto::KeyPair;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::{AuthenticatorConfig, IdentityMode};

pub const APP_NAME: &str = "blindauth";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base url of the community server requests are signed for
    #[serde(default = "default_server_url")]
    pub server_url: Url,
    /// Hex encoded public key of that server
    #[serde(default)]
    pub server_pubkey: Option<String>,
    /// Identity requests are signed with until the server advertises blinding
    #[serde(default)]
    pub identity_mode: IdentityMode,
    /// Forward requests without authentication headers when false
    #[serde(default = "default_sign_requests")]
    pub sign_requests: bool,
    /// Base url of the file server used for version checks
    #[serde(default = "default_file_server_url")]
    pub file_server_url: Url,
    /// Directory for daily rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_server_url() -> Url {
    Url::parse("http://localhost:8080").expect("hardcoded URL must parse")
}

fn default_file_server_url() -> Url {
    Url::parse("http://localhost:8081").expect("hardcoded URL must parse")
}

fn default_sign_requests() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            server_pubkey: None,
            identity_mode: IdentityMode::default(),
            sign_requests: default_sign_requests(),
            file_server_url: default_file_server_url(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Authenticator settings, with `server_pubkey` overriding the configured key
    pub fn authenticator_config(
        &self,
        server_pubkey: Option<&str>,
    ) -> Result<AuthenticatorConfig, StateError> {
        let server_public_key = server_pubkey
            .map(str::to_string)
            .or_else(|| self.server_pubkey.clone())
            .ok_or(StateError::MissingServerKey)?;

        Ok(AuthenticatorConfig {
            server_url: self.server_url.clone(),
            server_public_key,
            sign_requests: self.sign_requests,
            identity_mode: self.identity_mode,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the config directory (~/.blindauth)
    pub config_dir: PathBuf,
    /// Path to the root key PEM file
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the config directory path (custom or default ~/.blindauth)
    pub fn config_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new config directory, generating a root key unless one is given
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
        key: Option<KeyPair>,
    ) -> Result<Self, StateError> {
        let config_dir = Self::config_dir(custom_path)?;

        if config_dir.join(CONFIG_FILE_NAME).exists() || config_dir.join(KEY_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&config_dir)?;

        let key = key.unwrap_or_else(KeyPair::generate);
        let key_path = config_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config = config.unwrap_or_default();
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        tracing::info!(path = %config_dir.display(), "initialized config directory");

        Ok(Self {
            config_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the config directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let config_dir = Self::config_dir(custom_path)?;

        if !config_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = config_dir.join(KEY_FILE_NAME);
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            config_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the root key from the key file
    pub fn load_key(&self) -> Result<KeyPair, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = KeyPair::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("config directory not initialized. Run 'blindauth init' first")]
    NotInitialized,

    #[error("config directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("no server public key configured, pass --server-pubkey")]
    MissingServerKey,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_and_load() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("state");

        let config = AppConfig {
            server_pubkey: Some("c3".repeat(32)),
            identity_mode: IdentityMode::Blinded,
            ..Default::default()
        };
        let state = AppState::init(Some(dir.clone()), Some(config.clone()), None).unwrap();
        let loaded = AppState::load(Some(dir)).unwrap();

        assert_eq!(loaded.config, config);
        assert_eq!(
            state.load_key().unwrap().public_key(),
            loaded.load_key().unwrap().public_key()
        );
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_path_buf();

        AppState::init(Some(dir.clone()), None, None).unwrap();
        assert!(matches!(
            AppState::init(Some(dir), None, None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_missing_directory() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            AppState::load(Some(temp.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("identity_mode = \"blinded\"").unwrap();
        assert_eq!(config.identity_mode, IdentityMode::Blinded);
        assert!(config.sign_requests);
        assert_eq!(config.server_url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_authenticator_config_requires_key() {
        let config = AppConfig::default();
        assert!(matches!(
            config.authenticator_config(None),
            Err(StateError::MissingServerKey)
        ));
        let resolved = config.authenticator_config(Some("ab")).unwrap();
        assert_eq!(resolved.server_public_key, "ab");
    }
}
