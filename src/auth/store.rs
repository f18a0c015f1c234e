use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::token::AccessToken;

/// Storage abstraction for persisted access tokens.
///
/// The token manager treats the backend as opaque; file, memory, and
/// secret-store backends are interchangeable.
pub trait TokenStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<AccessToken>, AuthError>;
    fn save(&self, key: &str, token: &AccessToken) -> Result<(), AuthError>;
    fn clear(&self, key: &str) -> Result<(), AuthError>;
}

/// Configuration for file-backed token storage.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub base_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_gantry_dir()
    }
}

/// File-backed token storage using one TOML file per key.
///
/// # Example
/// ```no_run
/// use gantry::auth::{AccessToken, FileTokenStorage, TokenStorage};
/// use chrono::{Duration, Utc};
///
/// let storage = FileTokenStorage::new_default();
/// let token = AccessToken {
///     access_token: "access".to_string(),
///     token_type: "Bearer".to_string(),
///     expires_at: Utc::now() + Duration::hours(1),
///     refresh_token: Some("refresh".to_string()),
///     scopes: None,
/// };
/// storage.save("procore", &token)?;
/// # Ok::<(), gantry::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    base_dir: PathBuf,
}

impl FileTokenStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            base_dir: config.base_dir,
        }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_gantry_dir(),
        }
    }

    fn token_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.toml", normalize_key(key)))
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self, key: &str) -> Result<Option<AccessToken>, AuthError> {
        let path = self.token_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: TokenFile = toml::from_str(&raw)?;
        Ok(Some(file.token))
    }

    fn save(&self, key: &str, token: &AccessToken) -> Result<(), AuthError> {
        let path = self.token_path(key);
        Self::ensure_parent(&path)?;
        let file = TokenFile {
            version: 1,
            key: key.to_string(),
            token: token.clone(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), AuthError> {
        let path = self.token_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// In-memory token storage for tests, samples, and short-lived processes.
/// Thread-safe; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    tokens: Mutex<HashMap<String, AccessToken>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self, key: &str) -> Result<Option<AccessToken>, AuthError> {
        Ok(self
            .tokens
            .lock()
            .map_err(|_| AuthError::Io("storage lock poisoned".to_string()))?
            .get(key)
            .cloned())
    }

    fn save(&self, key: &str, token: &AccessToken) -> Result<(), AuthError> {
        self.tokens
            .lock()
            .map_err(|_| AuthError::Io("storage lock poisoned".to_string()))?
            .insert(key.to_string(), token.clone());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), AuthError> {
        self.tokens
            .lock()
            .map_err(|_| AuthError::Io("storage lock poisoned".to_string()))?
            .remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    version: u32,
    key: String,
    token: AccessToken,
    saved_at: DateTime<Utc>,
}

fn default_gantry_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".gantry"))
        .unwrap_or_else(|| PathBuf::from(".gantry"))
}

fn normalize_key(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' || lower == '_' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}
