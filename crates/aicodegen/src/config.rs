//! Credential store at `~/.aicodegen/config.json`, with environment
//! overrides.

use std::path::{Path, PathBuf};
use std::{fmt, fs, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
const MODEL_VAR: &str = "OPENAI_MODEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot locate the home directory")]
    NoHomeDir,
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing OpenAI API key, run \"aicodegen init\" to set it")]
    MissingApiKey,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(rename = "OPENAI_API_KEY", skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
}

/// Settings needed to reach the model backend.
pub struct Settings {
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".aicodegen").join("config.json"))
}

/// Loads settings from `path`, letting `env` override each field.
///
/// A missing file is not an error as long as the key comes from `env`.
pub fn load<E>(path: &Path, env: E) -> Result<Settings, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let file = match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).map_err(|source| {
            ConfigError::Malformed {
                path: path.to_owned(),
                source,
            }
        })?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("no config file at {}", path.display());
            ConfigFile::default()
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_owned(),
                source,
            });
        }
    };

    let api_key = env(API_KEY_VAR)
        .or(file.api_key)
        .filter(|key| !key.trim().is_empty())
        .ok_or(ConfigError::MissingApiKey)?;
    Ok(Settings {
        api_key,
        model: env(MODEL_VAR).or(file.model),
        base_url: env(BASE_URL_VAR).or(file.base_url),
    })
}

/// Stores `api_key` at `path`, keeping the other fields of an existing
/// file.
pub fn save_api_key(path: &Path, api_key: &str) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_owned(),
        source,
    };

    let mut file = match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
            warn!("replacing malformed config file: {err}");
            ConfigFile::default()
        }),
        Err(_) => ConfigFile::default(),
    };
    file.api_key = Some(api_key.to_owned());

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let content = serde_json::to_string_pretty(&file).map_err(|source| {
        ConfigError::Malformed {
            path: path.to_owned(),
            source,
        }
    })?;
    fs::write(path, content).map_err(io_err)
}
