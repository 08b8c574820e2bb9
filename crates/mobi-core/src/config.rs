// Configuration loading and parsing (mobi.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides `credentials.toml`.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api: ApiConfig,
    pub models: ModelsConfig,
    pub coach: CoachConfig,
    pub logging: LoggingConfig,
    pub credentials: CredentialsConfig,
}

impl Default for Config {
    /// The values shipped in `defaults/mobi.toml`, without credentials.
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            },
            models: ModelsConfig {
                lead_reply: "gemini-2.5-flash".into(),
                sentiment: "gemini-2.5-flash".into(),
                suggestions: "gemini-2.5-pro".into(),
                objection: "gemini-2.5-pro".into(),
                coach: "gemini-2.5-pro".into(),
                dream_image: "imagen-4.0-generate-001".into(),
                prompt_enhancement: "gemini-2.5-flash".into(),
                image_edit: "gemini-2.5-flash-image".into(),
            },
            coach: CoachConfig { suggestion_count: 2 },
            logging: LoggingConfig {
                directory: "logs".into(),
            },
            credentials: CredentialsConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// mobi.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire mobi.toml file.
#[derive(Debug, Clone, Deserialize)]
struct MobiFile {
    api: ApiConfig,
    models: ModelsConfig,
    coach: CoachConfig,
    logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

/// Model identifier per call site.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelsConfig {
    pub lead_reply: String,
    pub sentiment: String,
    pub suggestions: String,
    pub objection: String,
    pub coach: String,
    pub dream_image: String,
    pub prompt_enhancement: String,
    pub image_edit: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoachConfig {
    pub suggestion_count: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    pub directory: String,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct CredentialsConfig {
    pub gemini_api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/mobi.toml` and (optionally)
/// `config/credentials.toml`, relative to `base_dir`.
///
/// Does not copy defaults and ignores the environment; see `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- mobi.toml (required) ---
    let mobi_path = config_dir.join("mobi.toml");
    let mobi_text = read_file(&mobi_path)?;
    let mobi_file: MobiFile = toml::from_str(&mobi_text).map_err(|e| ConfigError::ParseError {
        path: mobi_path.clone(),
        source: e,
    })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        api: mobi_file.api,
        models: mobi_file.models,
        coach: mobi_file.coach,
        logging: mobi_file.logging,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Replace the API key with the value from `lookup(API_KEY_ENV)` when it is
/// set and non-empty.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
        config.credentials.gemini_api_key = Some(key);
    }
}

/// Convenience wrapper: loads config relative to the current working directory,
/// copying defaults first and applying the environment override.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    let mut config = load_config_from(&cwd)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: "must not be empty".into(),
        });
    }

    let m = &config.models;
    let model_fields: &[(&str, &str)] = &[
        ("models.lead_reply", &m.lead_reply),
        ("models.sentiment", &m.sentiment),
        ("models.suggestions", &m.suggestions),
        ("models.objection", &m.objection),
        ("models.coach", &m.coach),
        ("models.dream_image", &m.dream_image),
        ("models.prompt_enhancement", &m.prompt_enhancement),
        ("models.image_edit", &m.image_edit),
    ];
    for (name, val) in model_fields {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "model id must not be empty".into(),
            });
        }
    }

    if config.coach.suggestion_count == 0 {
        return Err(ConfigError::ValidationError {
            field: "coach.suggestion_count".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
