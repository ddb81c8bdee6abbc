use std::cmp::Ordering;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DictError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const BASE_DIR_NAME: &str = ".storm_words";
const DATABASE: &str = "storm_words.db";
const SETTINGS_FILE: &str = "settings.json";

const HOME_ENV: &str = "STORMWORDS_HOME";
const APP_KEY_ENV: &str = "STORMWORDS_APP_KEY";
const SECRET_KEY_ENV: &str = "STORMWORDS_SECRET_KEY";

/// The small versioned blob kept next to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: "0".to_string(),
            app_key: None,
            secret_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_key: String,
    pub secret_key: String,
}

/// Everything a run needs to know about its environment, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_dir: PathBuf,
    pub db_path: PathBuf,
    pub settings_path: PathBuf,
    pub version: String,
    pub credentials: Option<Credentials>,
}

impl Config {
    /// Resolves the base directory from `STORMWORDS_HOME` or `~/.storm_words`.
    pub fn load() -> Result<Self> {
        let base_dir = match env::var_os(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .ok_or_else(|| DictError::Config("cannot determine home directory".into()))?
                .join(BASE_DIR_NAME),
        };
        let env_credentials = (env::var(APP_KEY_ENV).ok(), env::var(SECRET_KEY_ENV).ok());
        Self::prepare(&base_dir, env_credentials)
    }

    /// Creates the directory, upgrades the settings blob if needed and builds the config.
    pub fn prepare(
        base_dir: &Path,
        (env_app_key, env_secret_key): (Option<String>, Option<String>),
    ) -> Result<Self> {
        fs::create_dir_all(base_dir)?;
        let settings_path = base_dir.join(SETTINGS_FILE);

        let mut settings = read_settings(&settings_path)?;
        if compare_versions(&settings.version, VERSION) == Ordering::Less {
            migrate(&mut settings);
            write_settings(&settings_path, &settings)?;
        }

        let credentials = match (
            env_app_key.or(settings.app_key),
            env_secret_key.or(settings.secret_key),
        ) {
            (Some(app_key), Some(secret_key)) if !app_key.is_empty() && !secret_key.is_empty() => {
                Some(Credentials {
                    app_key,
                    secret_key,
                })
            }
            _ => None,
        };

        Ok(Config {
            base_dir: base_dir.to_path_buf(),
            db_path: base_dir.join(DATABASE),
            settings_path,
            version: settings.version,
            credentials,
        })
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    if !path.is_file() {
        return Ok(Settings::default());
    }
    let data = fs::read_to_string(path)?;
    match serde_json::from_str(&data) {
        Ok(settings) => Ok(settings),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "unreadable settings, starting over");
            Ok(Settings::default())
        }
    }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}

/// One-time upgrade steps, run whenever the stored version is older than this build.
fn migrate(settings: &mut Settings) {
    tracing::info!(from = %settings.version, to = VERSION, "upgrading settings");
    settings.version = VERSION.to_string();
}

/// Numeric dotted comparison; missing or non-numeric parts count as zero.
fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| part.trim().parse().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parse(a), parse(b));
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NO_ENV: (Option<String>, Option<String>) = (None, None);

    #[test]
    fn fresh_directory_is_bootstrapped() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("home");
        let config = Config::prepare(&base, NO_ENV).unwrap();

        assert!(base.is_dir());
        assert_eq!(config.db_path, base.join(DATABASE));
        assert_eq!(config.version, VERSION);
        assert_eq!(config.credentials, None);

        let stored: Settings =
            serde_json::from_str(&fs::read_to_string(&config.settings_path).unwrap()).unwrap();
        assert_eq!(stored.version, VERSION);
    }

    #[test]
    fn old_version_is_upgraded_and_keys_kept() {
        let dir = tempfile::tempdir().unwrap();
        let old = Settings {
            version: "0.0.3".into(),
            app_key: Some("K".into()),
            secret_key: Some("S".into()),
        };
        write_settings(&dir.path().join(SETTINGS_FILE), &old).unwrap();

        let config = Config::prepare(dir.path(), NO_ENV).unwrap();
        assert_eq!(config.version, VERSION);
        assert_eq!(
            config.credentials,
            Some(Credentials {
                app_key: "K".into(),
                secret_key: "S".into()
            })
        );
        let stored = read_settings(&config.settings_path).unwrap();
        assert_eq!(stored.app_key.as_deref(), Some("K"));
    }

    #[test]
    fn newer_settings_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let newer = Settings {
            version: "99.0.0".into(),
            ..Settings::default()
        };
        write_settings(&dir.path().join(SETTINGS_FILE), &newer).unwrap();

        let config = Config::prepare(dir.path(), NO_ENV).unwrap();
        assert_eq!(config.version, "99.0.0");
    }

    #[test]
    fn env_overrides_settings() {
        let dir = tempfile::tempdir().unwrap();
        let stored = Settings {
            version: VERSION.into(),
            app_key: Some("K".into()),
            secret_key: Some("S".into()),
        };
        write_settings(&dir.path().join(SETTINGS_FILE), &stored).unwrap();

        let config = Config::prepare(dir.path(), (Some("EK".into()), None)).unwrap();
        assert_eq!(config.credentials.unwrap().app_key, "EK");
    }

    #[test]
    fn garbage_settings_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "\u{80}\u{3}}").unwrap();
        let config = Config::prepare(dir.path(), NO_ENV).unwrap();
        assert_eq!(config.version, VERSION);
    }

    #[test]
    fn compares_dotted_versions() {
        assert_eq!(compare_versions("0.0.3", "0.1.1"), Ordering::Less);
        assert_eq!(compare_versions("0.1", "0.1.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.10.0", "1.9.9"), Ordering::Greater);
        assert_eq!(compare_versions("0", "0.0.1"), Ordering::Less);
    }
}
