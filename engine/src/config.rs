use serde::Deserialize;
use std::{path::Path, path::PathBuf, time::Duration};

use hwdiag_client::{DEFAULT_DIAGNOSE_URL, DEFAULT_TIMEOUT_SECS, EndpointConfig};
use hwdiag_types::ui::UiOptions;

pub const ENDPOINT_URL_ENV: &str = "HWDIAG_ENDPOINT_URL";
pub const TIMEOUT_SECS_ENV: &str = "HWDIAG_TIMEOUT_SECS";

/// Extra time past the HTTP timeout before the session gives up on a request.
const DEADLINE_GRACE: Duration = Duration::from_secs(5);
/// Larger configured timeouts are clamped to this.
pub const MAX_TIMEOUT_SECS: u64 = 60 * 60;

#[derive(Debug, Default, Deserialize)]
pub struct HwdiagConfig {
    pub endpoint: Option<EndpointSection>,
    pub app: Option<AppSection>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EndpointSection {
    pub url: Option<String>,
    /// Whole-request timeout. Zero is treated as unset; values above
    /// [`MAX_TIMEOUT_SECS`] are clamped.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppSection {
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Freeze the spinner glyph. The network animation keeps running.
    #[serde(default)]
    pub reduced_motion: bool,
}

impl HwdiagConfig {
    /// Load `~/.hwdiag/config.toml`. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        toml::from_str(&content).map_err(|err| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, err);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source: err,
            }
        })
    }

    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Endpoint settings with `HWDIAG_*` environment overrides applied.
    #[must_use]
    pub fn endpoint_config(&self) -> EndpointConfig {
        self.endpoint_config_with(|key| std::env::var(key).ok())
    }

    /// Same as [`endpoint_config`](Self::endpoint_config) with an explicit
    /// environment lookup.
    pub fn endpoint_config_with(&self, env: impl Fn(&str) -> Option<String>) -> EndpointConfig {
        let section = self.endpoint.as_ref();

        let url = env(ENDPOINT_URL_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                section
                    .and_then(|s| s.url.as_deref())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_DIAGNOSE_URL.to_string());

        let timeout_secs = env(TIMEOUT_SECS_ENV)
            .and_then(|v| match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(secs),
                _ => {
                    tracing::warn!(value = %v, "Ignoring invalid {TIMEOUT_SECS_ENV}");
                    None
                }
            })
            .or_else(|| section.and_then(|s| s.timeout_secs).filter(|&s| s > 0))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs > MAX_TIMEOUT_SECS {
            tracing::warn!(timeout_secs, max = MAX_TIMEOUT_SECS, "Clamping endpoint timeout");
        }
        let timeout_secs = timeout_secs.min(MAX_TIMEOUT_SECS);

        EndpointConfig::new(url).with_timeout(Duration::from_secs(timeout_secs))
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.app.as_ref().map_or_else(UiOptions::default, |app| UiOptions {
            ascii_only: app.ascii_only,
            high_contrast: app.high_contrast,
            reduced_motion: app.reduced_motion,
        })
    }
}

/// How long the session waits in `Processing` for a request sent with `endpoint`.
#[must_use]
pub fn session_deadline(endpoint: &EndpointConfig) -> Duration {
    endpoint.timeout().saturating_add(DEADLINE_GRACE)
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".hwdiag").join("config.toml"))
}
