//! Assistant configuration loading.
//!
//! Reads `voice-router.yaml` and resolves environment variables. Every field
//! has a default, so the router runs without a config file; the file only
//! overrides endpoints, keys, and vocabulary.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// File name searched for when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "voice-router.yaml";

/// Environment variable holding an explicit config path.
pub const CONFIG_ENV_VAR: &str = "VOICE_ROUTER_CONFIG";

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Errors from locating or parsing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find voice-router.yaml")]
    NotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },
}

// ─── Public Types ────────────────────────────────────────────────────────────

/// Which host platform the assistant runs on. Decides how alarms are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Alarms go through the clock app via intent URIs.
    Android,
    /// Alarms cannot be set programmatically; the user gets instructions.
    Ios,
    /// Calendar + notification only.
    #[default]
    Desktop,
}

/// Geocoding and routing endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Nominatim-compatible search endpoint. The place name is sent as `q`.
    pub geocode_url: String,
    /// OSRM-compatible route service root (without the profile segment).
    pub route_url: String,
    /// Routing profile: `driving`, `walking`, `cycling`.
    pub profile: String,
    /// Sent on every request; public Nominatim rejects anonymous clients.
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            geocode_url: "https://nominatim.openstreetmap.org/search".into(),
            route_url: "https://router.project-osrm.org/route/v1".into(),
            profile: "driving".into(),
            user_agent: concat!("voice-router/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: 15,
        }
    }
}

/// OpenAI-compatible chat endpoint used for the fallback path.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    /// Optional system prompt sent as the first message of every session.
    #[serde(default)]
    pub system_prompt: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".into(),
            model: "gemma2:9b".into(),
            api_key: None,
            temperature: 1.0,
            top_p: 0.95,
            max_tokens: 8192,
            system_prompt: None,
            timeout_secs: 60,
        }
    }
}

/// Places used when a directions request names no endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectionsConfig {
    pub default_start: String,
    pub default_end: String,
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            default_start: "Hồ Gươm, Hà Nội".into(),
            default_end: "Ngã Tư Sở, Hà Nội".into(),
        }
    }
}

/// Time-phrase vocabulary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Tokens that mark an afternoon/evening time (matched case-insensitively).
    pub pm_markers: Vec<String>,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            pm_markers: vec!["chiều".into(), "tối".into(), "pm".into()],
        }
    }
}

/// Route search history settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of records kept, most recent first.
    pub capacity: usize,
    /// SQLite file. `None` means the platform data directory.
    #[serde(default)]
    pub db_path: Option<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            db_path: None,
        }
    }
}

/// Top-level configuration (mirrors `voice-router.yaml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub platform: Platform,
    pub geo: GeoConfig,
    pub chat: ChatConfig,
    pub directions: DirectionsConfig,
    pub time: TimeConfig,
    pub history: HistoryConfig,
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate the config file.
///
/// Checks `VOICE_ROUTER_CONFIG` first, then walks upward from `start`.
pub fn find_config_path(start: &Path) -> Result<PathBuf, ConfigError> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(expand_tilde(&explicit));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(ConfigError::NotFound)
}

/// Load and parse a config file, interpolating `${VAR}` and
/// `${VAR:-default}` before parsing.
pub fn load_config(path: &Path) -> Result<AssistantConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    parse_config(&raw)
}

/// Parse config text (after env interpolation).
pub fn parse_config(raw: &str) -> Result<AssistantConfig, ConfigError> {
    let interpolated = interpolate_env_vars(raw);
    if interpolated.trim().is_empty() {
        return Ok(AssistantConfig::default());
    }

    serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseFailed {
        reason: e.to_string(),
    })
}

/// Find and load the config, falling back to defaults when no file exists.
///
/// A file that exists but fails to parse is still an error.
pub fn load_or_default(start: &Path) -> Result<AssistantConfig, ConfigError> {
    match find_config_path(start) {
        Ok(path) => {
            tracing::info!(path = %path.display(), "loading config");
            load_config(&path)
        }
        Err(ConfigError::NotFound) => {
            tracing::info!(file = CONFIG_FILE_NAME, "no config file found, using defaults");
            Ok(AssistantConfig::default())
        }
        Err(e) => Err(e),
    }
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// `${VAR}` or `${VAR:-default}`.
static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid regex")
});

/// Replace `${VAR}` and `${VAR:-default}` in a string. An unset variable
/// without a default becomes empty; defaults get `~` expanded.
fn interpolate_env_vars(input: &str) -> String {
    ENV_VAR_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            match (std::env::var(&caps[1]), caps.get(2)) {
                (Ok(value), _) => value,
                (Err(_), Some(default)) => expand_tilde(default.as_str()),
                (Err(_), None) => String::new(),
            }
        })
        .into_owned()
}

/// Expand a leading `~` to the user's home directory.
pub(crate) fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars_with_default() {
        std::env::remove_var("__VR_TEST_MISSING__");
        let result = interpolate_env_vars("${__VR_TEST_MISSING__:-http://fallback}");
        assert_eq!(result, "http://fallback");
    }

    #[test]
    fn test_interpolate_env_vars_with_value() {
        std::env::set_var("__VR_TEST_KEY__", "secret");
        let result = interpolate_env_vars("api_key: ${__VR_TEST_KEY__:-none}");
        assert_eq!(result, "api_key: secret");
        std::env::remove_var("__VR_TEST_KEY__");
    }

    #[test]
    fn test_interpolate_no_vars() {
        let input = "plain text with no variables";
        assert_eq!(interpolate_env_vars(input), input);
    }

    #[test]
    fn test_interpolate_unset_without_default_is_empty() {
        let result = interpolate_env_vars("key=${__VR_TEST_UNSET__};");
        assert_eq!(result, "key=;");
    }

    #[test]
    fn test_interpolate_default_expands_tilde() {
        let result = interpolate_env_vars("${__VR_TEST_DB__:-~/h.db}");
        assert!(!result.starts_with('~'));
        assert!(result.ends_with("/h.db"));
    }

    #[test]
    fn test_expand_tilde() {
        let result = expand_tilde("~/history.db");
        assert!(!result.starts_with('~'));
        assert!(result.ends_with("/history.db"));
    }

    #[test]
    fn test_defaults() {
        let config = AssistantConfig::default();
        assert_eq!(config.platform, Platform::Desktop);
        assert_eq!(config.history.capacity, 10);
        assert_eq!(config.directions.default_start, "Hồ Gươm, Hà Nội");
        assert_eq!(config.directions.default_end, "Ngã Tư Sở, Hà Nội");
        assert_eq!(config.time.pm_markers, vec!["chiều", "tối", "pm"]);
        assert_eq!(config.geo.profile, "driving");
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.history.capacity, 10);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let yaml = r#"
            platform: android
            geo:
              profile: walking
            history:
              capacity: 5
        "#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.platform, Platform::Android);
        assert_eq!(config.geo.profile, "walking");
        assert_eq!(config.geo.route_url, "https://router.project-osrm.org/route/v1");
        assert_eq!(config.history.capacity, 5);
        assert!(config.history.db_path.is_none());
        assert_eq!(config.chat.max_tokens, 8192);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("platform: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "directions:\n  default_start: \"Lăng Bác\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.directions.default_start, "Lăng Bác");
        assert_eq!(config.directions.default_end, "Ngã Tư Sở, Hà Nội");
    }

    #[test]
    fn test_find_config_path_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();

        let found = find_config_path(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
    }
}
