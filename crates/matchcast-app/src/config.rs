// Configuration loading and validation (config/matchcast.toml).

use matchcast_baseball::weights::Weights;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Name of the single config file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "matchcast.toml";

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
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scoring: ScoringConfig,
    pub eligibility: EligibilityConfig,
    pub windows: WindowsConfig,
    pub provider: ProviderConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    /// Base signal weights; defaults to the calibrated table.
    #[serde(default)]
    pub weights: Weights,
}

/// Which scored hitters make it into the output documents.
#[derive(Debug, Clone, Deserialize)]
pub struct EligibilityConfig {
    pub min_h2h_at_bats: u32,
    pub max_projected_slot: u8,
    /// Extra season-PA floor for the combined hitter list only.
    pub min_season_pa_combined: u32,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            min_h2h_at_bats: 1,
            max_projected_slot: 5,
            min_season_pa_combined: 85,
        }
    }
}

/// Trailing windows, in days, ending the day before the slate.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowsConfig {
    pub lineup_days: u32,
    pub recent_form_days: u32,
    pub pitcher_recent_days: u32,
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            lineup_days: 7,
            recent_form_days: 7,
            pitcher_recent_days: 28,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Matchups (and hitters within a matchup) evaluated at once.
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/matchcast.toml` relative to `base_dir`.
///
/// Does not seed defaults; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;
    Ok(config)
}

fn seed_error(action: &str, path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::DefaultsCopyError {
        message: format!("failed to {action} {}: {e}", path.display()),
    }
}

/// Copy every `defaults/` file missing from `config/`, leaving existing
/// config untouched. `*.example` files stay behind. Returns the new paths.
///
/// A base dir with `config/` but no `defaults/` is accepted as-is.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        return if config_dir.is_dir() {
            Ok(Vec::new())
        } else {
            Err(ConfigError::DefaultsCopyError {
                message: format!("no defaults/ or config/ under {}", base_dir.display()),
            })
        };
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| seed_error("create", &config_dir, e))?;
    let entries =
        std::fs::read_dir(&defaults_dir).map_err(|e| seed_error("read", &defaults_dir, e))?;

    let mut seeded = Vec::new();
    for entry in entries {
        let source = entry.map_err(|e| seed_error("read", &defaults_dir, e))?.path();
        let Some(name) = source.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !source.is_file() || name.ends_with(".example") {
            continue;
        }

        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&source, &target).map_err(|e| seed_error("seed", &target, e))?;
        info!(path = %target.display(), "seeded config from defaults");
        seeded.push(target);
    }

    Ok(seeded)
}

/// Seed missing config files from `defaults/`, then load from `base_dir`.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    config
        .scoring
        .weights
        .validate()
        .map_err(|e| invalid("scoring.weights", e.to_string()))?;

    let slot = config.eligibility.max_projected_slot;
    if !(1..=9).contains(&slot) {
        return Err(invalid(
            "eligibility.max_projected_slot",
            format!("must be between 1 and 9, got {slot}"),
        ));
    }

    let windows: &[(&str, u32)] = &[
        ("windows.lineup_days", config.windows.lineup_days),
        ("windows.recent_form_days", config.windows.recent_form_days),
        ("windows.pitcher_recent_days", config.windows.pitcher_recent_days),
    ];
    for (name, days) in windows {
        if *days == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    if config.provider.base_url.trim().is_empty() {
        return Err(invalid("provider.base_url", "must not be empty"));
    }
    if config.provider.timeout_secs == 0 {
        return Err(invalid("provider.timeout_secs", "must be > 0"));
    }
    if config.provider.max_concurrency == 0 {
        return Err(invalid("provider.max_concurrency", "must be > 0"));
    }
    if config.output.dir.trim().is_empty() {
        return Err(invalid("output.dir", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn defaults_file() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("defaults")
            .join(CONFIG_FILE)
    }

    /// Fresh temp dir with `config/` holding the shipped defaults, with
    /// `edit` applied to the text.
    fn temp_config(name: &str, edit: impl Fn(String) -> String) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        let text = fs::read_to_string(defaults_file()).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), edit(text)).unwrap();
        tmp
    }

    fn expect_field(tmp: &Path, expected: &str) {
        match load_config_from(tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_shipped_defaults() {
        let tmp = temp_config("matchcast_config_defaults", |t| t);
        let config = load_config_from(&tmp).expect("defaults should load");

        assert!((config.scoring.weights.wtb - 0.30).abs() < f64::EPSILON);
        assert!((config.scoring.weights.h2h - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.eligibility.min_h2h_at_bats, 1);
        assert_eq!(config.eligibility.max_projected_slot, 5);
        assert_eq!(config.eligibility.min_season_pa_combined, 85);
        assert_eq!(config.windows.lineup_days, 7);
        assert_eq!(config.windows.pitcher_recent_days, 28);
        assert_eq!(config.provider.base_url, "https://statsapi.mlb.com/api/v1");
        assert_eq!(config.provider.max_concurrency, 8);
        assert_eq!(config.output.dir, "output");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn weights_section_is_optional() {
        let tmp = temp_config("matchcast_config_no_weights", |t| {
            let start = t.find("[scoring.weights]").unwrap();
            let end = t.find("[eligibility]").unwrap();
            format!("{}[scoring]\n\n{}", &t[..start], &t[end..])
        });
        let config = load_config_from(&tmp).expect("should fall back to default weights");
        assert_eq!(config.scoring.weights, Weights::default());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_negative_weight() {
        let tmp = temp_config("matchcast_config_negative_weight", |t| {
            t.replace("wtb      = 0.30", "wtb      = -0.30")
        });
        expect_field(&tmp, "scoring.weights");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_slot_out_of_range() {
        let tmp = temp_config("matchcast_config_bad_slot", |t| {
            t.replace("max_projected_slot = 5", "max_projected_slot = 10")
        });
        expect_field(&tmp, "eligibility.max_projected_slot");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_window() {
        let tmp = temp_config("matchcast_config_zero_window", |t| {
            t.replace("lineup_days = 7", "lineup_days = 0")
        });
        expect_field(&tmp, "windows.lineup_days");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_concurrency() {
        let tmp = temp_config("matchcast_config_zero_concurrency", |t| {
            t.replace("max_concurrency = 8", "max_concurrency = 0")
        });
        expect_field(&tmp, "provider.max_concurrency");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("matchcast_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_config("matchcast_config_invalid", |_| "not [[[ toml".into());
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_skips_examples() {
        let tmp = std::env::temp_dir().join("matchcast_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::copy(defaults_file(), defaults_dir.join(CONFIG_FILE)).unwrap();
        fs::write(defaults_dir.join("local.toml.example"), "# sample\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config").join(CONFIG_FILE).exists());
        assert!(!tmp.join("config/local.toml.example").exists());

        // Second run leaves the existing file alone.
        fs::write(tmp.join("config").join(CONFIG_FILE), "# custom\n").unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        let content = fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("matchcast_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("no defaults/ or config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
