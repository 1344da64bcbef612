//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ClipcamError, ClipcamResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Camera spring dynamics and framing.
    pub camera: CameraDynamicsConfig,

    /// Export-path cursor smoothing parameters.
    pub smoothing: SmoothingConfig,

    /// Cursor velocity / stop detection parameters.
    pub velocity: VelocityConfig,

    /// User-facing overrides for zoom-block detection.
    pub zoom_detection: ZoomDetectionSettings,

    /// Analysis cache sizing.
    pub cache: CacheConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Spring-damper camera parameters, user-configurable per project.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDynamicsConfig {
    /// Spring constant pulling the camera toward its target.
    pub stiffness: f64,

    /// Velocity damping. `2 * sqrt(stiffness * mass)` is critical.
    pub damping: f64,

    /// Simulated camera mass.
    pub mass: f64,

    /// Dead-zone half-extent as a fraction of the visible half-window.
    /// The target may move this far from the camera center without panning.
    pub dead_zone_ratio: f64,

    /// Largest source-time delta integrated in one step. Larger jumps are
    /// treated as discontinuities and snap the camera to its target.
    pub max_step_ms: f64,

    /// Integration substep length.
    pub substep_ms: f64,
}

impl CameraDynamicsConfig {
    /// Critical damping for the configured stiffness and mass.
    pub fn critical_damping(&self) -> f64 {
        2.0 * (self.stiffness.max(1e-4) * self.mass.max(1e-4)).sqrt()
    }
}

impl Default for CameraDynamicsConfig {
    fn default() -> Self {
        Self {
            stiffness: 170.0,
            damping: 26.0,
            mass: 1.0,
            dead_zone_ratio: 0.1,
            max_step_ms: 250.0,
            substep_ms: 4.0,
        }
    }
}

/// Exponential position smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Number of evenly spaced samples within the lookback window.
    pub steps: usize,

    /// Lookback window ending at the query time (ms).
    pub window_ms: f64,

    /// Exponential decay constant (ms).
    pub tau_ms: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            steps: 12,
            window_ms: 600.0,
            tau_ms: 180.0,
        }
    }
}

/// Cursor velocity parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Lookback window (ms).
    pub lookback_ms: f64,

    /// Per-axis movement (px) treated as jitter rather than motion.
    pub jitter_threshold_px: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            lookback_ms: 50.0,
            jitter_threshold_px: 2.0,
        }
    }
}

/// UI-level zoom detection overrides. `Some` values always win over the
/// generation defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomDetectionSettings {
    pub max_zooms_per_minute: Option<f64>,
    pub min_gap_ms: Option<f64>,
    pub default_scale: Option<f64>,
    pub enabled: Option<bool>,
}

/// Analysis cache sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries per cache before LRU eviction.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "clipcam=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    ///
    /// A missing file is not worth a warning; an unreadable or malformed
    /// one is.
    pub fn load_from(config_path: &Path) -> Self {
        match Self::read_from(config_path) {
            Ok(config) => config,
            Err(ClipcamError::FileNotFound { .. }) => Self::default(),
            Err(e) => {
                tracing::warn!("Ignoring config at {:?}: {}", config_path, e);
                Self::default()
            }
        }
    }

    /// Read config from `config_path` without falling back.
    pub fn read_from(config_path: &Path) -> ClipcamResult<Self> {
        if !config_path.exists() {
            return Err(ClipcamError::FileNotFound {
                path: config_path.to_path_buf(),
            });
        }
        let content =
            std::fs::read_to_string(config_path).map_err(|e| ClipcamError::io(config_path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> ClipcamResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config as pretty JSON, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> ClipcamResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ClipcamError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json).map_err(|e| ClipcamError::io(config_path, e))
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("clipcam").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_damping_is_near_critical() {
        let camera = CameraDynamicsConfig::default();
        assert!((camera.damping - camera.critical_damping()).abs() < 0.5);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"camera":{"stiffness":90.0},"zoom_detection":{"min_gap_ms":500.0}}"#)
                .unwrap();
        assert_eq!(parsed.camera.stiffness, 90.0);
        assert_eq!(parsed.camera.mass, 1.0);
        assert_eq!(parsed.smoothing.steps, 12);
        assert_eq!(parsed.zoom_detection.min_gap_ms, Some(500.0));
        assert_eq!(parsed.zoom_detection.max_zooms_per_minute, None);
    }

    #[test]
    fn test_load_from_missing_path_uses_defaults() {
        let missing = Path::new("/nonexistent/clipcam.json");
        assert!(matches!(
            AppConfig::read_from(missing),
            Err(ClipcamError::FileNotFound { .. })
        ));
        let config = AppConfig::load_from(missing);
        assert_eq!(config.cache.capacity, 64);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_then_read_back() {
        let dir = std::env::temp_dir().join("clipcam_test_config");
        let path = dir.join("nested").join("config.json");
        let _ = std::fs::remove_dir_all(&dir);

        let mut config = AppConfig::default();
        config.camera.stiffness = 120.0;
        config.cache.capacity = 8;
        config.zoom_detection.min_gap_ms = Some(900.0);
        config.save_to(&path).unwrap();

        let loaded = AppConfig::read_from(&path).unwrap();
        assert_eq!(loaded.camera, config.camera);
        assert_eq!(loaded.cache, config.cache);
        assert_eq!(loaded.zoom_detection.min_gap_ms, Some(900.0));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::read_from(&path), Err(ClipcamError::Json(_))));
        assert_eq!(AppConfig::load_from(&path).cache.capacity, 64);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
