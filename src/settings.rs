use log::{LevelFilter, debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::pdf::{DEFAULT_THUMBNAIL_SCALE, Zoom};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdf-viewer-engine";

/// Engine tuning, read once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Scale used for sidebar previews
    #[serde(default = "default_thumbnail_scale")]
    pub thumbnail_scale: f32,

    /// Increment for zoom in / zoom out
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f32,

    /// Pixels subtracted from the container before fit-width / fit-page
    #[serde(default = "default_container_padding")]
    pub container_padding: f32,

    /// Vertical gap between stacked pages
    #[serde(default = "default_page_gap")]
    pub page_gap: f32,

    /// Pages rendered per `Viewer::tick`; unset renders everything eagerly
    #[serde(default)]
    pub render_pages_per_tick: Option<usize>,

    #[serde(default = "default_scale")]
    pub default_scale: f32,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_thumbnail_scale() -> f32 {
    DEFAULT_THUMBNAIL_SCALE
}

fn default_zoom_step() -> f32 {
    Zoom::DEFAULT_STEP
}

fn default_container_padding() -> f32 {
    Zoom::DEFAULT_PADDING
}

fn default_page_gap() -> f32 {
    10.0
}

fn default_scale() -> f32 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            thumbnail_scale: default_thumbnail_scale(),
            zoom_step: default_zoom_step(),
            container_padding: default_container_padding(),
            page_gap: default_page_gap(),
            render_pages_per_tick: None,
            default_scale: default_scale(),
            log_level: default_log_level(),
        }
    }
}

impl ViewerSettings {
    /// `log_level` as a filter; unknown names fall back to `Info`
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or_else(|_| {
            warn!("Unknown log level {:?}, using info", self.log_level);
            LevelFilter::Info
        })
    }

    /// Replace out-of-range values with their defaults
    pub(crate) fn sanitize(&mut self) {
        if !(self.thumbnail_scale.is_finite() && self.thumbnail_scale > 0.0) {
            warn!("Ignoring thumbnail_scale {}", self.thumbnail_scale);
            self.thumbnail_scale = default_thumbnail_scale();
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 0.0) {
            warn!("Ignoring zoom_step {}", self.zoom_step);
            self.zoom_step = default_zoom_step();
        }
        if !(self.container_padding.is_finite() && self.container_padding >= 0.0) {
            self.container_padding = default_container_padding();
        }
        if !(self.page_gap.is_finite() && self.page_gap >= 0.0) {
            self.page_gap = default_page_gap();
        }
        if self.render_pages_per_tick == Some(0) {
            self.render_pages_per_tick = Some(1);
        }
        self.default_scale = Zoom::clamp_factor(self.default_scale);
    }

    /// Read settings from `path`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// logged and also yields the defaults.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            info!("Settings file {path:?} not found, using defaults");
            return Self::default();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to read settings file {path:?}: {e}");
                return Self::default();
            }
        };

        match serde_yaml::from_str::<ViewerSettings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");
                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    if let Err(e) = settings.save_to_path(path) {
                        error!("Failed to save migrated settings to {path:?}: {e}");
                    }
                }
                settings.sanitize();
                settings
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                Self::default()
            }
        }
    }

    /// Settings from an explicit path, else from the user config directory
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        match explicit.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => Self::load_from_path(&path),
            None => {
                warn!("Could not determine config directory, using default settings");
                Self::default()
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        debug!("Saved settings to {path:?}");
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

fn migrate_settings(settings: &mut ViewerSettings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = ViewerSettings::load_from_path(&dir.path().join("config.yaml"));
        assert_eq!(settings, ViewerSettings::default());
        assert_eq!(settings.thumbnail_scale, 0.2);
        assert_eq!(settings.zoom_step, 0.25);
        assert_eq!(settings.container_padding, 40.0);
        assert_eq!(settings.render_pages_per_tick, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 1\npage_gap: 24\nrender_pages_per_tick: 2\n").unwrap();

        let settings = ViewerSettings::load_from_path(&path);
        assert_eq!(settings.page_gap, 24.0);
        assert_eq!(settings.render_pages_per_tick, Some(2));
        assert_eq!(settings.zoom_step, 0.25);
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "page_gap: [not, a, number\n").unwrap();
        assert_eq!(
            ViewerSettings::load_from_path(&path),
            ViewerSettings::default()
        );
    }

    #[test]
    fn out_of_range_values_are_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "zoom_step: -1\ndefault_scale: 12\nrender_pages_per_tick: 0\n",
        )
        .unwrap();

        let settings = ViewerSettings::load_from_path(&path);
        assert_eq!(settings.zoom_step, 0.25);
        assert_eq!(settings.default_scale, 4.0);
        assert_eq!(settings.render_pages_per_tick, Some(1));
    }

    #[test]
    fn old_version_is_migrated_and_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 0\n").unwrap();

        let settings = ViewerSettings::load_from_path(&path);
        assert_eq!(settings.version, CURRENT_VERSION);

        let reread: ViewerSettings =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread.version, CURRENT_VERSION);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.yaml");
        let settings = ViewerSettings {
            page_gap: 4.0,
            log_level: "debug".into(),
            ..ViewerSettings::default()
        };
        settings.save_to_path(&path).unwrap();
        assert_eq!(ViewerSettings::load_from_path(&path), settings);
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        let settings = ViewerSettings {
            log_level: "DEBUG".into(),
            ..ViewerSettings::default()
        };
        assert_eq!(settings.level_filter(), LevelFilter::Debug);

        let settings = ViewerSettings {
            log_level: "chatty".into(),
            ..ViewerSettings::default()
        };
        assert_eq!(settings.level_filter(), LevelFilter::Info);
    }
}
