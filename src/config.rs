use std::path::{Path, PathBuf};

use crate::components::crop::{DEFAULT_EDGE_TOLERANCE, DEFAULT_MIN_SIZE};
use crate::components::history::DEFAULT_MAX_HISTORY;
use crate::io::SaveFormat;
use crate::ops::transform::Interpolation;

const SETTINGS_FILE: &str = "lumaedit_settings.cfg";

/// Editor tunables, persisted as a `key=value` text file.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorConfig {
    pub max_undo_steps: usize,
    pub crop_min_size: f64,
    pub crop_edge_tolerance: f64,
    pub interpolation: Interpolation,
    pub default_format: SaveFormat,
    pub jpeg_quality: u8,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_steps: DEFAULT_MAX_HISTORY,
            crop_min_size: DEFAULT_MIN_SIZE,
            crop_edge_tolerance: DEFAULT_EDGE_TOLERANCE,
            interpolation: Interpolation::default(),
            default_format: SaveFormat::default(),
            jpeg_quality: 90,
        }
    }
}

impl EditorConfig {
    /// Path to the settings file.
    /// On Linux:   ~/.config/lumaedit/lumaedit_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\LumaEdit\lumaedit_settings.cfg
    /// On macOS:   ~/Library/Application Support/LumaEdit/lumaedit_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("LumaEdit").join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("LumaEdit")
                    .join(SETTINGS_FILE),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = match std::env::var("XDG_CONFIG_HOME") {
                Ok(xdg) => PathBuf::from(xdg),
                Err(_) => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
            };
            Some(config_dir.join("lumaedit").join(SETTINGS_FILE))
        }
    }

    /// Load from the default location. Missing or unreadable files give defaults.
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse `key=value` lines. Unknown keys, comments and malformed values
    /// are skipped, leaving the default in place.
    pub fn parse(content: &str) -> Self {
        let mut cfg = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "max_undo_steps" => {
                    if let Ok(n) = val.parse::<usize>() {
                        cfg.max_undo_steps = n.max(1);
                    }
                }
                "crop_min_size" => {
                    if let Some(v) = parse_positive(val) {
                        cfg.crop_min_size = v;
                    }
                }
                "crop_edge_tolerance" => {
                    if let Some(v) = parse_positive(val) {
                        cfg.crop_edge_tolerance = v;
                    }
                }
                "interpolation" => {
                    if let Some(i) = Interpolation::from_name(val) {
                        cfg.interpolation = i;
                    }
                }
                "default_format" => {
                    if let Some(f) = SaveFormat::from_name(val) {
                        cfg.default_format = f;
                    }
                }
                "jpeg_quality" => {
                    if let Ok(q) = val.parse::<u8>() {
                        cfg.jpeg_quality = q.clamp(1, 100);
                    }
                }
                _ => {}
            }
        }
        cfg
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "max_undo_steps={}\n\
             crop_min_size={}\n\
             crop_edge_tolerance={}\n\
             interpolation={}\n\
             default_format={}\n\
             jpeg_quality={}\n",
            self.max_undo_steps,
            self.crop_min_size,
            self.crop_edge_tolerance,
            self.interpolation.label(),
            self.default_format.extension(),
            self.jpeg_quality,
        )
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }
}

fn parse_positive(val: &str) -> Option<f64> {
    val.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides_and_ignores_junk() {
        let cfg = EditorConfig::parse(
            "# comment\n\
             max_undo_steps = 5\n\
             interpolation=Lanczos3\n\
             crop_min_size=-4\n\
             jpeg_quality=250\n\
             not a line\n\
             unknown_key=1\n\
             default_format=tif\n",
        );
        assert_eq!(cfg.max_undo_steps, 5);
        assert_eq!(cfg.interpolation, Interpolation::Lanczos3);
        assert_eq!(cfg.crop_min_size, DEFAULT_MIN_SIZE);
        // 250 does fit a u8, then gets clamped.
        assert_eq!(cfg.jpeg_quality, 100);
        assert_eq!(cfg.default_format, SaveFormat::Tiff);
        assert_eq!(cfg.crop_edge_tolerance, DEFAULT_EDGE_TOLERANCE);
    }

    #[test]
    fn test_zero_undo_steps_becomes_one() {
        assert_eq!(EditorConfig::parse("max_undo_steps=0").max_undo_steps, 1);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let cfg = EditorConfig {
            max_undo_steps: 7,
            crop_min_size: 32.5,
            interpolation: Interpolation::Bicubic,
            default_format: SaveFormat::Jpeg,
            jpeg_quality: 75,
            ..EditorConfig::default()
        };
        cfg.save_to(&path).unwrap();
        assert_eq!(EditorConfig::load_from(&path), cfg);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            EditorConfig::load_from(&dir.path().join("absent.cfg")),
            EditorConfig::default()
        );
    }
}
