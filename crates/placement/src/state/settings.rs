//! Placement settings

use std::path::Path;

use serde::{Deserialize, Serialize};
use shared::SNAP_DIAMETER;

/// Drop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSettings {
    /// Height above the resting position an object starts falling from
    pub drop_height: f32,
    /// Mass used when a placement does not give one
    pub default_mass: f32,
}

impl Default for DropSettings {
    fn default() -> Self {
        Self {
            drop_height: 1.0,
            default_mass: 1.0,
        }
    }
}

/// Pointer interaction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerSettings {
    /// Press/release closer together than this is a click
    pub click_max_ms: f64,
    /// Pointer travel below this is a click
    pub click_max_px: f32,
    /// Floor cursor radius in meters
    pub cursor_radius: f32,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            click_max_ms: 300.0,
            click_max_px: 5.0,
            cursor_radius: 0.15,
        }
    }
}

/// Snap settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapSettings {
    /// Commit the nearest connection after a drop or drag
    pub auto_snap: bool,
    /// Snap point diameter; default attraction is twice this
    pub diameter: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            auto_snap: true,
            diameter: SNAP_DIAMETER,
        }
    }
}

/// All placement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSettings {
    #[serde(default)]
    pub drop: DropSettings,
    #[serde(default)]
    pub pointer: PointerSettings,
    #[serde(default)]
    pub snap: SnapSettings,
    /// Floor height used while the scene has no geometry
    #[serde(default)]
    pub fallback_floor_y: f32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            drop: DropSettings::default(),
            pointer: PointerSettings::default(),
            snap: SnapSettings::default(),
            fallback_floor_y: 0.0,
        }
    }
}

impl PlacementSettings {
    /// Load settings from the user config dir, or return default if not found
    pub fn load() -> Self {
        directories::ProjectDirs::from("com", "floor-placement", "floor-placement")
            .map(|dirs| Self::load_from(&dirs.config_dir().join("settings.json")))
            .unwrap_or_default()
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed settings at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to the user config dir
    pub fn save(&self) {
        if let Some(dirs) = directories::ProjectDirs::from("com", "floor-placement", "floor-placement") {
            let config_dir = dirs.config_dir();
            if std::fs::create_dir_all(config_dir).is_ok() {
                if let Err(e) = self.save_to(&config_dir.join("settings.json")) {
                    tracing::warn!("Failed to save settings: {e}");
                }
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = PlacementSettings::default();
        assert_eq!(s.pointer.click_max_ms, 300.0);
        assert_eq!(s.pointer.click_max_px, 5.0);
        assert_eq!(s.snap.diameter, 0.1);
        assert!(s.snap.auto_snap);
        assert_eq!(s.drop.default_mass, 1.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: PlacementSettings =
            serde_json::from_str(r#"{"snap": {"auto_snap": false, "diameter": 0.2}}"#).unwrap();
        assert!(!s.snap.auto_snap);
        assert_eq!(s.pointer, PointerSettings::default());
        assert_eq!(s.fallback_floor_y, 0.0);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("placement-settings-{}.json", std::process::id()));
        let mut s = PlacementSettings::default();
        s.drop.drop_height = 2.5;
        s.save_to(&path).unwrap();
        assert_eq!(PlacementSettings::load_from(&path), s);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("placement-settings-does-not-exist.json");
        assert_eq!(PlacementSettings::load_from(&path), PlacementSettings::default());
    }
}
