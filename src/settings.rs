use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::modules::helpers::image_export::ExportOptions;
use crate::modules::image_edit::RestoreMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbaColor { pub r: u8, pub g: u8, pub b: u8, pub a: u8 }

impl RgbaColor {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Self = Self { r: 255, g: 255, b: 255, a: 255 };

    pub fn to_hex(&self) -> String {
        if self.a == 255 { format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b) }
        else { format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a) }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex: &str = hex.trim_start_matches('#');
        if !hex.is_ascii() { return None; }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self { r: channel(0)?, g: channel(2)?, b: channel(4)?, a: 255 }),
            8 => Some(Self { r: channel(0)?, g: channel(2)?, b: channel(4)?, a: channel(6)? }),
            _ => None,
        }
    }

    pub fn to_array(self) -> [u8; 4] { [self.r, self.g, self.b, self.a] }
}

impl TryFrom<String> for RgbaColor {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid colour '{}'", value))
    }
}

impl From<RgbaColor> for String {
    fn from(value: RgbaColor) -> Self { value.to_hex() }
}

/// Tunables for an editing session, persisted as JSON in the user config dir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Upper bound used when the canvas is fitted to a freshly loaded image.
    pub max_canvas_width: u32,
    pub max_canvas_height: u32,
    pub fit_canvas_on_load: bool,
    pub brush_color: RgbaColor,
    pub brush_width: f32,
    /// Alpha used by tools that only draw a placeholder stroke.
    pub degraded_alpha: f32,
    /// 0 keeps every snapshot.
    pub history_depth: usize,
    pub restore_mode: RestoreMode,
    pub export: ExportOptions,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 600,
            max_canvas_width: 1920,
            max_canvas_height: 1080,
            fit_canvas_on_load: true,
            brush_color: RgbaColor::BLACK,
            brush_width: 5.0,
            degraded_alpha: 0.2,
            history_depth: 0,
            restore_mode: RestoreMode::Flatten,
            export: ExportOptions::default(),
        }
    }
}

impl EditorSettings {
    pub fn load() -> Self { Self::load_from(&Self::get_config_path()) }

    pub fn load_from(path: &Path) -> Self {
        let contents: String = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let path: PathBuf = Self::get_config_path();
        if let Err(e) = self.save_to(&path) {
            warn!(path = %path.display(), error = %e, "failed to save settings");
        }
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() { fs::create_dir_all(parent)?; }
        let json: String = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    pub fn get_config_path() -> PathBuf {
        let mut path: PathBuf = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("layer_editor");
        path.push("editor_settings.json");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours_parse_with_and_without_alpha() {
        assert_eq!(RgbaColor::from_hex("#FF8000"), Some(RgbaColor { r: 255, g: 128, b: 0, a: 255 }));
        assert_eq!(RgbaColor::from_hex("00000080"), Some(RgbaColor { r: 0, g: 0, b: 0, a: 128 }));
        assert_eq!(RgbaColor::from_hex("#12345"), None);
        assert_eq!(RgbaColor::from_hex("#GG0000"), None);
        assert_eq!(RgbaColor::WHITE.to_hex(), "#FFFFFF");
        assert_eq!(RgbaColor { r: 1, g: 2, b: 3, a: 4 }.to_hex(), "#01020304");
    }

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("editor_settings.json");

        let mut settings = EditorSettings::default();
        settings.brush_width = 9.0;
        settings.brush_color = RgbaColor { r: 10, g: 20, b: 30, a: 255 };
        settings.restore_mode = RestoreMode::Structured;
        settings.history_depth = 50;
        settings.save_to(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"#0A141E\""), "colour should be stored as hex: {raw}");
        assert_eq!(EditorSettings::load_from(&path), settings);
    }

    #[test]
    fn missing_or_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert_eq!(EditorSettings::load_from(&missing), EditorSettings::default());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(EditorSettings::load_from(&broken), EditorSettings::default());
    }

    #[test]
    fn partial_file_fills_remaining_fields_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r##"{ "canvas_width": 320, "brush_color": "#FF0000" }"##).unwrap();

        let settings = EditorSettings::load_from(&path);
        assert_eq!(settings.canvas_width, 320);
        assert_eq!(settings.canvas_height, 600);
        assert_eq!(settings.brush_color, RgbaColor { r: 255, g: 0, b: 0, a: 255 });
    }
}
