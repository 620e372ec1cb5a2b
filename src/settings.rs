use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HelperSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // Substring matched against visible top-level window titles
    #[serde(default = "default_window_title")]
    pub window_title: String,

    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    #[serde(default = "default_template_file")]
    pub template_file: String,

    /// Minimum normalized correlation (0.0-1.0) for the button to count as found
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Wait between focusing the window and capturing the screen
    #[serde(default = "default_focus_delay_ms")]
    pub focus_delay_ms: u64,

    // Template capture region, centered on the primary monitor
    #[serde(default = "default_region_half_width")]
    pub region_half_width: u32,
    #[serde(default = "default_region_half_height")]
    pub region_half_height: u32,
}

impl Default for HelperSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            window_title: default_window_title(),
            template_dir: default_template_dir(),
            template_file: default_template_file(),
            threshold: default_threshold(),
            focus_delay_ms: default_focus_delay_ms(),
            region_half_width: default_region_half_width(),
            region_half_height: default_region_half_height(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:5001".to_string()
}

fn default_window_title() -> String {
    "微信".to_string()
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_template_file() -> String {
    "login_button.png".to_string()
}

fn default_threshold() -> f32 {
    0.8
}

fn default_focus_delay_ms() -> u64 {
    500
}

fn default_region_half_width() -> u32 {
    100
}

fn default_region_half_height() -> u32 {
    40
}

impl HelperSettings {
    pub const SETTINGS_FILE: &'static str = "login_helper_settings.json";

    /// Load settings from the working directory, or defaults if missing.
    /// The file is optional and never written by the service.
    pub fn load() -> Self {
        Self::load_from(Self::SETTINGS_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<HelperSettings>(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Full path of the reference template image
    pub fn template_path(&self) -> PathBuf {
        self.template_dir.join(&self.template_file)
    }
}
