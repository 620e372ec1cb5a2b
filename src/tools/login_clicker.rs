use crate::automation::detection::{best_match, load_template, region_around};
use crate::core::desktop::Desktop;
use crate::error::HelperError;
use crate::settings::HelperSettings;
use image::imageops;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Finds the chat window and clicks its login button by template matching
pub struct LoginHelper<D> {
    desktop: D,
    settings: HelperSettings,
}

impl<D: Desktop> LoginHelper<D> {
    /// Create the helper, making sure the template directory exists
    pub fn new(desktop: D, settings: HelperSettings) -> Result<Self, HelperError> {
        fs::create_dir_all(&settings.template_dir).map_err(|source| HelperError::TemplateDir {
            path: settings.template_dir.clone(),
            source,
        })?;

        Ok(Self { desktop, settings })
    }

    pub fn settings(&self) -> &HelperSettings {
        &self.settings
    }

    /// Focus the window, find the login button on screen and click it.
    /// Returns the clicked screen position.
    pub fn click_login(&self) -> Result<(i32, i32), HelperError> {
        let title = &self.settings.window_title;
        let window = self
            .desktop
            .find_window(title)?
            .ok_or_else(|| HelperError::WindowNotFound {
                title: title.clone(),
            })?;
        tracing::debug!(handle = window.handle, title = %window.title, "found target window");

        self.desktop.focus_window(&window)?;

        // Give the window time to come to the front and repaint
        delay_ms(self.settings.focus_delay_ms);

        let screenshot = self.desktop.capture_screen()?;
        let template = load_template(&self.settings.template_path())?;
        let found = best_match(&imageops::grayscale(&screenshot.image), &template)?;
        tracing::debug!(
            x = found.top_left.0,
            y = found.top_left.1,
            score = found.score,
            "best template placement"
        );

        if !found.meets(self.settings.threshold) {
            return Err(HelperError::ButtonNotFound {
                score: found.score,
                threshold: self.settings.threshold,
            });
        }

        let (x, y) = screenshot.to_screen_coords(found.center.0, found.center.1);
        self.desktop.click(x, y)?;
        Ok((x, y))
    }

    /// Capture the screen and store the region around the primary monitor's center
    /// as the new template. Returns the path written.
    pub fn save_template(&self) -> Result<PathBuf, HelperError> {
        let screenshot = self.desktop.capture_screen()?;
        let region = region_around(
            &screenshot.image,
            screenshot.primary_center(),
            self.settings.region_half_width,
            self.settings.region_half_height,
        )
        .ok_or(HelperError::EmptyRegion)?;

        let path = self.settings.template_path();
        region
            .save(&path)
            .map_err(|source| HelperError::TemplateSave {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %path.display(),
            width = region.width(),
            height = region.height(),
            "template written"
        );
        Ok(path)
    }
}

/// Delay for a specified number of milliseconds
fn delay_ms(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}
