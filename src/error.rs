use std::path::PathBuf;
use thiserror::Error;

/// Every way the login workflow or template capture can fail.
/// The `Display` text is what the HTTP endpoints report.
#[derive(Debug, Error)]
pub enum HelperError {
    #[error("window containing \"{title}\" not found")]
    WindowNotFound { title: String },

    #[error("window lookup failed: {0}")]
    WindowLookup(String),

    #[error("failed to focus window: {0}")]
    Focus(String),

    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("template image not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("template image {} could not be read: {source}", path.display())]
    TemplateUnreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("template {template_w}x{template_h} does not fit screen {screen_w}x{screen_h}")]
    TemplateDoesNotFit {
        template_w: u32,
        template_h: u32,
        screen_w: u32,
        screen_h: u32,
    },

    #[error("login button not found (best score {score:.3}, threshold {threshold})")]
    ButtonNotFound { score: f32, threshold: f32 },

    #[error("click failed: {0}")]
    Input(String),

    #[error("failed to save template to {}: {source}", path.display())]
    TemplateSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("screen too small to crop template region")]
    EmptyRegion,

    #[error("failed to create template directory {}: {source}", path.display())]
    TemplateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("desktop automation is not supported on this platform")]
    Unsupported,

    #[error("automation task failed: {0}")]
    Task(String),
}
