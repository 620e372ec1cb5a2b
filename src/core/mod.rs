pub mod desktop;
#[cfg(windows)]
pub mod input;
#[cfg(windows)]
pub mod screen_capture;
#[cfg(windows)]
pub mod window;
