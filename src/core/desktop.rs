use crate::error::HelperError;
use image::RgbImage;

/// A top-level window found by title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Raw OS handle (HWND on Windows)
    pub handle: isize,
    pub title: String,
}

/// A full-screen capture
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub image: RgbImage,
    /// Screen coordinates of the image's top-left pixel
    pub origin: (i32, i32),
    /// Size of the primary monitor, which starts at screen (0, 0)
    pub primary_size: (u32, u32),
}

impl Screenshot {
    /// Convert a pixel position in the image to screen coordinates
    pub fn to_screen_coords(&self, x: u32, y: u32) -> (i32, i32) {
        (self.origin.0 + x as i32, self.origin.1 + y as i32)
    }

    /// Center of the primary monitor, in image pixels
    pub fn primary_center(&self) -> (u32, u32) {
        let (width, height) = self.image.dimensions();
        let x = (self.primary_size.0 / 2) as i64 - self.origin.0 as i64;
        let y = (self.primary_size.1 / 2) as i64 - self.origin.1 as i64;
        (x.clamp(0, width as i64) as u32, y.clamp(0, height as i64) as u32)
    }
}

/// The OS operations the login workflow needs
pub trait Desktop {
    /// First visible top-level window whose title contains `title_fragment`
    fn find_window(&self, title_fragment: &str) -> Result<Option<WindowInfo>, HelperError>;

    /// Restore the window and make it the foreground window
    fn focus_window(&self, window: &WindowInfo) -> Result<(), HelperError>;

    fn capture_screen(&self) -> Result<Screenshot, HelperError>;

    /// Move the cursor to screen coordinates and left-click
    fn click(&self, x: i32, y: i32) -> Result<(), HelperError>;
}

/// Win32 backed desktop
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDesktop;

#[cfg(windows)]
impl NativeDesktop {
    pub fn new() -> Self {
        use windows::Win32::UI::HiDpi::{
            SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
        };

        // Capture pixels and cursor positions must share physical coordinates.
        // Fails harmlessly if awareness was already set (e.g. by a manifest).
        unsafe {
            let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
        }
        Self
    }
}

#[cfg(windows)]
impl Desktop for NativeDesktop {
    fn find_window(&self, title_fragment: &str) -> Result<Option<WindowInfo>, HelperError> {
        let found = crate::core::window::find_window_by_title(title_fragment)
            .map_err(HelperError::WindowLookup)?;
        Ok(found.map(|(hwnd, title)| WindowInfo {
            handle: hwnd.0,
            title,
        }))
    }

    fn focus_window(&self, window: &WindowInfo) -> Result<(), HelperError> {
        use windows::Win32::Foundation::HWND;

        crate::core::window::bring_to_foreground(HWND(window.handle)).map_err(HelperError::Focus)
    }

    fn capture_screen(&self) -> Result<Screenshot, HelperError> {
        crate::core::screen_capture::capture_virtual_screen().map_err(HelperError::Capture)
    }

    fn click(&self, x: i32, y: i32) -> Result<(), HelperError> {
        crate::core::input::click_at_screen(x, y).map_err(HelperError::Input)
    }
}

/// Stand-in for hosts without a desktop backend; every operation fails
#[cfg(not(windows))]
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDesktop;

#[cfg(not(windows))]
impl NativeDesktop {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(windows))]
impl Desktop for NativeDesktop {
    fn find_window(&self, _title_fragment: &str) -> Result<Option<WindowInfo>, HelperError> {
        Err(HelperError::Unsupported)
    }

    fn focus_window(&self, _window: &WindowInfo) -> Result<(), HelperError> {
        Err(HelperError::Unsupported)
    }

    fn capture_screen(&self) -> Result<Screenshot, HelperError> {
        Err(HelperError::Unsupported)
    }

    fn click(&self, _x: i32, _y: i32) -> Result<(), HelperError> {
        Err(HelperError::Unsupported)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use image::Rgb;
    use std::sync::{Arc, Mutex};

    /// Scripted desktop that records focus and click calls
    #[derive(Clone)]
    pub struct FakeDesktop {
        pub windows: Vec<String>,
        pub screen: RgbImage,
        pub origin: (i32, i32),
        pub primary_size: (u32, u32),
        pub refuse_focus: bool,
        pub focused: Arc<Mutex<Vec<String>>>,
        pub clicks: Arc<Mutex<Vec<(i32, i32)>>>,
    }

    impl FakeDesktop {
        pub fn new(windows: &[&str], screen: RgbImage) -> Self {
            Self {
                windows: windows.iter().map(|t| t.to_string()).collect(),
                primary_size: screen.dimensions(),
                screen,
                origin: (0, 0),
                refuse_focus: false,
                focused: Arc::default(),
                clicks: Arc::default(),
            }
        }

        pub fn clicks(&self) -> Vec<(i32, i32)> {
            self.clicks.lock().unwrap().clone()
        }
    }

    impl Desktop for FakeDesktop {
        fn find_window(&self, title_fragment: &str) -> Result<Option<WindowInfo>, HelperError> {
            Ok(self
                .windows
                .iter()
                .enumerate()
                .find(|(_, title)| title.contains(title_fragment))
                .map(|(i, title)| WindowInfo {
                    handle: i as isize + 1,
                    title: title.clone(),
                }))
        }

        fn focus_window(&self, window: &WindowInfo) -> Result<(), HelperError> {
            if self.refuse_focus {
                return Err(HelperError::Focus("SetForegroundWindow was refused".to_string()));
            }
            self.focused.lock().unwrap().push(window.title.clone());
            Ok(())
        }

        fn capture_screen(&self) -> Result<Screenshot, HelperError> {
            Ok(Screenshot {
                image: self.screen.clone(),
                origin: self.origin,
                primary_size: self.primary_size,
            })
        }

        fn click(&self, x: i32, y: i32) -> Result<(), HelperError> {
            self.clicks.lock().unwrap().push((x, y));
            Ok(())
        }
    }

    /// Deterministic pseudo-random screen content
    pub fn noise_image(width: u32, height: u32, seed: u32) -> RgbImage {
        let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        RgbImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let v = (state >> 16) as u8;
            Rgb([v, v.wrapping_mul(3), v.wrapping_add(91)])
        })
    }

    /// A green button with white caption-like strokes
    pub fn button_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let inside = x >= width / 6 && x < width - width / 6;
            let bar = y == height / 3 || y == height / 3 + 1 || y == 2 * height / 3;
            let stem = x % 9 == 4 && y > height / 4 && y < 3 * height / 4;
            if inside && (bar || stem) {
                Rgb([255, 255, 255])
            } else {
                Rgb([7, 193, 96])
            }
        })
    }

    #[test]
    fn screenshot_coords_are_offset_by_origin() {
        let shot = Screenshot {
            image: RgbImage::new(4, 4),
            origin: (-1920, 10),
            primary_size: (4, 4),
        };
        assert_eq!(shot.to_screen_coords(3, 2), (-1917, 12));
    }

    #[test]
    fn primary_center_accounts_for_left_monitor() {
        // 1920 wide monitor left of a 1280x720 primary
        let shot = Screenshot {
            image: RgbImage::new(3200, 1080),
            origin: (-1920, 0),
            primary_size: (1280, 720),
        };
        assert_eq!(shot.primary_center(), (1920 + 640, 360));
        let (x, y) = shot.primary_center();
        assert_eq!(shot.to_screen_coords(x, y), (640, 360));
    }

    #[test]
    fn primary_center_of_single_monitor_is_image_center() {
        let shot = Screenshot {
            image: RgbImage::new(1920, 1080),
            origin: (0, 0),
            primary_size: (1920, 1080),
        };
        assert_eq!(shot.primary_center(), (960, 540));
    }
}
