use windows::{
    Win32::Foundation::{BOOL, HWND, LPARAM},
    Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowTextW, IsWindow, IsWindowVisible, SetForegroundWindow, ShowWindow,
        SW_RESTORE,
    },
};

unsafe extern "system" fn collect_visible_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // lparam points at the Vec owned by visible_windows() for the duration of EnumWindows
    let windows = &mut *(lparam.0 as *mut Vec<(HWND, String)>);

    if IsWindowVisible(hwnd).as_bool() {
        let mut buffer = [0u16; 512];
        let len = GetWindowTextW(hwnd, &mut buffer);
        if len > 0 {
            windows.push((hwnd, String::from_utf16_lossy(&buffer[..len as usize])));
        }
    }

    // Keep enumerating
    BOOL(1)
}

/// Visible top-level windows with a non-empty title, in enumeration order
pub fn visible_windows() -> Result<Vec<(HWND, String)>, String> {
    let mut windows: Vec<(HWND, String)> = Vec::new();
    unsafe {
        EnumWindows(
            Some(collect_visible_window),
            LPARAM(&mut windows as *mut Vec<(HWND, String)> as isize),
        )
        .map_err(|e| format!("EnumWindows failed: {}", e))?;
    }
    Ok(windows)
}

/// Find the first visible window whose title contains `fragment`
pub fn find_window_by_title(fragment: &str) -> Result<Option<(HWND, String)>, String> {
    Ok(visible_windows()?
        .into_iter()
        .find(|(_, title)| title.contains(fragment)))
}

/// Check if window handle is valid
pub fn is_window_valid(hwnd: HWND) -> bool {
    unsafe { IsWindow(hwnd).as_bool() }
}

/// Restore a (possibly minimized) window and make it the foreground window
pub fn bring_to_foreground(hwnd: HWND) -> Result<(), String> {
    if !is_window_valid(hwnd) {
        return Err("window handle is no longer valid".to_string());
    }

    unsafe {
        // Return value is the previous visibility state, not an error
        let _ = ShowWindow(hwnd, SW_RESTORE);

        if !SetForegroundWindow(hwnd).as_bool() {
            return Err("SetForegroundWindow was refused".to_string());
        }
    }

    Ok(())
}
