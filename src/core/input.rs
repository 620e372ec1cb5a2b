use std::thread;
use std::time::Duration;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEINPUT,
    MOUSE_EVENT_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::SetCursorPos;

fn mouse_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dwFlags: flags,
                ..Default::default()
            },
        },
    }
}

/// Left button down + up at the current cursor position
fn left_click_inputs() -> [INPUT; 2] {
    [
        mouse_input(MOUSEEVENTF_LEFTDOWN),
        mouse_input(MOUSEEVENTF_LEFTUP),
    ]
}

/// Physical left click at virtual-screen coordinates.
/// Negative coordinates address monitors left of or above the primary one.
/// Retries once after 50ms if moving or clicking fails.
pub fn click_at_screen(x: i32, y: i32) -> Result<(), String> {
    let mut last_error = String::new();
    for attempt in 0..2 {
        if attempt > 0 {
            thread::sleep(Duration::from_millis(50));
        }

        if let Err(e) = unsafe { SetCursorPos(x, y) } {
            last_error = format!("failed to move mouse to ({}, {}): {}", x, y, e);
            continue;
        }

        // Short sleep to stabilize cursor
        thread::sleep(Duration::from_millis(20));

        let inputs = left_click_inputs();
        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize == inputs.len() {
            return Ok(());
        }
        last_error = format!("SendInput injected {} of {} events", sent, inputs.len());
    }

    Err(last_error)
}
