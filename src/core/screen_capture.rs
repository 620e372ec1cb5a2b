use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXSCREEN, SM_CXVIRTUALSCREEN, SM_CYSCREEN, SM_CYVIRTUALSCREEN,
    SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN,
};
use image::{ImageBuffer, Rgb};
use crate::core::desktop::Screenshot;

/// Capture the whole virtual screen (all monitors) using BitBlt
pub fn capture_virtual_screen() -> Result<Screenshot, String> {
    unsafe {
        let left = GetSystemMetrics(SM_XVIRTUALSCREEN);
        let top = GetSystemMetrics(SM_YVIRTUALSCREEN);
        let width = GetSystemMetrics(SM_CXVIRTUALSCREEN);
        let height = GetSystemMetrics(SM_CYVIRTUALSCREEN);
        let primary_width = GetSystemMetrics(SM_CXSCREEN).max(0) as u32;
        let primary_height = GetSystemMetrics(SM_CYSCREEN).max(0) as u32;

        if width <= 0 || height <= 0 {
            return Err(format!("Invalid virtual screen size {}x{}", width, height));
        }

        // Device context of the entire screen
        let screen_dc = GetDC(HWND(0));
        if screen_dc.is_invalid() {
            return Err("Failed to get screen device context".to_string());
        }

        let mem_dc = CreateCompatibleDC(screen_dc);
        if mem_dc.is_invalid() {
            let _ = ReleaseDC(HWND(0), screen_dc);
            return Err("Failed to create compatible DC".to_string());
        }

        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        if bitmap.is_invalid() {
            let _ = DeleteDC(mem_dc);
            let _ = ReleaseDC(HWND(0), screen_dc);
            return Err("Failed to create compatible bitmap".to_string());
        }

        let old_bitmap = SelectObject(mem_dc, bitmap);

        let result = BitBlt(mem_dc, 0, 0, width, height, screen_dc, left, top, SRCCOPY);

        if result.is_err() {
            let _ = SelectObject(mem_dc, old_bitmap);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            let _ = ReleaseDC(HWND(0), screen_dc);
            return Err("BitBlt failed - could not capture screen".to_string());
        }

        // 32 bits per pixel keeps rows DWORD-aligned without padding
        let mut bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height, // Negative for top-down bitmap
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0 as u32,
                biSizeImage: 0,
                biXPelsPerMeter: 0,
                biYPelsPerMeter: 0,
                biClrUsed: 0,
                biClrImportant: 0,
            },
            bmiColors: [Default::default(); 1],
        };

        // BGRA from Windows
        let mut buffer: Vec<u8> = vec![0; (width as usize) * (height as usize) * 4];

        let scan_lines = GetDIBits(
            mem_dc,
            bitmap,
            0,
            height as u32,
            Some(buffer.as_mut_ptr() as *mut _),
            &mut bmi,
            DIB_RGB_COLORS,
        );

        let _ = SelectObject(mem_dc, old_bitmap);
        let _ = DeleteObject(bitmap);
        let _ = DeleteDC(mem_dc);
        let _ = ReleaseDC(HWND(0), screen_dc);

        if scan_lines == 0 {
            return Err("Failed to get bitmap bits".to_string());
        }

        let image = ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            let idx = ((y as usize) * (width as usize) + x as usize) * 4;
            Rgb([buffer[idx + 2], buffer[idx + 1], buffer[idx]])
        });

        Ok(Screenshot {
            image,
            origin: (left, top),
            primary_size: (primary_width, primary_height),
        })
    }
}
