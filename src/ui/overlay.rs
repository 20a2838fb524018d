//! Layered overlay window for grid display
//!
//! A single transparent window covers the root region while the grid is
//! shown. It never takes focus and lets clicks through, so the user's
//! active window keeps receiving input. Frames are rendered with tiny-skia
//! and presented through `UpdateLayeredWindow` for flicker-free updates.

use std::ffi::c_void;
use std::slice;

use log::{debug, info};
use tiny_skia::Pixmap;
use windows::core::w;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, POINT, SIZE, WPARAM};
use windows::Win32::Graphics::Gdi::{
    AC_SRC_ALPHA, AC_SRC_OVER, BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BLENDFUNCTION,
    CreateCompatibleDC, CreateDIBSection, DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, HGDIOBJ,
    ReleaseDC, SelectObject,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, MSG, PM_REMOVE,
    PeekMessageW, RegisterClassW, SW_HIDE, SW_SHOWNOACTIVATE, ShowWindow, TranslateMessage,
    ULW_ALPHA, UpdateLayeredWindow, WNDCLASSW, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW,
    WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};

use crate::domain::core::Region;
use crate::domain::keyboard::NumpadKey;
use crate::ui::renderer::{GridLayout, GridRenderer, OverlayStyle};
use crate::ui::{OverlayError, OverlaySurface};

unsafe extern "system" fn overlay_window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

/// Overlay window implementing [`OverlaySurface`]
#[derive(Debug)]
pub struct LayeredOverlay {
    hwnd: HWND,
    /// Root region while shown
    canvas: Option<Region>,
    labels: [char; 9],
    visible: bool,
    style: OverlayStyle,
    renderer: GridRenderer,
}

impl LayeredOverlay {
    /// Creates the (hidden) overlay window
    pub fn new(style: OverlayStyle) -> Result<Self, OverlayError> {
        let class_name = w!("NumgridOverlayWindow");
        let hinstance = unsafe { GetModuleHandleW(None) }
            .map_err(|_| OverlayError::WindowClassRegistrationFailed)?;

        let wc = WNDCLASSW {
            lpfnWndProc: Some(overlay_window_proc),
            hInstance: hinstance.into(),
            lpszClassName: class_name,
            ..Default::default()
        };
        // Zero means the class already exists, which CreateWindowExW will tell us
        let _ = unsafe { RegisterClassW(&wc) };

        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_LAYERED
                    | WS_EX_TOPMOST
                    | WS_EX_NOACTIVATE
                    | WS_EX_TOOLWINDOW
                    | WS_EX_TRANSPARENT,
                class_name,
                w!("numgrid overlay"),
                WS_POPUP,
                0,
                0,
                1,
                1,
                None,
                None,
                hinstance,
                None,
            )
        };
        if hwnd.0 == 0 {
            return Err(OverlayError::WindowCreationFailed);
        }

        let renderer = GridRenderer::from_style(&style);
        info!("Overlay window created");

        Ok(Self {
            hwnd,
            canvas: None,
            labels: NumpadKey::labels(),
            visible: false,
            style,
            renderer,
        })
    }

    fn render(&mut self, canvas: Region, region: Region, depth: usize) -> Result<(), OverlayError> {
        let layout = GridLayout::new(canvas, region, depth, self.labels, &self.style)?;
        let pixmap = self.renderer.render_layout(&layout)?;
        self.present_pixmap(&pixmap, canvas)
    }

    /// Present the pixmap via UpdateLayeredWindow, moving the window onto `canvas`
    fn present_pixmap(&self, pixmap: &Pixmap, canvas: Region) -> Result<(), OverlayError> {
        let width = pixmap.width() as i32;
        let height = pixmap.height() as i32;

        unsafe {
            let screen_dc = GetDC(HWND(0));
            if screen_dc.0 == 0 {
                return Err(OverlayError::DeviceContextFailed);
            }

            let memory_dc = CreateCompatibleDC(screen_dc);
            if memory_dc.0 == 0 {
                ReleaseDC(HWND(0), screen_dc);
                return Err(OverlayError::MemoryDeviceContextFailed);
            }

            let mut bitmap_info = BITMAPINFO::default();
            bitmap_info.bmiHeader = BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height, // top-down
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            };

            let mut pixel_ptr: *mut c_void = std::ptr::null_mut();
            let dib = match CreateDIBSection(
                memory_dc,
                &bitmap_info,
                DIB_RGB_COLORS,
                &mut pixel_ptr,
                None,
                0,
            ) {
                Ok(bitmap) => bitmap,
                Err(_) => {
                    DeleteDC(memory_dc);
                    ReleaseDC(HWND(0), screen_dc);
                    return Err(OverlayError::DibSectionCreationFailed);
                }
            };
            let dib_object: HGDIOBJ = dib.into();

            if pixel_ptr.is_null() {
                DeleteObject(dib_object);
                DeleteDC(memory_dc);
                ReleaseDC(HWND(0), screen_dc);
                return Err(OverlayError::DibSectionCreationFailed);
            }

            // tiny-skia is premultiplied RGBA, the DIB wants premultiplied BGRA
            let dst = slice::from_raw_parts_mut(pixel_ptr as *mut u8, pixmap.data().len());
            for (dst, src) in dst.chunks_exact_mut(4).zip(pixmap.data().chunks_exact(4)) {
                dst.copy_from_slice(&[src[2], src[1], src[0], src[3]]);
            }

            let old_bitmap = SelectObject(memory_dc, dib_object);
            if old_bitmap.0 == 0 {
                DeleteObject(dib_object);
                DeleteDC(memory_dc);
                ReleaseDC(HWND(0), screen_dc);
                return Err(OverlayError::BitmapSelectionFailed);
            }

            let size = SIZE {
                cx: width,
                cy: height,
            };
            let dst_point = POINT {
                x: canvas.left(),
                y: canvas.top(),
            };
            let src_point = POINT { x: 0, y: 0 };
            let blend = BLENDFUNCTION {
                BlendOp: AC_SRC_OVER as u8,
                BlendFlags: 0,
                SourceConstantAlpha: (self.style.opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
                AlphaFormat: AC_SRC_ALPHA as u8,
            };

            let update_result = UpdateLayeredWindow(
                self.hwnd,
                screen_dc,
                Some(&dst_point),
                Some(&size),
                memory_dc,
                Some(&src_point),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            );

            SelectObject(memory_dc, old_bitmap);
            DeleteObject(dib_object);
            DeleteDC(memory_dc);
            ReleaseDC(HWND(0), screen_dc);

            if update_result.is_err() {
                return Err(OverlayError::LayerUpdateFailed);
            }
        }

        Ok(())
    }
}

impl OverlaySurface for LayeredOverlay {
    fn show(
        &mut self,
        region: Region,
        depth: usize,
        labels: [char; 9],
    ) -> Result<(), OverlayError> {
        self.canvas = Some(region);
        self.labels = labels;
        self.render(region, region, depth)?;

        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOWNOACTIVATE);
        }
        self.visible = true;
        debug!("Overlay shown over {:?}", region);
        Ok(())
    }

    fn update(&mut self, region: Region, depth: usize) -> Result<(), OverlayError> {
        let canvas = self.canvas.ok_or(OverlayError::NotShown)?;
        self.render(canvas, region, depth)
    }

    fn hide(&mut self) -> Result<(), OverlayError> {
        if self.visible {
            unsafe {
                let _ = ShowWindow(self.hwnd, SW_HIDE);
            }
            self.visible = false;
        }
        self.canvas = None;
        Ok(())
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_style(&mut self, style: OverlayStyle) {
        if style.font_path != self.style.font_path {
            self.renderer = GridRenderer::from_style(&style);
        }
        self.style = style;
    }

    /// Drains the thread's message queue so the window stays responsive
    fn pump(&mut self) {
        let mut msg = MSG::default();
        unsafe {
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}

impl Drop for LayeredOverlay {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_before_show_is_rejected() {
        // Window creation needs a desktop session
        let Ok(mut overlay) = LayeredOverlay::new(OverlayStyle::default()) else {
            return;
        };
        let region = Region::new(0, 0, 300, 300).unwrap();
        assert!(matches!(overlay.update(region, 1), Err(OverlayError::NotShown)));
        assert!(!overlay.is_visible());
    }
}
