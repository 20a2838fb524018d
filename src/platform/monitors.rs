//! Monitor enumeration and lookup under the cursor
//!
//! This module is responsible for:
//! - Enumerating all connected monitors
//! - Finding the monitor that contains the system cursor
//! - Providing work area information (excluding taskbar)
//!
//! CRITICAL: This module must handle the Windows virtual coordinate system
//! where secondary monitors can have negative coordinates. The process is
//! per-monitor DPI aware, so every rectangle here is in real pixels.

use log::{debug, warn};
use windows::Win32::Foundation::{BOOL, FALSE, LPARAM, POINT, RECT, TRUE};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITOR_DEFAULTTONEAREST,
    MonitorFromPoint,
};
use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, GetDpiForMonitor, MDT_EFFECTIVE_DPI,
    SetProcessDpiAwarenessContext,
};
use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

use crate::domain::core::Region;
use crate::platform::{MonitorLocator, PlatformError};

/// A connected monitor
#[derive(Debug, Clone)]
pub struct Monitor {
    pub handle: HMONITOR,
    /// Zero-based index in enumeration order
    pub index: usize,
    pub bounds: Region,
    /// Bounds minus the taskbar and docked toolbars
    pub work_area: Region,
    /// DPI scale factor (1.0 = 96 DPI, 1.25 = 120 DPI, etc.)
    pub dpi_scale: f32,
    pub is_primary: bool,
}

fn rect_to_region(rect: &RECT) -> Result<Region, PlatformError> {
    Region::new(rect.left, rect.top, rect.right, rect.bottom)
        .map_err(|e| PlatformError::InvalidMonitor(e.to_string()))
}

fn monitor_info(handle: HMONITOR) -> Result<MONITORINFO, PlatformError> {
    let mut info = MONITORINFO {
        cbSize: std::mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };
    if unsafe { GetMonitorInfoW(handle, &mut info) } == FALSE {
        return Err(PlatformError::MonitorInfo);
    }
    Ok(info)
}

fn describe(handle: HMONITOR, index: usize) -> Result<Monitor, PlatformError> {
    let info = monitor_info(handle)?;

    let mut dpi_x: u32 = 96;
    let mut dpi_y: u32 = 96;
    if unsafe { GetDpiForMonitor(handle, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y) }.is_err() {
        dpi_x = 96;
    }

    Ok(Monitor {
        handle,
        index,
        bounds: rect_to_region(&info.rcMonitor)?,
        work_area: rect_to_region(&info.rcWork)?,
        dpi_scale: dpi_x as f32 / 96.0,
        is_primary: (info.dwFlags & 1) != 0, // MONITORINFOF_PRIMARY
    })
}

/// Callback function for monitor enumeration
///
/// Monitors that fail to describe themselves are skipped; partial data is
/// better than no grid at all.
unsafe extern "system" fn enum_monitor_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = unsafe { &mut *(lparam.0 as *mut Vec<Monitor>) };
    match describe(hmonitor, monitors.len()) {
        Ok(monitor) => monitors.push(monitor),
        Err(e) => warn!("Skipping monitor {:?}: {}", hmonitor, e),
    }
    TRUE
}

/// Enumerates all monitors
pub fn enumerate_monitors() -> Result<Vec<Monitor>, PlatformError> {
    let mut monitors: Vec<Monitor> = Vec::new();

    let ok = unsafe {
        EnumDisplayMonitors(
            None,
            None,
            Some(enum_monitor_proc),
            LPARAM(&mut monitors as *mut _ as isize),
        )
    };
    if ok == FALSE || monitors.is_empty() {
        return Err(PlatformError::MonitorInfo);
    }

    Ok(monitors)
}

/// Gets the monitor containing the specified point, or the nearest one
pub fn monitor_from_point(x: i32, y: i32) -> Result<Monitor, PlatformError> {
    let handle = unsafe { MonitorFromPoint(POINT { x, y }, MONITOR_DEFAULTTONEAREST) };
    if handle.is_invalid() {
        return Err(PlatformError::MonitorNotFound { x, y });
    }
    describe(handle, 0)
}

/// Opts the process into per-monitor DPI awareness
///
/// Must run before the overlay window is created.
pub fn enable_dpi_awareness() {
    let result =
        unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) };
    if let Err(e) = result {
        warn!("Failed to enable per-monitor DPI awareness: {}", e);
    }
}

/// Locates the work area of the monitor under the cursor
#[derive(Debug, Default, Clone, Copy)]
pub struct CursorMonitorLocator;

impl MonitorLocator for CursorMonitorLocator {
    fn locate_active_monitor(&self) -> Result<Region, PlatformError> {
        let mut cursor = POINT::default();
        unsafe { GetCursorPos(&mut cursor) }.map_err(|_| PlatformError::CursorPosition)?;

        let monitor = monitor_from_point(cursor.x, cursor.y)?;
        debug!(
            "Cursor at ({}, {}) on monitor {:?} (scale {:.2})",
            cursor.x, cursor.y, monitor.work_area, monitor.dpi_scale
        );
        Ok(monitor.work_area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_enumerate_monitors() {
        // Headless CI machines have no display
        let Ok(monitors) = enumerate_monitors() else {
            return;
        };
        assert!(monitors.iter().any(|m| m.is_primary));
        for (i, monitor) in monitors.iter().enumerate() {
            assert_eq!(monitor.index, i);
            assert!(monitor.bounds.contains(&monitor.work_area));
        }
    }

    #[test]
    fn rect_conversion_rejects_empty() {
        let rect = RECT {
            left: -1920,
            top: 0,
            right: 0,
            bottom: 1080,
        };
        assert_eq!(
            rect_to_region(&rect).unwrap(),
            Region::new(-1920, 0, 0, 1080).unwrap()
        );

        let empty = RECT {
            left: 10,
            top: 0,
            right: 10,
            bottom: 10,
        };
        assert!(rect_to_region(&empty).is_err());
    }
}
