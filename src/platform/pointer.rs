//! Pointer movement and synthesized mouse input
//!
//! Coordinates are absolute real pixels in the virtual desktop, the same
//! space the monitor rectangles live in.

use log::debug;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_HWHEEL, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_WHEEL,
    MOUSEINPUT, MOUSE_EVENT_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::SetCursorPos;

use crate::app::state::{MouseButton, ScrollDirection};
use crate::domain::core::Point;
use crate::platform::{wheel_deltas, PlatformError, PointerDriver};

fn mouse_input(flags: MOUSE_EVENT_FLAGS, data: i32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: data as _,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(inputs: &[INPUT]) -> Result<(), PlatformError> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    let expected = inputs.len() as u32;
    if sent != expected {
        return Err(PlatformError::InjectionIncomplete { sent, expected });
    }
    Ok(())
}

/// Drives the system pointer through `SetCursorPos` and `SendInput`
#[derive(Debug, Default)]
pub struct Win32Pointer;

impl PointerDriver for Win32Pointer {
    fn move_to(&mut self, point: Point) -> Result<(), PlatformError> {
        unsafe { SetCursorPos(point.x, point.y) }.map_err(|_| PlatformError::MoveFailed {
            x: point.x,
            y: point.y,
        })?;
        debug!("Pointer moved to ({}, {})", point.x, point.y);
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<(), PlatformError> {
        let (down, up) = match button {
            MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
            MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
        };
        send(&[mouse_input(down, 0), mouse_input(up, 0)])?;
        debug!("{:?} click", button);
        Ok(())
    }

    fn scroll(&mut self, direction: ScrollDirection, amount: u32) -> Result<(), PlatformError> {
        let flags = if direction.is_vertical() {
            MOUSEEVENTF_WHEEL
        } else {
            MOUSEEVENTF_HWHEEL
        };

        let inputs: Vec<INPUT> = wheel_deltas(direction, amount)
            .into_iter()
            .map(|delta| mouse_input(flags, delta))
            .collect();
        send(&inputs)?;
        debug!("Scrolled {:?} by {}", direction, amount);
        Ok(())
    }
}
