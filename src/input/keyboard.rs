//! Global keyboard capture
//!
//! A low-level keyboard hook on its own thread turns key presses into
//! [`Command`]s and forwards them over a channel to the event loop.
//! Critical threading requirements:
//! - The hook callback runs on the hook thread, inside its message loop
//! - The hook never touches navigation state, it only sends commands
//! - Keys that resolve to a command are swallowed, everything else
//!   reaches the focused application

use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
    TranslateMessage, UnhookWindowsHookEx, KBDLLHOOKSTRUCT, LLKHF_INJECTED, MSG, WH_KEYBOARD_LL,
    WM_KEYDOWN, WM_QUIT, WM_SYSKEYDOWN,
};

use crate::app::state::{Command, SharedNavState};
use crate::input::hotkeys::{HotkeyModifier, KeyBindings, KeyChord};

/// Errors that can occur during keyboard capture
#[derive(Debug, thiserror::Error)]
pub enum KeyboardCaptureError {
    #[error("Failed to install keyboard hook")]
    HookInstallationFailed,
    #[error("Keyboard hook thread exited before reporting")]
    ThreadStartFailed,
    #[error("Thread join failed")]
    ThreadJoinFailed,
}

struct HookState {
    bindings: KeyBindings,
    nav_state: SharedNavState,
    sender: Sender<Command>,
}

thread_local! {
    static HOOK_STATE: RefCell<Option<HookState>> = const { RefCell::new(None) };
}

/// Running keyboard hook; uninstalled on drop
pub struct KeyboardHook {
    thread_handle: Option<JoinHandle<()>>,
    thread_id: Arc<AtomicU32>,
}

impl KeyboardHook {
    /// Installs the hook on a dedicated thread
    ///
    /// # Arguments
    /// * `bindings` - Chord table used to resolve key presses
    /// * `nav_state` - Navigation state mirrored by the event loop
    /// * `sender` - Where resolved commands go
    pub fn start(
        bindings: KeyBindings,
        nav_state: SharedNavState,
        sender: Sender<Command>,
    ) -> Result<Self, KeyboardCaptureError> {
        let thread_id = Arc::new(AtomicU32::new(0));
        let thread_id_for_hook = Arc::clone(&thread_id);
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            thread_id_for_hook.store(unsafe { GetCurrentThreadId() }, Ordering::SeqCst);
            HOOK_STATE.with(|state| {
                *state.borrow_mut() = Some(HookState {
                    bindings,
                    nav_state,
                    sender,
                });
            });

            let hook = unsafe {
                GetModuleHandleW(None).and_then(|module| {
                    SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), module, 0)
                })
            };
            let hook = match hook {
                Ok(hook) => {
                    let _ = ready_tx.send(Ok(()));
                    hook
                }
                Err(e) => {
                    warn!("SetWindowsHookExW failed: {}", e);
                    let _ = ready_tx.send(Err(KeyboardCaptureError::HookInstallationFailed));
                    return;
                }
            };

            let mut msg = MSG::default();
            loop {
                let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
                // 0 = WM_QUIT, -1 = error
                if result.0 == 0 || result.0 == -1 {
                    break;
                }
                unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }

            unsafe {
                let _ = UnhookWindowsHookEx(hook);
            }
            HOOK_STATE.with(|state| state.borrow_mut().take());
            debug!("Keyboard hook thread exited");
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("Keyboard hook installed");
                Ok(Self {
                    thread_handle: Some(handle),
                    thread_id,
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => Err(KeyboardCaptureError::ThreadStartFailed),
        }
    }

    /// Stops the hook thread
    pub fn stop(&mut self) -> Result<(), KeyboardCaptureError> {
        let Some(handle) = self.thread_handle.take() else {
            return Ok(());
        };

        let thread_id = self.thread_id.load(Ordering::SeqCst);
        unsafe {
            let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
        handle
            .join()
            .map_err(|_| KeyboardCaptureError::ThreadJoinFailed)
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle.is_some()
    }
}

impl Drop for KeyboardHook {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn key_down(vk: u16) -> bool {
    (unsafe { GetAsyncKeyState(i32::from(vk)) } as u16) & 0x8000 != 0
}

/// Builds the chord for `vk` from the modifiers currently held
fn current_chord(vk: u32) -> KeyChord {
    let mut modifiers = Vec::with_capacity(4);
    if key_down(VK_CONTROL.0) {
        modifiers.push(HotkeyModifier::Control);
    }
    if key_down(VK_SHIFT.0) {
        modifiers.push(HotkeyModifier::Shift);
    }
    if key_down(VK_MENU.0) {
        modifiers.push(HotkeyModifier::Alt);
    }
    if key_down(VK_LWIN.0) || key_down(VK_RWIN.0) {
        modifiers.push(HotkeyModifier::Windows);
    }
    KeyChord::new(&modifiers, vk)
}

fn is_modifier_key(vk: u32) -> bool {
    matches!(vk, 0x10..=0x12 | 0x5B | 0x5C | 0xA0..=0xA5)
}

fn call_next_hook(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}

/// Low-level keyboard hook procedure
///
/// Must return quickly: it only resolves the chord and sends a command.
unsafe extern "system" fn keyboard_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code < 0 {
        return call_next_hook(code, wparam, lparam);
    }

    if wparam.0 != WM_KEYDOWN as usize && wparam.0 != WM_SYSKEYDOWN as usize {
        return call_next_hook(code, wparam, lparam);
    }

    let data = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
    if data.flags.0 & LLKHF_INJECTED.0 != 0 || is_modifier_key(data.vkCode) {
        return call_next_hook(code, wparam, lparam);
    }

    let chord = current_chord(data.vkCode);
    let consumed = HOOK_STATE.with(|state| {
        let state = state.borrow();
        let Some(state) = state.as_ref() else {
            return false;
        };

        match state.bindings.resolve(chord, state.nav_state.load()) {
            Some(command) => {
                debug!("Key {} -> {:?}", chord, command);
                state.sender.send(command).is_ok()
            }
            None => false,
        }
    });

    if consumed {
        LRESULT(1)
    } else {
        call_next_hook(code, wparam, lparam)
    }
}
