use crate::error::{EngineError, InjectError};
use crate::interceptor::{Interceptor, KeySink, RawKeyEvent, SyntheticInput};
use crate::keys::is_extended;
use crate::types::{Decision, KeyCode, KeyEdge};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    MapVirtualKeyW, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, MAPVK_VK_TO_VSC, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, SetWindowsHookExW,
    TranslateMessage, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT, MSG, PM_NOREMOVE,
    WH_KEYBOARD_LL, WM_KEYUP, WM_SYSKEYUP,
};

static HOOK_HANDLE: Mutex<Option<HHOOK>> = parking_lot::const_mutex(None);
static ACTIVE: RwLock<Option<Arc<Interceptor>>> = parking_lot::const_rwlock(None);

/// Keeps the hook installed. Dropping it uninstalls.
#[must_use = "the hook is removed when the guard is dropped"]
pub struct HookGuard {
    _private: (),
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        uninstall_hook();
    }
}

/// Installs the process-wide low-level keyboard hook, routing events to
/// `interceptor`. Must be called from a thread that pumps messages.
///
/// On failure remapping is disabled on the interceptor's engine.
pub fn install_hook(interceptor: Arc<Interceptor>) -> Result<HookGuard, EngineError> {
    let mut active = ACTIVE.write();
    if active.is_some() {
        return Err(EngineError::AlreadyInstalled);
    }

    info!("Installing keyboard hook...");
    let hook = unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), HINSTANCE::default(), 0) };
    let hook = match hook {
        Ok(h) if !h.is_invalid() => h,
        Ok(_) => return Err(install_failed(&interceptor, "invalid hook handle".to_string())),
        Err(e) => return Err(install_failed(&interceptor, e.to_string())),
    };

    *active = Some(interceptor);
    *HOOK_HANDLE.lock() = Some(hook);
    info!("Keyboard hook installed. Handle: {:?}", hook);
    Ok(HookGuard { _private: () })
}

fn install_failed(interceptor: &Interceptor, reason: String) -> EngineError {
    interceptor.set_enabled(false);
    error!("Keyboard hook install failed, remapping disabled: {}", reason);
    EngineError::HookInstall(reason)
}

pub fn uninstall_hook() {
    if let Some(h) = HOOK_HANDLE.lock().take() {
        unsafe {
            let _ = UnhookWindowsHookEx(h);
        };
        info!("Keyboard hook uninstalled.");
    }
    *ACTIVE.write() = None;
}

/// Pumps messages for the hook thread until `WM_QUIT`. The low-level hook
/// only fires while this thread is inside `GetMessageW`.
pub fn run_event_loop() -> Result<(), EngineError> {
    info!("Hook thread pumping messages");
    let mut msg = MSG::default();

    // A queue must exist before the first callback can be delivered.
    let _ = unsafe { PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE) };

    loop {
        match unsafe { GetMessageW(&mut msg, None, 0, 0) }.0 {
            0 => break,
            -1 => {
                let reason = windows::core::Error::from_win32().to_string();
                error!("Message loop failed: {}", reason);
                return Err(EngineError::MessageLoop(reason));
            }
            _ => unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }

    info!("Hook thread received WM_QUIT");
    Ok(())
}

unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code < 0 {
        return CallNextHookEx(None, code, wparam, lparam);
    }

    // Clone out so the slot lock is not held across injection.
    let Some(interceptor) = ACTIVE.read().clone() else {
        return CallNextHookEx(None, code, wparam, lparam);
    };

    let kbd = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
    let msg = wparam.0 as u32;
    let edge = if msg == WM_KEYUP || msg == WM_SYSKEYUP {
        KeyEdge::Up
    } else {
        KeyEdge::Down
    };

    let raw = RawKeyEvent {
        key: KeyCode::new(kbd.vkCode as u16),
        edge,
        tag: kbd.dwExtraInfo,
        t: Instant::now(),
    };

    match interceptor.on_physical_event(raw) {
        Decision::PassThrough => CallNextHookEx(None, code, wparam, lparam),
        Decision::Suppress => LRESULT(1),
    }
}

/// Injects through `SendInput`, one event per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SendInputSink;

impl KeySink for SendInputSink {
    fn send(&self, input: SyntheticInput) -> Result<(), InjectError> {
        let vk = input.key.vk();
        let scan = unsafe { MapVirtualKeyW(vk as u32, MAPVK_VK_TO_VSC) } as u16;

        let mut flags = KEYBD_EVENT_FLAGS(0);
        if is_extended(input.key) {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }
        if input.edge.is_up() {
            flags |= KEYEVENTF_KEYUP;
        }

        let event = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: scan,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: input.tag,
                },
            },
        };

        let sent = unsafe { SendInput(&[event], std::mem::size_of::<INPUT>() as i32) };
        if sent == 0 {
            return Err(InjectError::Rejected {
                key: input.key,
                reason: windows::core::Error::from_win32().to_string(),
            });
        }
        Ok(())
    }
}
