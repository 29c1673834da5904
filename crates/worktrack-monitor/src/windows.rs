//! Windows 플랫폼 — 화면보호기/잠금 감지.
//!
//! `SystemParametersInfoW(SPI_GETSCREENSAVERRUNNING)` + 전경 창 클래스 이름 기반.

#![cfg(target_os = "windows")]

use tracing::debug;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    GetClassNameW, GetForegroundWindow, SystemParametersInfoW, SPI_GETSCREENSAVERRUNNING,
};

/// 잠금 화면이 전경일 때의 창 클래스
const LOCK_SCREEN_CLASSES: [&str; 3] = [
    "Windows.UI.Core.CoreWindow",
    "LockScreenBackstopFrame",
    "SessionSwitchWindow",
];

/// 화면보호기 실행 여부 (조회 실패 시 false)
pub fn screensaver_running() -> bool {
    let mut running: i32 = 0;
    let ok = unsafe {
        SystemParametersInfoW(
            SPI_GETSCREENSAVERRUNNING,
            0,
            &mut running as *mut i32 as *mut core::ffi::c_void,
            0,
        )
    };
    ok != 0 && running != 0
}

/// 화면 잠금 여부
///
/// 전경 창이 없거나 잠금 화면 클래스이면 잠금으로 본다.
pub fn screen_locked() -> bool {
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.is_null() {
            debug!("전경 창 없음 → 잠금으로 판단");
            return true;
        }

        let mut class_buf = [0u16; 256];
        let len = GetClassNameW(hwnd, class_buf.as_mut_ptr(), class_buf.len() as i32);
        if len <= 0 {
            return false;
        }
        is_lock_screen_class(&String::from_utf16_lossy(&class_buf[..len as usize]))
    }
}

fn is_lock_screen_class(class_name: &str) -> bool {
    LOCK_SCREEN_CLASSES.contains(&class_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_classes() {
        assert!(is_lock_screen_class("LockScreenBackstopFrame"));
        assert!(!is_lock_screen_class("Chrome_WidgetWin_1"));
    }
}
