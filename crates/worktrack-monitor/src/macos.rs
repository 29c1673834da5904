//! macOS 플랫폼 — 화면보호기/디스플레이 절전 감지.
//!
//! 화면보호기는 `ScreenSaverEngine` 프로세스 존재로, 잠금은 주 디스플레이 절전 상태로 판단한다.

use core_graphics::display::CGDisplay;
use sysinfo::{ProcessesToUpdate, System};

/// 화면보호기 프로세스 이름
const SCREENSAVER_PROCESS: &str = "ScreenSaverEngine";

/// 화면보호기 실행 여부
pub fn screensaver_running() -> bool {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);
    sys.processes()
        .values()
        .any(|p| p.name().to_string_lossy() == SCREENSAVER_PROCESS)
}

/// 주 디스플레이 절전 여부
pub fn display_asleep() -> bool {
    CGDisplay::main().is_asleep()
}
