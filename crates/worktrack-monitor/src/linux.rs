//! Linux 플랫폼 — 세션 잠금/잠금 화면 프로세스 감지.
//!
//! 세션 잠금은 systemd-logind의 `LockedHint`로 판단하고,
//! 화면보호기는 알려진 잠금 화면 프로세스 존재로 판단한다.

use std::process::Command;
use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

/// 실행 중이면 화면이 가려진 상태로 보는 잠금 화면 프로세스
const LOCKER_PROCESSES: [&str; 6] = [
    "swaylock",
    "hyprlock",
    "i3lock",
    "xsecurelock",
    "slock",
    "gnome-screensaver-dialog",
];

/// 세션 잠금 여부 (loginctl 조회 실패 시 false)
pub fn session_locked() -> bool {
    let session = std::env::var("XDG_SESSION_ID").unwrap_or_else(|_| "self".to_string());

    match Command::new("loginctl")
        .args(["show-session", &session, "-p", "LockedHint"])
        .output()
    {
        Ok(output) if output.status.success() => {
            parse_locked_hint(&String::from_utf8_lossy(&output.stdout)).unwrap_or(false)
        }
        Ok(output) => {
            debug!("loginctl 실패: {}", String::from_utf8_lossy(&output.stderr).trim());
            false
        }
        Err(e) => {
            debug!("loginctl 실행 불가: {e}");
            false
        }
    }
}

/// 잠금 화면 프로세스 실행 여부
pub fn locker_running() -> bool {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);
    sys.processes()
        .values()
        .any(|p| is_locker_process(&p.name().to_string_lossy()))
}

/// `LockedHint=yes` 형식 파싱
fn parse_locked_hint(output: &str) -> Option<bool> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("LockedHint="))
        .map(|value| value.trim() == "yes")
}

fn is_locker_process(name: &str) -> bool {
    LOCKER_PROCESSES.contains(&name)
}
