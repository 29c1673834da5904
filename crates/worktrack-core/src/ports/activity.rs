//! 머신 활동 프로브 포트.
//!
//! 구현: `worktrack-monitor` crate (플랫폼별 잠금/화면보호기 감지)

/// 활동 상태 보고
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityReport {
    /// 사용자가 화면을 사용 중인 상태 (잠금/화면보호기 아님)
    pub active: bool,
    /// 화면보호기 실행 중
    pub screensaver_running: bool,
    /// 화면 잠금 상태
    pub locked: bool,
}

impl ActivityReport {
    /// 활성 상태 보고
    pub fn active() -> Self {
        Self {
            active: true,
            screensaver_running: false,
            locked: false,
        }
    }

    /// 잠금/화면보호기 플래그로부터 보고 생성
    pub fn from_flags(screensaver_running: bool, locked: bool) -> Self {
        Self {
            active: !screensaver_running && !locked,
            screensaver_running,
            locked,
        }
    }
}

/// 머신 활동 프로브 — 캡처 틱마다 호출된다
pub trait ActivityProbe: Send + Sync {
    /// 현재 활동 상태 보고
    fn report(&self) -> ActivityReport;
}
