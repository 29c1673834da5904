//! 캡처 제어 포트.
//!
//! `CaptureEngine`이 구현하고 `AnalysisScheduler`의 자동 시작/정지 작업이 사용한다.

use async_trait::async_trait;

use crate::error::CoreError;

/// 캡처 루프 시작/정지 제어
#[async_trait]
pub trait CaptureControl: Send + Sync {
    /// 캡처 루프 시작 (실행 중이면 `StateConflict`)
    async fn start(&self) -> Result<(), CoreError>;

    /// 캡처 루프 정지 (정지 상태면 `StateConflict`)
    async fn stop(&self) -> Result<(), CoreError>;

    /// 실행 중 여부
    fn is_running(&self) -> bool;
}
