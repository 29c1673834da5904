//! 캡처 협력자 포트.
//!
//! 구현: `worktrack-vision` crate (xcap, image, fast_image_resize)

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::CoreError;
use crate::models::capture::{CaptureRecord, CapturedFrame, ScreenInfo};

/// 화면 획득 + 저장
#[async_trait]
pub trait ScreenCapturer: Send + Sync {
    /// 사용 가능한 화면 목록
    async fn enumerate_sources(&self) -> Result<Vec<ScreenInfo>, CoreError>;

    /// 지정 화면 한 장 획득
    async fn acquire_frame(&self, index: usize) -> Result<CapturedFrame, CoreError>;

    /// 여러 화면을 바운딩 박스 캔버스 한 장으로 병합
    async fn merge_frames(&self, frames: Vec<CapturedFrame>) -> Result<CapturedFrame, CoreError>;

    /// 프레임을 인코딩/파일 저장 후 캡처 레코드로 기록
    async fn persist_frame(
        &self,
        frame: CapturedFrame,
        captured_at: DateTime<Local>,
    ) -> Result<CaptureRecord, CoreError>;
}
