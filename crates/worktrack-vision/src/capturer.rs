//! `ScreenCapturer` 포트 구현.
//!
//! 블로킹 작업(xcap 획득, 병합, 인코딩)은 `spawn_blocking`에서 실행한다.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::debug;
use worktrack_core::config::CaptureConfig;
use worktrack_core::error::CoreError;
use worktrack_core::models::capture::{CaptureRecord, CapturedFrame, NewCapture, ScreenInfo};
use worktrack_core::ports::capture::ScreenCapturer;
use worktrack_core::ports::storage::CaptureStorage;
use worktrack_storage::screenshot_storage::ScreenshotFileStorage;

use crate::capture::ScreenCapture;
use crate::encoder::encode_jpeg;
use crate::merge::compose;

async fn blocking<T, F>(what: &'static str, f: F) -> Result<T, CoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoreError::Internal(format!("{what} 태스크 실패: {e}")))?
}

/// xcap 기반 화면 캡처 + 파일/레코드 저장
pub struct XcapScreenCapturer {
    storage: Arc<dyn CaptureStorage>,
    files: ScreenshotFileStorage,
    jpeg_quality: u8,
    max_width: u32,
    max_height: u32,
}

impl XcapScreenCapturer {
    pub fn new(
        storage: Arc<dyn CaptureStorage>,
        files: ScreenshotFileStorage,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            storage,
            files,
            jpeg_quality: config.jpeg_quality,
            max_width: config.max_width,
            max_height: config.max_height,
        }
    }
}

#[async_trait]
impl ScreenCapturer for XcapScreenCapturer {
    async fn enumerate_sources(&self) -> Result<Vec<ScreenInfo>, CoreError> {
        blocking("화면 열거", ScreenCapture::enumerate).await
    }

    async fn acquire_frame(&self, index: usize) -> Result<CapturedFrame, CoreError> {
        blocking("화면 캡처", move || ScreenCapture::capture(index)).await
    }

    async fn merge_frames(&self, frames: Vec<CapturedFrame>) -> Result<CapturedFrame, CoreError> {
        blocking("화면 병합", move || compose(&frames)).await
    }

    async fn persist_frame(
        &self,
        frame: CapturedFrame,
        captured_at: DateTime<Local>,
    ) -> Result<CaptureRecord, CoreError> {
        let source = frame.source;
        let (quality, max_w, max_h) = (self.jpeg_quality, self.max_width, self.max_height);
        let encoded =
            blocking("JPEG 인코딩", move || encode_jpeg(frame, quality, max_w, max_h)).await?;

        let path = self.files.save(source, &captured_at, &encoded.bytes).await?;

        let record = self
            .storage
            .save_capture(&NewCapture {
                timestamp: captured_at,
                source,
                file_path: path.display().to_string(),
                size_bytes: encoded.bytes.len() as u64,
                resolution: (encoded.width, encoded.height),
            })
            .await?;

        debug!(
            "스크린샷 기록: id={}, {} ({:.1}KB)",
            record.id,
            record.file_path,
            record.size_bytes as f64 / 1024.0
        );
        Ok(record)
    }
}
