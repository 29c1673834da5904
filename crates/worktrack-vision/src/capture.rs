//! 스크린 캡처.
//!
//! xcap 기반 멀티모니터 열거/캡처. 모든 호출은 블로킹이다.

use tracing::debug;
use worktrack_core::error::CoreError;
use worktrack_core::models::capture::{CaptureSource, CapturedFrame, ScreenBounds, ScreenInfo};
use xcap::Monitor;

/// 스크린 캡처 — xcap 기반
pub struct ScreenCapture;

impl ScreenCapture {
    fn monitors() -> Result<Vec<Monitor>, CoreError> {
        Monitor::all().map_err(|e| CoreError::Internal(format!("모니터 목록 조회 실패: {e}")))
    }

    fn bounds_of(monitor: &Monitor) -> Result<ScreenBounds, CoreError> {
        let read = |what: &str, e: xcap::XCapError| {
            CoreError::Internal(format!("모니터 {what} 조회 실패: {e}"))
        };
        Ok(ScreenBounds {
            x: monitor.x().map_err(|e| read("x", e))?,
            y: monitor.y().map_err(|e| read("y", e))?,
            width: monitor.width().map_err(|e| read("너비", e))?,
            height: monitor.height().map_err(|e| read("높이", e))?,
        })
    }

    /// 사용 가능한 화면 목록
    ///
    /// 원점이 (0, 0)인 화면도 주 화면으로 본다.
    pub fn enumerate() -> Result<Vec<ScreenInfo>, CoreError> {
        let mut screens = Vec::new();
        for (index, monitor) in Self::monitors()?.iter().enumerate() {
            let bounds = Self::bounds_of(monitor)?;
            let name = monitor
                .name()
                .unwrap_or_else(|_| format!("Display {index}"));
            let is_primary =
                monitor.is_primary().unwrap_or(false) || (bounds.x == 0 && bounds.y == 0);
            screens.push(ScreenInfo {
                index,
                name,
                bounds,
                is_primary,
            });
        }
        Ok(screens)
    }

    /// 특정 화면 캡처
    pub fn capture(index: usize) -> Result<CapturedFrame, CoreError> {
        let monitors = Self::monitors()?;
        let total = monitors.len();
        let monitor = monitors.into_iter().nth(index).ok_or_else(|| CoreError::NotFound {
            resource_type: "Screen".to_string(),
            id: format!("{index} (전체 {total}개)"),
        })?;

        let origin = Self::bounds_of(&monitor)?;
        let image = monitor
            .capture_image()
            .map_err(|e| CoreError::Internal(format!("스크린 캡처 실패: {e}")))?;

        // HiDPI 화면은 논리 크기와 픽셀 크기가 다르므로 이미지 크기를 사용
        let bounds = ScreenBounds {
            width: image.width(),
            height: image.height(),
            ..origin
        };
        debug!("스크린 캡처 완료: 화면 {index}, {}x{}", bounds.width, bounds.height);

        Ok(CapturedFrame {
            source: CaptureSource::Screen(index),
            bounds,
            rgba: image.into_raw(),
        })
    }
}
