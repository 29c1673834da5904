//! 스크린샷 이미지 파일 저장소.
//!
//! 인코딩된 JPEG 바이트를 일자별 폴더에 저장한다.
//! 구조: `<base_dir>/screenshots/YYYY-MM-DD/screenshot_{N|merged}_{YYYYMMDD_HHMMSS}_{NNN}.jpg`

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::fs;
use tracing::{debug, info};
use worktrack_core::error::CoreError;
use worktrack_core::models::capture::CaptureSource;

/// 스크린샷 하위 디렉토리 이름
const SCREENSHOT_DIR: &str = "screenshots";

/// 스크린샷 파일 저장소
pub struct ScreenshotFileStorage {
    /// `<base_dir>/screenshots`
    root: PathBuf,
    /// 같은 초 안의 파일명 충돌 방지 카운터
    file_counter: AtomicU32,
}

impl ScreenshotFileStorage {
    /// 새 스크린샷 저장소 생성 (디렉토리 생성 포함)
    pub async fn new(base_dir: &Path) -> Result<Self, CoreError> {
        let root = base_dir.join(SCREENSHOT_DIR);
        fs::create_dir_all(&root)
            .await
            .map_err(|e| CoreError::Internal(format!("스크린샷 디렉토리 생성 실패: {e}")))?;

        info!("스크린샷 저장소 초기화: {}", root.display());

        Ok(Self {
            root,
            file_counter: AtomicU32::new(0),
        })
    }

    /// 저장 루트 (`<base_dir>/screenshots`)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 파일 이름 생성
    pub fn file_name(source: CaptureSource, timestamp: &DateTime<Local>, counter: u32) -> String {
        let label = match source {
            CaptureSource::Screen(i) => i.to_string(),
            CaptureSource::Merged => "merged".to_string(),
        };
        format!(
            "screenshot_{label}_{}_{:03}.jpg",
            timestamp.format("%Y%m%d_%H%M%S"),
            counter % 1000
        )
    }

    /// JPEG 바이트 저장, 전체 경로 반환
    pub async fn save(
        &self,
        source: CaptureSource,
        timestamp: &DateTime<Local>,
        jpeg: &[u8],
    ) -> Result<PathBuf, CoreError> {
        let day_dir = self.root.join(timestamp.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&day_dir)
            .await
            .map_err(|e| CoreError::Internal(format!("일자 폴더 생성 실패: {e}")))?;

        let counter = self.file_counter.fetch_add(1, Ordering::SeqCst);
        let path = day_dir.join(Self::file_name(source, timestamp, counter));

        fs::write(&path, jpeg)
            .await
            .map_err(|e| CoreError::Internal(format!("스크린샷 파일 저장 실패: {e}")))?;

        debug!("스크린샷 저장: {} ({}bytes)", path.display(), jpeg.len());
        Ok(path)
    }

    /// 비어 있는 일자 폴더 삭제, 삭제한 폴더 수 반환
    pub async fn prune_empty_day_dirs(&self) -> Result<usize, CoreError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| CoreError::Internal(format!("스크린샷 디렉토리 읽기 실패: {e}")))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CoreError::Internal(format!("디렉토리 항목 읽기 실패: {e}")))?
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            // 비어 있지 않으면 remove_dir가 실패하므로 그대로 둔다
            if fs::remove_dir(&path).await.is_ok() {
                debug!("빈 일자 폴더 삭제: {}", path.display());
                removed += 1;
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn file_name_format() {
        let t = Local.with_ymd_and_hms(2026, 6, 15, 9, 3, 7).unwrap();
        assert_eq!(
            ScreenshotFileStorage::file_name(CaptureSource::Screen(1), &t, 7),
            "screenshot_1_20260615_090307_007.jpg"
        );
        assert_eq!(
            ScreenshotFileStorage::file_name(CaptureSource::Merged, &t, 1002),
            "screenshot_merged_20260615_090307_002.jpg"
        );
    }

    #[tokio::test]
    async fn save_into_day_dir() {
        let dir = TempDir::new().unwrap();
        let storage = ScreenshotFileStorage::new(dir.path()).await.unwrap();
        let t = Local.with_ymd_and_hms(2026, 6, 15, 9, 3, 7).unwrap();

        let a = storage.save(CaptureSource::Screen(0), &t, b"a").await.unwrap();
        let b = storage.save(CaptureSource::Screen(0), &t, b"b").await.unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with(dir.path().join("screenshots").join("2026-06-15")));
        assert_eq!(std::fs::read(&b).unwrap(), b"b");
    }

    #[tokio::test]
    async fn prune_keeps_non_empty_dirs() {
        let dir = TempDir::new().unwrap();
        let storage = ScreenshotFileStorage::new(dir.path()).await.unwrap();
        let t = Local.with_ymd_and_hms(2026, 6, 15, 9, 0, 0).unwrap();
        let kept = storage.save(CaptureSource::Merged, &t, b"x").await.unwrap();
        std::fs::create_dir_all(storage.root().join("2026-05-01")).unwrap();

        assert_eq!(storage.prune_empty_day_dirs().await.unwrap(), 1);
        assert!(kept.exists());
        assert!(!storage.root().join("2026-05-01").exists());
    }
}
