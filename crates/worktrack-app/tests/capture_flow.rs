//! 캡처 → 저장 → 분석 흐름 통합 테스트.

mod common;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tempfile::TempDir;

use common::{config_in, monday, pipeline, CountingAnalyzer, FakeControl};
use worktrack_app::capture_engine::{CaptureEngine, CycleOutcome};
use worktrack_app::scheduler::{JobOutcome, SchedulerJobs};
use worktrack_core::error::CoreError;
use worktrack_core::models::capture::{
    CaptureRecord, CaptureSource, CapturedFrame, NewCapture, ScreenBounds, ScreenInfo,
};
use worktrack_core::models::window::AnalysisWindow;
use worktrack_core::ports::activity::{ActivityProbe, ActivityReport};
use worktrack_core::ports::capture::ScreenCapturer;
use worktrack_core::ports::storage::CaptureStorage;
use worktrack_storage::sqlite::SqliteStorage;

/// 고정 프레임을 만들고 SQLite에 기록하는 캡처기
struct RecordingCapturer {
    storage: Arc<SqliteStorage>,
}

#[async_trait]
impl ScreenCapturer for RecordingCapturer {
    async fn enumerate_sources(&self) -> Result<Vec<ScreenInfo>, CoreError> {
        Ok(vec![ScreenInfo {
            index: 0,
            name: "내장 디스플레이".into(),
            bounds: ScreenBounds {
                x: 0,
                y: 0,
                width: 4,
                height: 4,
            },
            is_primary: true,
        }])
    }

    async fn acquire_frame(&self, index: usize) -> Result<CapturedFrame, CoreError> {
        Ok(CapturedFrame {
            source: CaptureSource::Screen(index),
            bounds: ScreenBounds {
                x: 0,
                y: 0,
                width: 4,
                height: 4,
            },
            rgba: vec![255; 64],
        })
    }

    async fn merge_frames(&self, frames: Vec<CapturedFrame>) -> Result<CapturedFrame, CoreError> {
        frames
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::NoData("병합할 프레임 없음".into()))
    }

    async fn persist_frame(
        &self,
        frame: CapturedFrame,
        captured_at: DateTime<Local>,
    ) -> Result<CaptureRecord, CoreError> {
        self.storage
            .save_capture(&NewCapture {
                timestamp: captured_at,
                source: frame.source,
                file_path: format!("/tmp/{}.jpg", captured_at.format("%H%M%S")),
                size_bytes: frame.rgba.len() as u64,
                resolution: (frame.width(), frame.height()),
            })
            .await
    }
}

struct AlwaysActive;

impl ActivityProbe for AlwaysActive {
    fn report(&self) -> ActivityReport {
        ActivityReport::active()
    }
}

#[tokio::test]
async fn gated_ticks_feed_periodic_analysis() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let engine = CaptureEngine::new(
        Arc::new(RecordingCapturer {
            storage: storage.clone(),
        }),
        Arc::new(AlwaysActive),
        config_in(&dir),
    );

    // 근무 시간 전 틱은 기록하지 않는다
    assert_eq!(engine.tick_at(monday(8, 59)).await, CycleOutcome::OutsideSchedule);
    assert_eq!(engine.tick_at(monday(9, 15)).await, CycleOutcome::Captured(1));
    assert_eq!(engine.tick_at(monday(9, 45)).await, CycleOutcome::Captured(1));
    assert_eq!(engine.last_capture(), Some(monday(9, 45)));

    let window = AnalysisWindow::new(monday(9, 0), monday(10, 0));
    assert_eq!(storage.count_captures(&window).await.unwrap(), 2);

    let analyzer = Arc::new(CountingAnalyzer::default());
    let jobs = SchedulerJobs::new(
        config_in(&dir),
        pipeline(&storage, analyzer.clone()),
        Arc::new(FakeControl::default()),
    );
    assert_matches!(
        jobs.run_periodic(monday(10, 0)).await.unwrap(),
        JobOutcome::Analyzed(_)
    );

    let stats = storage.today_stats(monday(12, 0)).unwrap();
    assert_eq!(stats.captures, 2);
    assert_eq!(stats.analyzed_captures, 2);
    assert_eq!(stats.summaries, 1);
}

#[tokio::test]
async fn double_start_keeps_engine_state() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let engine = CaptureEngine::new(
        Arc::new(RecordingCapturer { storage }),
        Arc::new(AlwaysActive),
        config_in(&dir),
    );

    engine.start().await.unwrap();
    assert_matches!(engine.start().await, Err(CoreError::StateConflict(_)));
    assert!(engine.is_running());
    assert_eq!(engine.last_capture(), None);

    engine.stop().await.unwrap();
    assert_matches!(engine.stop().await, Err(CoreError::StateConflict(_)));
}

#[tokio::test]
async fn capture_now_bypasses_schedule() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let engine = CaptureEngine::new(
        Arc::new(RecordingCapturer {
            storage: storage.clone(),
        }),
        Arc::new(AlwaysActive),
        config_in(&dir),
    );

    let records = engine.capture_now(None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].resolution, "4x4");
    assert_eq!(engine.screens().await.unwrap().len(), 1);
    assert_eq!(storage.recent_captures(10).unwrap().len(), 1);
}
