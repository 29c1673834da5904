//! 통합 테스트 공용 가짜 구현.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use worktrack_app::analysis::AnalysisPipeline;
use worktrack_core::config_manager::ConfigManager;
use worktrack_core::error::CoreError;
use worktrack_core::models::capture::{CaptureSource, NewCapture};
use worktrack_core::models::summary::{Activity, SummaryRecord};
use worktrack_core::models::window::AnalysisWindow;
use worktrack_core::ports::analysis::Analyzer;
use worktrack_core::ports::control::CaptureControl;
use worktrack_core::ports::storage::CaptureStorage;
use worktrack_storage::sqlite::SqliteStorage;

/// 2026-06-15 (월요일) 시각
pub fn monday(h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 6, 15, h, m, 0).unwrap()
}

/// 호출 횟수를 세는 분석기 (`fail_on`번째 호출은 실패)
#[derive(Default)]
pub struct CountingAnalyzer {
    pub calls: AtomicUsize,
    pub fail_on: Option<usize>,
}

impl CountingAnalyzer {
    pub fn failing_on(call: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(call),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for CountingAnalyzer {
    async fn analyze(&self, window: &AnalysisWindow) -> Result<SummaryRecord, CoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(call) {
            return Err(CoreError::Network("분석 API 타임아웃".into()));
        }
        let mut summary = SummaryRecord::new(*window, format!("1.작업 {call};"));
        summary.activities.push(Activity {
            name: "개발".into(),
            duration_minutes: 30,
            apps: vec!["VS Code".into()],
            category: "개발".into(),
        });
        summary.activities.push(Activity {
            name: "회의".into(),
            duration_minutes: 15,
            apps: vec!["Zoom".into()],
            category: "커뮤니케이션".into(),
        });
        Ok(summary)
    }
}

/// 시작/정지 호출만 기록하는 캡처 제어
#[derive(Default)]
pub struct FakeControl {
    pub running: AtomicBool,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

#[async_trait]
impl CaptureControl for FakeControl {
    async fn start(&self) -> Result<(), CoreError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CoreError::StateConflict("running".into()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), CoreError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(CoreError::StateConflict("stopped".into()));
        }
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// 임시 디렉토리 설정 관리자
pub fn config_in(dir: &TempDir) -> ConfigManager {
    ConfigManager::with_path(dir.path().join("config.json")).unwrap()
}

pub fn pipeline(
    storage: &Arc<SqliteStorage>,
    analyzer: Arc<CountingAnalyzer>,
) -> Arc<AnalysisPipeline> {
    Arc::new(AnalysisPipeline::new(
        analyzer,
        storage.clone(),
        storage.clone(),
    ))
}

/// 캡처 레코드 저장 (파일 없음)
pub async fn seed_capture(storage: &SqliteStorage, ts: DateTime<Local>) -> i64 {
    seed_capture_file(storage, ts, format!("{}.jpg", ts.format("%H%M%S"))).await
}

pub async fn seed_capture_file(storage: &SqliteStorage, ts: DateTime<Local>, path: String) -> i64 {
    storage
        .save_capture(&NewCapture {
            timestamp: ts,
            source: CaptureSource::Screen(0),
            file_path: path,
            size_bytes: 10,
            resolution: (1920, 1080),
        })
        .await
        .unwrap()
        .id
}
