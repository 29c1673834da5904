//! 분석 결과 기록 파이프라인.
//!
//! 분석기 호출 → 요약 저장 → 마크다운 리포트 → 캡처 분석 완료 표시.
//! 스케줄러 작업, 당일 재생성, CLI `analyze`가 같은 경로를 사용한다.

use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use tracing::{info, warn};

use worktrack_core::error::CoreError;
use worktrack_core::models::summary::SummaryRecord;
use worktrack_core::models::window::AnalysisWindow;
use worktrack_core::ports::analysis::Analyzer;
use worktrack_core::ports::storage::{CaptureStorage, SummaryStorage};
use worktrack_storage::report::SummaryReportWriter;

/// 분석 API가 설정되지 않았을 때 쓰는 분석기 (항상 설정 에러)
pub struct UnavailableAnalyzer {
    reason: String,
}

impl UnavailableAnalyzer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Analyzer for UnavailableAnalyzer {
    async fn analyze(&self, _window: &AnalysisWindow) -> Result<SummaryRecord, CoreError> {
        Err(CoreError::Config(self.reason.clone()))
    }
}

/// 같은 윈도우 요약이 있을 때의 저장 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// 새로 저장 (중복이면 `Duplicate`)
    Insert,
    /// 기존 요약 대체
    Replace,
}

/// 분석 파이프라인
pub struct AnalysisPipeline {
    analyzer: Arc<dyn Analyzer>,
    captures: Arc<dyn CaptureStorage>,
    summaries: Arc<dyn SummaryStorage>,
    reports: Option<SummaryReportWriter>,
}

impl AnalysisPipeline {
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        captures: Arc<dyn CaptureStorage>,
        summaries: Arc<dyn SummaryStorage>,
    ) -> Self {
        Self {
            analyzer,
            captures,
            summaries,
            reports: None,
        }
    }

    /// 마크다운 리포트 작성기 설정
    pub fn with_reports(mut self, writer: SummaryReportWriter) -> Self {
        self.reports = Some(writer);
        self
    }

    pub fn summaries(&self) -> &Arc<dyn SummaryStorage> {
        &self.summaries
    }

    pub fn captures(&self) -> &Arc<dyn CaptureStorage> {
        &self.captures
    }

    /// 윈도우 분석 후 결과 저장 (ID가 채워진 요약 반환)
    ///
    /// 같은 윈도우 요약이 이미 있으면 분석 후 `CoreError::Duplicate`.
    pub async fn run_window(&self, window: &AnalysisWindow) -> Result<SummaryRecord, CoreError> {
        let summary = self.analyze(window).await?;
        self.record(window, summary, SaveMode::Insert).await
    }

    /// 분석기 호출만 수행 (저장 없음)
    pub async fn analyze(&self, window: &AnalysisWindow) -> Result<SummaryRecord, CoreError> {
        let mut summary = self.analyzer.analyze(window).await?;
        // 분석기가 돌려준 구간과 무관하게 요청한 윈도우를 키로 저장
        summary.start_time = window.start;
        summary.end_time = window.end;
        Ok(summary)
    }

    /// 분석 결과를 `window` 키로 저장
    ///
    /// 저장 실패는 그대로 반환한다. 리포트 작성과 분석 완료 표시는 실패해도 로그만 남긴다.
    /// 닫힌 윈도우면 끝 시각의 캡처까지 분석 완료로 표시한다.
    pub async fn record(
        &self,
        window: &AnalysisWindow,
        mut summary: SummaryRecord,
        mode: SaveMode,
    ) -> Result<SummaryRecord, CoreError> {
        summary.start_time = window.start;
        summary.end_time = window.end;
        let id = match mode {
            SaveMode::Insert => self.summaries.save_summary(&summary).await?,
            SaveMode::Replace => self.summaries.replace_summary(&summary).await?,
        };
        summary.id = Some(id);
        info!("요약 저장: {window} (id={id})");

        if let Some(writer) = &self.reports {
            if let Err(e) = writer.write(&summary, Local::now()).await {
                warn!("분석 리포트 작성 실패: {e}");
            }
        }

        if let Err(e) = self.mark_window_analyzed(window).await {
            warn!("캡처 분석 완료 표시 실패: {e}");
        }

        Ok(summary)
    }

    /// 캡처 없는 구간의 자리표시 요약 저장 (분석기 호출 없음)
    pub async fn save_placeholder(&self, window: &AnalysisWindow) -> Result<SummaryRecord, CoreError> {
        let mut summary = SummaryRecord::placeholder(*window);
        let id = self.summaries.save_summary(&summary).await?;
        summary.id = Some(id);
        Ok(summary)
    }

    async fn mark_window_analyzed(&self, window: &AnalysisWindow) -> Result<(), CoreError> {
        let ids: Vec<i64> = self
            .captures
            .get_captures(window)
            .await?
            .iter()
            .map(|c| c.id)
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        self.captures.mark_analyzed(&ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{DateTime, TimeZone};
    use tempfile::TempDir;
    use worktrack_core::models::capture::{CaptureSource, NewCapture};
    use worktrack_core::models::summary::Activity;
    use worktrack_storage::sqlite::SqliteStorage;

    struct FixedAnalyzer;

    #[async_trait]
    impl Analyzer for FixedAnalyzer {
        async fn analyze(&self, window: &AnalysisWindow) -> Result<SummaryRecord, CoreError> {
            let mut summary = SummaryRecord::new(*window, "1.문서 작성;");
            summary.activities.push(Activity {
                name: "문서".to_string(),
                duration_minutes: 40,
                apps: vec!["Word".to_string()],
                category: "문서".to_string(),
            });
            Ok(summary)
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 15, h, m, 0).unwrap()
    }

    async fn seed(storage: &SqliteStorage, ts: DateTime<Local>) {
        storage
            .save_capture(&NewCapture {
                timestamp: ts,
                source: CaptureSource::Screen(0),
                file_path: "a.jpg".to_string(),
                size_bytes: 1,
                resolution: (1, 1),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn run_window_persists_and_marks() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        seed(&storage, at(9, 10)).await;
        seed(&storage, at(10, 10)).await;

        let pipeline = AnalysisPipeline::new(
            Arc::new(FixedAnalyzer),
            storage.clone(),
            storage.clone(),
        )
        .with_reports(SummaryReportWriter::new(dir.path()));

        let window = AnalysisWindow::new(at(9, 0), at(10, 0));
        let summary = pipeline.run_window(&window).await.unwrap();
        assert!(summary.id.is_some());
        assert!(storage.has_summary(&window).await.unwrap());

        let stats = storage.today_stats(at(12, 0)).unwrap();
        assert_eq!(stats.analyzed_captures, 1);

        let reports: Vec<_> = std::fs::read_dir(dir.path().join("summaries"))
            .unwrap()
            .collect();
        assert_eq!(reports.len(), 1);

        // 같은 윈도우 재저장은 중복
        assert_matches!(
            pipeline.run_window(&window).await,
            Err(CoreError::Duplicate(_))
        );
    }

    #[tokio::test]
    async fn replace_mode_supersedes_window() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        seed(&storage, at(9, 30)).await;
        let pipeline = AnalysisPipeline::new(
            Arc::new(FixedAnalyzer),
            storage.clone(),
            storage.clone(),
        );

        let window = AnalysisWindow::new(at(9, 0), at(18, 0));
        let first = pipeline.run_window(&window).await.unwrap();

        let summary = pipeline.analyze(&window).await.unwrap();
        assert_eq!(summary.total_activity_minutes(), 40);
        assert!(summary.id.is_none());
        let second = pipeline.record(&window, summary, SaveMode::Replace).await.unwrap();
        assert_ne!(first.id, second.id);

        let stored = storage.get_summaries(at(0, 0), at(23, 0)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, second.id);
    }

    #[tokio::test]
    async fn placeholder_skips_analyzer() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let pipeline = AnalysisPipeline::new(
            Arc::new(UnavailableAnalyzer::new("API 키 없음")),
            storage.clone(),
            storage.clone(),
        );

        let window = AnalysisWindow::new(at(13, 0), at(14, 0));
        let summary = pipeline.save_placeholder(&window).await.unwrap();
        assert!(summary.is_placeholder());
        assert!(storage.has_summary(&window).await.unwrap());

        let other = AnalysisWindow::new(at(14, 0), at(15, 0));
        assert_matches!(pipeline.run_window(&other).await, Err(CoreError::Config(_)));
        assert!(!storage.has_summary(&other).await.unwrap());
    }
}
