//! 로컬 저장소 포트.
//!
//! 구현: `worktrack-storage` crate (rusqlite)

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::CoreError;
use crate::models::capture::{CaptureRecord, NewCapture};
use crate::models::summary::SummaryRecord;
use crate::models::window::AnalysisWindow;

/// 캡처 레코드 저장소
#[async_trait]
pub trait CaptureStorage: Send + Sync {
    /// 캡처 레코드 저장
    async fn save_capture(&self, capture: &NewCapture) -> Result<CaptureRecord, CoreError>;

    /// 윈도우 안의 캡처 조회 (시각 오름차순)
    async fn get_captures(&self, window: &AnalysisWindow) -> Result<Vec<CaptureRecord>, CoreError>;

    /// 윈도우 안의 캡처 수
    async fn count_captures(&self, window: &AnalysisWindow) -> Result<usize, CoreError>;

    /// 캡처를 분석 완료로 마킹
    async fn mark_analyzed(&self, ids: &[i64]) -> Result<(), CoreError>;

    /// 기준 시각 이전 캡처와 파일 삭제, 삭제된 레코드 수 반환
    async fn purge_captures_before(&self, cutoff: DateTime<Local>) -> Result<usize, CoreError>;
}

/// 요약 레코드 저장소
#[async_trait]
pub trait SummaryStorage: Send + Sync {
    /// 요약 저장, 새 ID 반환
    ///
    /// 같은 `(start_time, end_time)` 요약이 이미 있으면 `CoreError::Duplicate`.
    async fn save_summary(&self, summary: &SummaryRecord) -> Result<i64, CoreError>;

    /// 같은 `(start_time, end_time)` 요약을 지우고 새로 저장, 새 ID 반환
    ///
    /// 삭제와 저장은 한 트랜잭션으로 처리한다.
    async fn replace_summary(&self, summary: &SummaryRecord) -> Result<i64, CoreError>;

    /// 정확히 같은 `(start, end)` 요약 존재 여부
    async fn has_summary(&self, window: &AnalysisWindow) -> Result<bool, CoreError>;

    /// 시작 시각이 `[from, to)`인 요약 조회 (시작 시각 오름차순)
    async fn get_summaries(
        &self,
        from: DateTime<Local>,
        to: DateTime<Local>,
    ) -> Result<Vec<SummaryRecord>, CoreError>;

    /// 시작 시각이 `[from, to)`인 요약 삭제, 삭제 수 반환
    async fn delete_summaries_between(
        &self,
        from: DateTime<Local>,
        to: DateTime<Local>,
    ) -> Result<usize, CoreError>;
}
