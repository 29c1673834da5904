//! 당일 요약 재생성.
//!
//! 오늘 캡처 시각들을 분석 간격 경계(첫 캡처 시각의 정각 기준)로 나눠
//! 빈틈 없는 세그먼트 목록을 만들고, 오늘 요약을 모두 지운 뒤 세그먼트마다 다시 기록한다.
//! 원자적이지 않다: 중간 실패 시 이미 기록된 세그먼트는 남는다.

use chrono::{DateTime, Duration, Local};
use std::sync::Arc;
use tracing::{info, warn};

use worktrack_core::config_manager::ConfigManager;
use worktrack_core::error::CoreError;
use worktrack_core::models::summary::SummaryRecord;
use worktrack_core::models::window::AnalysisWindow;
use worktrack_core::schedule::{hour_floor, start_of_day};

use crate::analysis::AnalysisPipeline;

/// 재생성 세그먼트
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub window: AnalysisWindow,
    /// 구간 안에 캡처가 하나라도 있는지
    pub has_data: bool,
}

/// 캡처 시각 → 경계 정렬 세그먼트
///
/// 첫 세그먼트는 첫 캡처 시각에서 시작하고, 이후 경계는 `floor_hour(first) + k * interval`.
/// 마지막 세그먼트는 마지막 캡처 시각을 포함하는 닫힌 구간이며,
/// 마지막 캡처가 경계와 같으면 거기서 끝난다 (길이 0 세그먼트 없음).
pub fn plan_segments(timestamps: &[DateTime<Local>], interval: Duration) -> Vec<Segment> {
    let step = interval.num_milliseconds();
    let (Some(&first), Some(&last)) = (timestamps.iter().min(), timestamps.iter().max()) else {
        return Vec::new();
    };
    if step <= 0 {
        return Vec::new();
    }

    let anchor = hour_floor(&first);
    let mut segments = Vec::new();
    let mut seg_start = first;

    loop {
        let elapsed = (seg_start - anchor).num_milliseconds();
        let next = anchor + Duration::milliseconds((elapsed / step + 1) * step);

        let window = if next >= last {
            AnalysisWindow::closed(seg_start, last)
        } else {
            AnalysisWindow::new(seg_start, next)
        };
        let has_data = timestamps.iter().any(|t| window.contains(t));
        segments.push(Segment { window, has_data });

        if next >= last {
            break;
        }
        seg_start = next;
    }
    segments
}

/// 재생성 결과 — 기록된 요약 목록과 중단 원인
#[derive(Debug)]
pub struct RegenerationReport {
    pub segments: Vec<Segment>,
    pub written: Vec<SummaryRecord>,
    /// 기록 도중 실패했다면 그 에러 (앞선 세그먼트 결과는 남아 있음)
    pub error: Option<CoreError>,
}

impl RegenerationReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// 중단 원인이 있으면 에러로 변환
    pub fn into_result(self) -> Result<Vec<SummaryRecord>, CoreError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.written),
        }
    }
}

/// 당일 재생성기
pub struct SegmentPlanner {
    config: ConfigManager,
    pipeline: Arc<AnalysisPipeline>,
}

impl SegmentPlanner {
    pub fn new(config: ConfigManager, pipeline: Arc<AnalysisPipeline>) -> Self {
        Self { config, pipeline }
    }

    /// 오늘 `[00:00, now)` 요약을 처음부터 다시 만든다
    ///
    /// 기록 전 단계(캡처 없음, 설정 오류)의 실패는 `Err`로, 기록 중 실패는 보고서의 `error`로 반환한다.
    pub async fn regenerate_today(
        &self,
        now: DateTime<Local>,
    ) -> Result<RegenerationReport, CoreError> {
        let interval = self.config.get().schedule.analysis_interval()?;
        let day_start = start_of_day(now.date_naive())?;
        let day_end = day_start + Duration::days(1);

        let captures = self
            .pipeline
            .captures()
            .get_captures(&AnalysisWindow::new(day_start, now))
            .await?;
        if captures.is_empty() {
            return Err(CoreError::NoData("오늘 캡처가 없습니다".into()));
        }

        let timestamps: Vec<DateTime<Local>> = captures.iter().map(|c| c.timestamp).collect();
        let segments = plan_segments(&timestamps, interval);
        info!(
            "당일 재생성: 캡처 {}개, 세그먼트 {}개",
            captures.len(),
            segments.len()
        );

        let mut report = RegenerationReport {
            segments,
            written: Vec::new(),
            error: None,
        };

        match self
            .pipeline
            .summaries()
            .delete_summaries_between(day_start, day_end)
            .await
        {
            Ok(deleted) => info!("기존 요약 {deleted}개 삭제"),
            Err(e) => {
                report.error = Some(e);
                return Ok(report);
            }
        }

        for segment in report.segments.clone() {
            let result = if segment.has_data {
                self.pipeline.run_window(&segment.window).await
            } else {
                self.pipeline.save_placeholder(&segment.window).await
            };

            match result {
                Ok(summary) => report.written.push(summary),
                Err(e) => {
                    warn!("세그먼트 {} 기록 실패, 재생성 중단: {e}", segment.window);
                    report.error = Some(e);
                    break;
                }
            }
        }

        Ok(report)
    }
}
