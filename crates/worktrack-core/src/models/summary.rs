//! 작업 요약 모델.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::window::AnalysisWindow;

/// 캡처가 없는 세그먼트에 기록하는 고정 요약 문구
pub const PLACEHOLDER_SUMMARY: &str = "캡처 내용 없음";

/// 활동 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// 활동 이름
    pub name: String,
    /// 소요 시간 (분)
    #[serde(default)]
    pub duration_minutes: u32,
    /// 사용한 앱 목록
    #[serde(default)]
    pub apps: Vec<String>,
    /// 활동 분류 (개발, 문서, 커뮤니케이션 등)
    #[serde(default)]
    pub category: String,
}

/// 한 분석 윈도우에 대한 요약 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// 레코드 ID (저장 전에는 None)
    #[serde(default)]
    pub id: Option<i64>,
    /// 구간 시작
    pub start_time: DateTime<Local>,
    /// 구간 종료
    pub end_time: DateTime<Local>,
    /// 요약 본문
    pub summary: String,
    /// 활동 목록 (순서 유지)
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// 앱 이름 → 사용 시간(분)
    #[serde(default)]
    pub app_usage: BTreeMap<String, u32>,
    /// 생성 시각
    pub created_at: DateTime<Local>,
}

impl SummaryRecord {
    /// 빈 활동/사용량으로 새 요약 생성
    pub fn new(window: AnalysisWindow, summary: impl Into<String>) -> Self {
        Self {
            id: None,
            start_time: window.start,
            end_time: window.end,
            summary: summary.into(),
            activities: Vec::new(),
            app_usage: BTreeMap::new(),
            created_at: Local::now(),
        }
    }

    /// 캡처 없는 구간용 자리표시 요약
    pub fn placeholder(window: AnalysisWindow) -> Self {
        Self::new(window, PLACEHOLDER_SUMMARY)
    }

    /// 자리표시 요약인지 확인
    pub fn is_placeholder(&self) -> bool {
        self.summary == PLACEHOLDER_SUMMARY && self.activities.is_empty()
    }

    /// 요약이 가리키는 윈도우
    pub fn window(&self) -> AnalysisWindow {
        AnalysisWindow::new(self.start_time, self.end_time)
    }

    /// 활동 시간 합계 (분)
    pub fn total_activity_minutes(&self) -> u32 {
        self.activities.iter().map(|a| a.duration_minutes).sum()
    }
}
