//! 분석 윈도우.
//!
//! 분석 단위가 되는 시간 구간. 기본은 반열린 구간 `[start, end)`이며,
//! 당일 재생성의 마지막 세그먼트만 마지막 캡처 시각을 포함하는 닫힌 구간 `[start, end]`이다.

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schedule::hour_floor;

/// 분석 윈도우 — 요약 레코드의 조회/생성 키
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    /// 시작 시각 (포함)
    pub start: DateTime<Local>,
    /// 종료 시각
    pub end: DateTime<Local>,
    /// 종료 시각 포함 여부
    #[serde(default)]
    pub end_inclusive: bool,
}

impl AnalysisWindow {
    /// 반열린 구간 `[start, end)`
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self {
            start,
            end,
            end_inclusive: false,
        }
    }

    /// 닫힌 구간 `[start, end]`
    pub fn closed(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self {
            start,
            end,
            end_inclusive: true,
        }
    }

    /// `now`가 속한 시각의 직전 한 시간 `[floor(now) - 1h, floor(now))`
    pub fn previous_hour(now: DateTime<Local>) -> Self {
        let end = hour_floor(&now);
        Self::new(end - Duration::hours(1), end)
    }

    /// 시각이 구간에 속하는지 확인
    pub fn contains(&self, t: &DateTime<Local>) -> bool {
        if *t < self.start {
            return false;
        }
        if self.end_inclusive {
            *t <= self.end
        } else {
            *t < self.end
        }
    }

    /// 구간 길이
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for AnalysisWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let close = if self.end_inclusive { ']' } else { ')' };
        write!(
            f,
            "[{}, {}{}",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.end.format("%H:%M:%S"),
            close
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 15, h, m, s).unwrap()
    }

    #[test]
    fn previous_hour_window() {
        let window = AnalysisWindow::previous_hour(at(10, 5, 42));
        assert_eq!(window.start, at(9, 0, 0));
        assert_eq!(window.end, at(10, 0, 0));
        assert!(!window.end_inclusive);
    }

    #[test]
    fn half_open_excludes_end() {
        let window = AnalysisWindow::new(at(9, 0, 0), at(10, 0, 0));
        assert!(window.contains(&at(9, 0, 0)));
        assert!(window.contains(&at(9, 59, 59)));
        assert!(!window.contains(&at(10, 0, 0)));
        assert!(!window.contains(&at(8, 59, 59)));
    }

    #[test]
    fn closed_includes_end() {
        let window = AnalysisWindow::closed(at(11, 0, 0), at(11, 58, 0));
        assert!(window.contains(&at(11, 58, 0)));
        assert!(!window.contains(&at(11, 58, 1)));
        assert_eq!(window.duration(), Duration::minutes(58));
    }
}
