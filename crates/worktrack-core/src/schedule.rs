//! 근무 시간 스케줄 계산.
//!
//! 캡처 게이트(요일 + 시각 범위), 시 단위 내림, 근무 구간 계산.
//! 모든 함수는 호출자가 넘긴 시각만 사용하므로 시계에 의존하지 않는다.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Timelike};
use tracing::warn;

use crate::config::{ScheduleConfig, WorkHours};
use crate::error::CoreError;
use crate::models::window::AnalysisWindow;

/// 시각을 해당 시의 정각으로 내림
pub fn hour_floor<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
    t.clone()
        - Duration::minutes(t.minute() as i64)
        - Duration::seconds(t.second() as i64)
        - Duration::nanoseconds(t.nanosecond() as i64)
}

/// 시각이 `[start, end)`에 속하는지 확인
///
/// `end`가 `start`보다 이르면 자정을 넘는 구간으로 본다 (end + 24h).
/// `start == end`는 빈 구간이다.
pub fn time_in_range(t: NaiveTime, hours: WorkHours) -> bool {
    if hours.end < hours.start {
        t >= hours.start || t < hours.end
    } else {
        t >= hours.start && t < hours.end
    }
}

/// 캡처 스케줄 게이트
///
/// 스케줄이 비활성화되어 있으면 항상 true.
/// 활성화 시 근무 요일이면서 근무 시간대 안일 때만 true.
/// 시각 형식이 잘못되었으면 로그를 남기고 false.
pub fn should_capture_at(schedule: &ScheduleConfig, now: DateTime<Local>) -> bool {
    if !schedule.enabled {
        return true;
    }

    if !schedule.is_work_day(now.weekday()) {
        return false;
    }

    match schedule.work_hours() {
        Ok(hours) => time_in_range(now.time(), hours),
        Err(e) => {
            warn!("근무 시간 파싱 실패, 캡처 건너뜀: {e}");
            false
        }
    }
}

/// 날짜 + 벽시계 시각 → 로컬 시각 (DST 공백이면 None)
pub fn local_at(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Local>> {
    date.and_time(time).and_local_timezone(Local).earliest()
}

/// 해당 날짜의 자정
pub fn start_of_day(date: NaiveDate) -> Result<DateTime<Local>, CoreError> {
    local_at(date, NaiveTime::default())
        .ok_or_else(|| CoreError::Internal(format!("{date} 자정 시각 계산 실패")))
}

/// 해당 날짜의 근무 구간 `[workStart, workEnd)`
///
/// 종료 시각이 시작보다 이르면 종료는 다음 날로 넘어간다.
pub fn work_window_on(
    schedule: &ScheduleConfig,
    date: NaiveDate,
) -> Result<AnalysisWindow, CoreError> {
    let hours = schedule.work_hours()?;
    let start = local_at(date, hours.start)
        .ok_or_else(|| CoreError::Config(format!("{date} {} 시각 없음", hours.start)))?;
    let end_date = if hours.end <= hours.start {
        date.succ_opt()
            .ok_or_else(|| CoreError::Internal(format!("{date} 다음 날짜 계산 실패")))?
    } else {
        date
    };
    let end = local_at(end_date, hours.end)
        .ok_or_else(|| CoreError::Config(format!("{end_date} {} 시각 없음", hours.end)))?;
    Ok(AnalysisWindow::new(start, end))
}
