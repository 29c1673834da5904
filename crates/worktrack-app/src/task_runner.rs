//! 작업 실행기.
//!
//! 고정 간격 / 매시 / 매일 트리거로 비동기 작업을 반복 실행한다.
//! 작업마다 `CancellationToken`을 하나씩 가지며, 취소는 다음 실행을 막을 뿐
//! 이미 실행 중인 작업 본문은 끝까지 수행된다.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Local, NaiveTime, Timelike};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use worktrack_core::config::Weekday;
use worktrack_core::schedule::{hour_floor, local_at};

/// 다음 실행 시각을 찾을 때 살펴보는 최대 일수
const MAX_LOOKAHEAD_DAYS: i64 = 8;

// ============================================================
// 트리거
// ============================================================

/// 작업 트리거
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTrigger {
    /// 고정 간격 반복 (등록 시점 기준)
    Every(Duration),
    /// 매시 `minute`분
    HourlyAt { minute: u32 },
    /// 지정 요일의 `time` (요일 목록이 비어 있으면 매일)
    DailyAt { time: NaiveTime, days: Vec<Weekday> },
}

impl JobTrigger {
    /// `now` 이후(초과)의 다음 실행 시각
    pub fn next_after(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        match self {
            JobTrigger::Every(period) => {
                let period = ChronoDuration::from_std(*period).ok()?;
                Some(now + period)
            }
            JobTrigger::HourlyAt { minute } => {
                let candidate = hour_floor(&now) + ChronoDuration::minutes(i64::from(*minute));
                if candidate > now {
                    Some(candidate)
                } else {
                    Some(candidate + ChronoDuration::hours(1))
                }
            }
            JobTrigger::DailyAt { time, days } => {
                let today = now.date_naive();
                (0..MAX_LOOKAHEAD_DAYS)
                    .filter_map(|offset| today.checked_add_signed(ChronoDuration::days(offset)))
                    .filter(|date| fires_on(days, date.weekday().into()))
                    .filter_map(|date| local_at(date, *time))
                    .find(|at| *at > now)
            }
        }
    }

    /// 로그용 cron 형식 표현
    pub fn describe(&self) -> String {
        match self {
            JobTrigger::Every(period) => {
                let secs = period.as_secs();
                if secs > 0 && secs % 60 == 0 {
                    format!("@every {}m", secs / 60)
                } else {
                    format!("@every {}s", secs)
                }
            }
            JobTrigger::HourlyAt { minute } => format!("{minute} * * * *"),
            JobTrigger::DailyAt { time, days } => format!(
                "{} {} * * {}",
                time.minute(),
                time.hour(),
                cron_days(days)
            ),
        }
    }
}

fn fires_on(days: &[Weekday], day: Weekday) -> bool {
    days.is_empty() || days.contains(&day)
}

/// 요일 목록 → cron 요일 필드 (전체 또는 비어 있으면 `*`)
fn cron_days(days: &[Weekday]) -> String {
    let mut indexes: Vec<u8> = days.iter().map(|d| d.cron_index()).collect();
    indexes.sort_unstable();
    indexes.dedup();
    if indexes.is_empty() || indexes.len() == 7 {
        return "*".to_string();
    }
    indexes
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================
// 실행기
// ============================================================

struct RegisteredTask {
    name: String,
    trigger: JobTrigger,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// 작업 실행기
#[derive(Default)]
pub struct TaskRunner {
    tasks: Vec<RegisteredTask>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 작업 등록 후 즉시 대기 루프 시작
    pub fn spawn<F, Fut>(&mut self, name: &str, trigger: JobTrigger, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let task_trigger = trigger.clone();
        let task_name = name.to_string();
        let job = Arc::new(job);

        let handle = tokio::spawn(async move {
            loop {
                let now = Local::now();
                let Some(next) = task_trigger.next_after(now) else {
                    warn!("[{task_name}] 다음 실행 시각 계산 실패, 작업 종료");
                    break;
                };
                let wait = (next - now).to_std().unwrap_or_default();
                debug!("[{task_name}] 다음 실행: {}", next.format("%Y-%m-%d %H:%M:%S"));

                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {
                        job().await;
                    }
                }
            }
            debug!("[{task_name}] 작업 루프 종료");
        });

        info!("작업 등록: {} ({})", name, trigger.describe());
        self.tasks.push(RegisteredTask {
            name: name.to_string(),
            trigger,
            token,
            handle,
        });
    }

    /// 등록된 작업 수
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// (이름, 트리거 표현) 목록
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.tasks
            .iter()
            .map(|t| (t.name.clone(), t.trigger.describe()))
            .collect()
    }

    /// 모든 작업 취소 후 종료 대기
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.token.cancel();
        }
        let (names, handles): (Vec<String>, Vec<JoinHandle<()>>) =
            self.tasks.into_iter().map(|t| (t.name, t.handle)).unzip();
        for (name, result) in names.iter().zip(join_all(handles).await) {
            if let Err(e) = result {
                warn!("[{name}] 작업 종료 대기 실패: {e}");
            }
        }
    }
}
