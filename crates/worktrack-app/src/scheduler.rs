//! 분석 스케줄러.
//!
//! 주기 분석, 매시 보정 분석, 일일 리포트, 보존 기간 정리, 근무 시간 자동 시작/정지
//! 여섯 작업을 `TaskRunner`에 등록한다. 트리거는 `start()` 시점 설정으로 한 번만 계산하며,
//! 설정 변경은 스케줄러를 재시작해야 반영된다.
//!
//! 분석 작업은 "해당 윈도우 요약이 이미 있는가"를 먼저 확인한다. 확인과 저장 사이의 경쟁은
//! `summaries(start_time, end_time)` 유니크 인덱스가 `Duplicate` 에러로 막는다.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use worktrack_core::config::AppConfig;
use worktrack_core::config_manager::ConfigManager;
use worktrack_core::error::CoreError;
use worktrack_core::models::window::AnalysisWindow;
use worktrack_core::ports::control::CaptureControl;
use worktrack_core::schedule::work_window_on;
use worktrack_storage::screenshot_storage::ScreenshotFileStorage;

use crate::analysis::{AnalysisPipeline, SaveMode};
use crate::task_runner::{JobTrigger, TaskRunner};

/// 매시 보정 분석 실행 분
const CATCH_UP_MINUTE: u32 = 5;
/// 일일 리포트: 근무 종료 몇 분 전
const DAILY_REPORT_LEAD_MINUTES: i64 = 10;

/// 작업 건너뜀 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 이미 요약이 있는 윈도우
    AlreadySummarized,
    /// 윈도우가 오늘 근무 구간 밖
    OutsideWorkHours,
    /// 윈도우에 캡처 없음
    NoCaptures,
    /// 캡처 엔진이 이미 실행 중
    AlreadyRunning,
    /// 캡처 엔진이 이미 정지됨
    AlreadyStopped,
}

/// 작업 실행 결과
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// 요약 기록 (요약 ID)
    Analyzed(i64),
    /// 일일 리포트 (활동 시간 합계, 분)
    Reported { total_minutes: u32 },
    /// 정리된 캡처 수
    Cleaned(usize),
    /// 캡처 엔진 시작
    CaptureStarted,
    /// 캡처 엔진 정지
    CaptureStopped,
    Skipped(SkipReason),
}

// ============================================================
// 작업 본문
// ============================================================

/// 스케줄러 작업 본문 — 테스트에서 시각을 주입해 직접 호출할 수 있다
pub struct SchedulerJobs {
    config: ConfigManager,
    pipeline: Arc<AnalysisPipeline>,
    capture: Arc<dyn CaptureControl>,
    screenshots: Option<ScreenshotFileStorage>,
}

impl SchedulerJobs {
    pub fn new(
        config: ConfigManager,
        pipeline: Arc<AnalysisPipeline>,
        capture: Arc<dyn CaptureControl>,
    ) -> Self {
        Self {
            config,
            pipeline,
            capture,
            screenshots: None,
        }
    }

    /// 정리 작업에서 빈 날짜 디렉토리도 지우도록 스크린샷 저장소 설정
    pub fn with_screenshots(mut self, screenshots: ScreenshotFileStorage) -> Self {
        self.screenshots = Some(screenshots);
        self
    }

    /// 주기 분석 — 직전 정각 한 시간
    pub async fn run_periodic(&self, now: DateTime<Local>) -> Result<JobOutcome, CoreError> {
        let window = AnalysisWindow::previous_hour(now);
        if self.pipeline.summaries().has_summary(&window).await? {
            info!("{window} 요약 존재, 주기 분석 건너뜀");
            return Ok(JobOutcome::Skipped(SkipReason::AlreadySummarized));
        }

        let summary = self.pipeline.run_window(&window).await?;
        info!("주기 분석 완료: {window}: {}", summary.summary);
        Ok(JobOutcome::Analyzed(summary.id.unwrap_or_default()))
    }

    /// 매시 보정 분석 — 직전 정각 한 시간이 오늘 근무 구간 안이고 캡처가 있을 때만
    pub async fn run_catch_up(&self, now: DateTime<Local>) -> Result<JobOutcome, CoreError> {
        let schedule = self.config.get().schedule;
        let work = work_window_on(&schedule, now.date_naive())?;
        let window = AnalysisWindow::previous_hour(now);

        if window.start < work.start || window.end > work.end {
            info!("{window} 근무 구간 밖, 보정 분석 건너뜀");
            return Ok(JobOutcome::Skipped(SkipReason::OutsideWorkHours));
        }

        if self.pipeline.summaries().has_summary(&window).await? {
            info!("{window} 요약 존재, 보정 분석 건너뜀");
            return Ok(JobOutcome::Skipped(SkipReason::AlreadySummarized));
        }

        if self.pipeline.captures().count_captures(&window).await? == 0 {
            info!("{window} 캡처 없음, 보정 분석 건너뜀");
            return Ok(JobOutcome::Skipped(SkipReason::NoCaptures));
        }

        let summary = self.pipeline.run_window(&window).await?;
        info!("보정 분석 완료: {window}: {}", summary.summary);
        Ok(JobOutcome::Analyzed(summary.id.unwrap_or_default()))
    }

    /// 일일 리포트 — 오늘 근무 구간 전체 (중복 확인 없음, 같은 구간 요약은 대체)
    pub async fn run_daily_report(&self, now: DateTime<Local>) -> Result<JobOutcome, CoreError> {
        let schedule = self.config.get().schedule;
        let work = work_window_on(&schedule, now.date_naive())?;

        let summary = self.pipeline.analyze(&work).await?;
        let total_minutes = summary.total_activity_minutes();
        info!(
            "일일 리포트 완료: {} - {}, 작업 시간 {}시간 {}분",
            work.start.format("%H:%M"),
            work.end.format("%H:%M"),
            total_minutes / 60,
            total_minutes % 60
        );

        let summary = self.pipeline.record(&work, summary, SaveMode::Replace).await?;
        info!("일일 요약: {}", summary.summary);
        Ok(JobOutcome::Reported { total_minutes })
    }

    /// 보존 기간이 지난 캡처 삭제
    pub async fn run_cleanup(&self, now: DateTime<Local>) -> Result<JobOutcome, CoreError> {
        let retention_days = self.config.get().storage.retention_days;
        let cutoff = now - ChronoDuration::days(i64::from(retention_days));

        let deleted = self.pipeline.captures().purge_captures_before(cutoff).await?;
        if let Some(screenshots) = &self.screenshots {
            match screenshots.prune_empty_day_dirs().await {
                Ok(0) => {}
                Ok(n) => info!("빈 스크린샷 디렉토리 {n}개 삭제"),
                Err(e) => warn!("스크린샷 디렉토리 정리 실패: {e}"),
            }
        }

        info!("정리 완료: {retention_days}일 이전 캡처 {deleted}개 삭제");
        Ok(JobOutcome::Cleaned(deleted))
    }

    /// 근무 시작 시 캡처 자동 시작
    pub async fn run_auto_start(&self) -> Result<JobOutcome, CoreError> {
        if self.capture.is_running() {
            info!("캡처 엔진 이미 실행 중, 자동 시작 생략");
            return Ok(JobOutcome::Skipped(SkipReason::AlreadyRunning));
        }
        self.capture.start().await?;
        info!("근무 시작, 캡처 엔진 자동 시작");
        Ok(JobOutcome::CaptureStarted)
    }

    /// 근무 종료 시 캡처 자동 정지
    pub async fn run_auto_stop(&self) -> Result<JobOutcome, CoreError> {
        if !self.capture.is_running() {
            info!("캡처 엔진 이미 정지됨, 자동 정지 생략");
            return Ok(JobOutcome::Skipped(SkipReason::AlreadyStopped));
        }
        self.capture.stop().await?;
        info!("근무 종료, 캡처 엔진 자동 정지");
        Ok(JobOutcome::CaptureStopped)
    }
}

// ============================================================
// 스케줄러
// ============================================================

/// 분석 스케줄러
pub struct AnalysisScheduler {
    jobs: Arc<SchedulerJobs>,
    runner: Mutex<Option<TaskRunner>>,
    running: AtomicBool,
}

impl AnalysisScheduler {
    pub fn new(jobs: SchedulerJobs) -> Self {
        Self {
            jobs: Arc::new(jobs),
            runner: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    pub fn jobs(&self) -> &Arc<SchedulerJobs> {
        &self.jobs
    }

    /// 작업 등록 및 시작 (실행 중이면 `StateConflict`)
    ///
    /// 개별 작업의 트리거 계산 실패는 해당 작업만 등록하지 않는다.
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut runner_slot = self.runner.lock().await;
        if runner_slot.is_some() {
            return Err(CoreError::StateConflict("스케줄러가 이미 실행 중입니다".into()));
        }

        let config = self.jobs.config.get();
        let mut runner = TaskRunner::new();

        for (name, trigger) in build_triggers(&config) {
            match trigger {
                Ok(trigger) => self.register(&mut runner, name, trigger),
                Err(e) => warn!("작업 등록 실패 [{name}]: {e}"),
            }
        }

        info!(
            "스케줄러 시작: 작업 {}개, 분석 간격 {}분",
            runner.len(),
            config.schedule.analysis_interval_minutes
        );
        *runner_slot = Some(runner);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// 모든 작업 정지 (정지 상태면 아무 것도 하지 않음)
    pub async fn stop(&self) {
        let mut runner_slot = self.runner.lock().await;
        if let Some(runner) = runner_slot.take() {
            self.running.store(false, Ordering::SeqCst);
            runner.shutdown().await;
            info!("스케줄러 정지");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 등록된 작업 (이름, cron 표현)
    pub async fn describe_jobs(&self) -> Vec<(String, String)> {
        self.runner
            .lock()
            .await
            .as_ref()
            .map(TaskRunner::descriptions)
            .unwrap_or_default()
    }

    fn register(&self, runner: &mut TaskRunner, name: &'static str, trigger: JobTrigger) {
        let jobs = self.jobs.clone();
        match name {
            JOB_PERIODIC => spawn_job(runner, name, trigger, jobs, |j| async move {
                j.run_periodic(Local::now()).await
            }),
            JOB_CATCH_UP => spawn_job(runner, name, trigger, jobs, |j| async move {
                j.run_catch_up(Local::now()).await
            }),
            JOB_DAILY_REPORT => spawn_job(runner, name, trigger, jobs, |j| async move {
                j.run_daily_report(Local::now()).await
            }),
            JOB_CLEANUP => spawn_job(runner, name, trigger, jobs, |j| async move {
                j.run_cleanup(Local::now()).await
            }),
            JOB_AUTO_START => {
                spawn_job(runner, name, trigger, jobs, |j| async move { j.run_auto_start().await })
            }
            JOB_AUTO_STOP => {
                spawn_job(runner, name, trigger, jobs, |j| async move { j.run_auto_stop().await })
            }
            other => error!("알 수 없는 작업: {other}"),
        }
    }
}

const JOB_PERIODIC: &str = "periodic-analysis";
const JOB_CATCH_UP: &str = "catch-up-analysis";
const JOB_DAILY_REPORT: &str = "daily-report";
const JOB_CLEANUP: &str = "cleanup";
const JOB_AUTO_START: &str = "auto-start-capture";
const JOB_AUTO_STOP: &str = "auto-stop-capture";

/// 작업 본문을 실행하고 결과를 로그로 남기는 래퍼 등록
fn spawn_job<F, Fut>(
    runner: &mut TaskRunner,
    name: &'static str,
    trigger: JobTrigger,
    jobs: Arc<SchedulerJobs>,
    body: F,
) where
    F: Fn(Arc<SchedulerJobs>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JobOutcome, CoreError>> + Send + 'static,
{
    runner.spawn(name, trigger, move || {
        let fut = body(jobs.clone());
        async move {
            match fut.await {
                Ok(outcome) => info!("[{name}] {outcome:?}"),
                Err(e) => warn!("[{name}] 실패: {e}"),
            }
        }
    });
}

/// 설정 스냅샷 → (작업 이름, 트리거)
pub fn build_triggers(config: &AppConfig) -> Vec<(&'static str, Result<JobTrigger, CoreError>)> {
    let schedule = &config.schedule;
    let days = &schedule.work_days;

    let periodic = schedule.analysis_interval().and_then(|d| {
        d.to_std()
            .map(JobTrigger::Every)
            .map_err(|e| CoreError::Config(format!("분석 간격 변환 실패: {e}")))
    });

    let daily_report = schedule.work_hours().map(|h| JobTrigger::DailyAt {
        time: h.end - ChronoDuration::minutes(DAILY_REPORT_LEAD_MINUTES),
        days: days.clone(),
    });
    let auto_start = schedule.work_hours().map(|h| JobTrigger::DailyAt {
        time: h.start,
        days: days.clone(),
    });
    let auto_stop = schedule.work_hours().map(|h| JobTrigger::DailyAt {
        time: h.end,
        days: days.clone(),
    });

    let cleanup_time = NaiveTime::from_hms_opt(3, 0, 0)
        .ok_or_else(|| CoreError::Internal("정리 시각 계산 실패".into()));

    vec![
        (JOB_PERIODIC, periodic),
        (
            JOB_CATCH_UP,
            Ok(JobTrigger::HourlyAt {
                minute: CATCH_UP_MINUTE,
            }),
        ),
        (JOB_DAILY_REPORT, daily_report),
        (
            JOB_CLEANUP,
            cleanup_time.map(|time| JobTrigger::DailyAt { time, days: vec![] }),
        ),
        (JOB_AUTO_START, auto_start),
        (JOB_AUTO_STOP, auto_stop),
    ]
}
