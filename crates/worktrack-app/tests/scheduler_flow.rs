//! 스케줄러 작업 통합 테스트.
//!
//! 주기/보정 분석 중복 방지, 근무 구간 판정, 보존 기간 정리, 자동 시작/정지.

mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;

use common::{config_in, monday, pipeline, seed_capture, seed_capture_file, CountingAnalyzer, FakeControl};
use worktrack_app::analysis::AnalysisPipeline;
use worktrack_app::scheduler::{AnalysisScheduler, JobOutcome, SchedulerJobs, SkipReason};
use worktrack_core::error::CoreError;
use worktrack_core::models::window::AnalysisWindow;
use worktrack_core::ports::storage::SummaryStorage;
use worktrack_storage::screenshot_storage::ScreenshotFileStorage;
use worktrack_storage::sqlite::SqliteStorage;

struct Fixture {
    _dir: TempDir,
    storage: Arc<SqliteStorage>,
    analyzer: Arc<CountingAnalyzer>,
    control: Arc<FakeControl>,
    pipeline: Arc<AnalysisPipeline>,
    jobs: SchedulerJobs,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let analyzer = Arc::new(CountingAnalyzer::default());
    let control = Arc::new(FakeControl::default());
    let pipeline = pipeline(&storage, analyzer.clone());
    let jobs = SchedulerJobs::new(config_in(&dir), pipeline.clone(), control.clone());
    Fixture {
        _dir: dir,
        storage,
        analyzer,
        control,
        pipeline,
        jobs,
    }
}

#[tokio::test]
async fn periodic_then_catch_up_writes_once() {
    let f = fixture();
    seed_capture(&f.storage, monday(9, 30)).await;

    let outcome = f.jobs.run_periodic(monday(10, 0)).await.unwrap();
    assert_matches!(outcome, JobOutcome::Analyzed(_));

    let outcome = f.jobs.run_catch_up(monday(10, 5)).await.unwrap();
    assert_eq!(outcome, JobOutcome::Skipped(SkipReason::AlreadySummarized));

    assert_eq!(f.analyzer.calls(), 1);
    let summaries = f
        .storage
        .get_summaries(monday(0, 0), monday(23, 59))
        .await
        .unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].start_time, monday(9, 0));
    assert_eq!(summaries[0].end_time, monday(10, 0));
}

#[tokio::test]
async fn catch_up_then_periodic_writes_once() {
    let f = fixture();
    seed_capture(&f.storage, monday(10, 20)).await;

    let outcome = f.jobs.run_catch_up(monday(11, 5)).await.unwrap();
    assert_matches!(outcome, JobOutcome::Analyzed(_));

    let outcome = f.jobs.run_periodic(monday(11, 30)).await.unwrap();
    assert_eq!(outcome, JobOutcome::Skipped(SkipReason::AlreadySummarized));

    assert_eq!(f.analyzer.calls(), 1);
    assert!(f
        .storage
        .has_summary(&AnalysisWindow::new(monday(10, 0), monday(11, 0)))
        .await
        .unwrap());
}

#[tokio::test]
async fn catch_up_respects_work_window_and_data() {
    let f = fixture();

    // [07:00, 08:00)은 근무 시작 전
    assert_eq!(
        f.jobs.run_catch_up(monday(8, 5)).await.unwrap(),
        JobOutcome::Skipped(SkipReason::OutsideWorkHours)
    );
    // [18:00, 19:00)은 근무 종료 후
    assert_eq!(
        f.jobs.run_catch_up(monday(19, 5)).await.unwrap(),
        JobOutcome::Skipped(SkipReason::OutsideWorkHours)
    );
    // [17:00, 18:00)은 근무 구간 안이지만 캡처 없음
    assert_eq!(
        f.jobs.run_catch_up(monday(18, 5)).await.unwrap(),
        JobOutcome::Skipped(SkipReason::NoCaptures)
    );
    assert_eq!(f.analyzer.calls(), 0);
}

#[tokio::test]
async fn catch_up_ignores_disabled_schedule_flag() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    config.update_with(|c| c.schedule.enabled = false).unwrap();
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let jobs = SchedulerJobs::new(
        config,
        pipeline(&storage, Arc::new(CountingAnalyzer::default())),
        Arc::new(FakeControl::default()),
    );
    seed_capture(&storage, monday(14, 10)).await;

    assert_matches!(
        jobs.run_catch_up(monday(15, 5)).await.unwrap(),
        JobOutcome::Analyzed(_)
    );
}

#[tokio::test]
async fn periodic_failure_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let analyzer = Arc::new(CountingAnalyzer::failing_on(1));
    let jobs = SchedulerJobs::new(
        config_in(&dir),
        pipeline(&storage, analyzer.clone()),
        Arc::new(FakeControl::default()),
    );
    seed_capture(&storage, monday(13, 15)).await;

    assert_matches!(
        jobs.run_periodic(monday(14, 0)).await,
        Err(CoreError::Network(_))
    );
    let window = AnalysisWindow::new(monday(13, 0), monday(14, 0));
    assert!(!storage.has_summary(&window).await.unwrap());

    // 다음 보정 분석에서 재시도
    assert_matches!(
        jobs.run_catch_up(monday(14, 5)).await.unwrap(),
        JobOutcome::Analyzed(_)
    );
    assert!(storage.has_summary(&window).await.unwrap());
}

#[tokio::test]
async fn daily_report_sums_activity_minutes() {
    let f = fixture();
    seed_capture(&f.storage, monday(11, 0)).await;

    let outcome = f.jobs.run_daily_report(monday(17, 50)).await.unwrap();
    assert_eq!(outcome, JobOutcome::Reported { total_minutes: 45 });
    assert!(f
        .storage
        .has_summary(&AnalysisWindow::new(monday(9, 0), monday(18, 0)))
        .await
        .unwrap());
}

#[tokio::test]
async fn daily_report_rerun_supersedes_previous_report() {
    let f = fixture();
    seed_capture(&f.storage, monday(11, 0)).await;
    let work = AnalysisWindow::new(monday(9, 0), monday(18, 0));

    // 같은 구간을 수동 분석한 요약이 먼저 있어도 리포트는 새로 작성된다
    f.pipeline.run_window(&work).await.unwrap();

    for _ in 0..2 {
        assert_eq!(
            f.jobs.run_daily_report(monday(17, 50)).await.unwrap(),
            JobOutcome::Reported { total_minutes: 45 }
        );
    }
    assert_eq!(f.analyzer.calls(), 3);

    let stored = f
        .storage
        .get_summaries(monday(0, 0), monday(23, 59))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].summary, "1.작업 3;");
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let screenshots = ScreenshotFileStorage::new(dir.path()).await.unwrap();
    let jobs = SchedulerJobs::new(
        config_in(&dir),
        pipeline(&storage, Arc::new(CountingAnalyzer::default())),
        Arc::new(FakeControl::default()),
    )
    .with_screenshots(screenshots);

    let now = monday(3, 0);
    let old_day = now - Duration::days(40);
    let day_dir = dir
        .path()
        .join("screenshots")
        .join(old_day.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&day_dir).unwrap();
    for i in 0..3 {
        let path = day_dir.join(format!("old_{i}.jpg"));
        std::fs::write(&path, b"jpeg").unwrap();
        seed_capture_file(&storage, old_day + Duration::minutes(i), path.display().to_string())
            .await;
    }
    seed_capture(&storage, now - Duration::days(1)).await;

    assert_eq!(jobs.run_cleanup(now).await.unwrap(), JobOutcome::Cleaned(3));
    assert!(!day_dir.exists());
    assert_eq!(jobs.run_cleanup(now).await.unwrap(), JobOutcome::Cleaned(0));
    assert_eq!(storage.storage_stats().unwrap().total_captures, 1);
}

#[tokio::test]
async fn auto_start_stop_are_noops_when_already_in_state() {
    let f = fixture();

    assert_eq!(f.jobs.run_auto_stop().await.unwrap(), JobOutcome::Skipped(SkipReason::AlreadyStopped));
    assert_eq!(f.jobs.run_auto_start().await.unwrap(), JobOutcome::CaptureStarted);
    assert_eq!(f.jobs.run_auto_start().await.unwrap(), JobOutcome::Skipped(SkipReason::AlreadyRunning));
    assert_eq!(f.jobs.run_auto_stop().await.unwrap(), JobOutcome::CaptureStopped);

    assert_eq!(f.control.starts.load(Ordering::SeqCst), 1);
    assert_eq!(f.control.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scheduler_start_twice_conflicts() {
    let f = fixture();
    let scheduler = AnalysisScheduler::new(f.jobs);

    scheduler.start().await.unwrap();
    assert!(scheduler.is_running());
    assert_matches!(scheduler.start().await, Err(CoreError::StateConflict(_)));
    assert_eq!(scheduler.describe_jobs().await.len(), 6);

    scheduler.stop().await;
    assert!(!scheduler.is_running());
    // 정지 상태에서 정지는 아무 일도 하지 않음
    scheduler.stop().await;
}

#[tokio::test]
async fn invalid_schedule_registers_remaining_jobs() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    config
        .update_with(|c| c.schedule.start_time = "아홉시".into())
        .unwrap();
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let scheduler = AnalysisScheduler::new(SchedulerJobs::new(
        config,
        pipeline(&storage, Arc::new(CountingAnalyzer::default())),
        Arc::new(FakeControl::default()),
    ));

    scheduler.start().await.unwrap();
    let names: Vec<String> = scheduler
        .describe_jobs()
        .await
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(
        names,
        vec!["periodic-analysis", "catch-up-analysis", "cleanup"]
    );
    scheduler.stop().await;
}
