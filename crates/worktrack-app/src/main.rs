//! # worktrack
//!
//! WorkTrack 바이너리 진입점.
//! 어댑터 조립(DI), 하위 명령 처리, 상주 모드 라이프사이클.

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use worktrack_app::analysis::{AnalysisPipeline, UnavailableAnalyzer};
use worktrack_app::capture_engine::CaptureEngine;
use worktrack_app::lifecycle::wait_for_shutdown;
use worktrack_app::scheduler::{AnalysisScheduler, SchedulerJobs};
use worktrack_app::segment_planner::SegmentPlanner;
use worktrack_core::config::parse_clock;
use worktrack_core::config_manager::ConfigManager;
use worktrack_core::models::summary::SummaryRecord;
use worktrack_core::models::window::AnalysisWindow;
use worktrack_core::ports::analysis::Analyzer;
use worktrack_core::schedule::local_at;
use worktrack_monitor::screen_state::PlatformActivityProbe;
use worktrack_network::ai_vision_client::VisionAnalyzer;
use worktrack_storage::report::SummaryReportWriter;
use worktrack_storage::screenshot_storage::ScreenshotFileStorage;
use worktrack_storage::sqlite::SqliteStorage;
use worktrack_vision::capturer::XcapScreenCapturer;

/// 데이터베이스 파일 이름
const DB_FILE_NAME: &str = "worktrack.db";

/// WorkTrack — 작업 화면 캡처 및 AI 작업 요약
#[derive(Parser, Debug)]
#[command(name = "worktrack")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 데이터 디렉토리 (DB, 스크린샷, 리포트)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 캡처 엔진과 스케줄러 상주 실행 (기본)
    Run,
    /// 오늘 요약을 처음부터 다시 생성
    Regenerate,
    /// 오늘 지정 구간 한 번 분석 (HH:MM)
    Analyze {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// 화면 목록
    Screens,
    /// 즉시 캡처 (근무 시간/잠금 상태 무시)
    CaptureNow {
        /// 화면 인덱스 (생략 시 설정된 화면)
        #[arg(long)]
        screen: Option<usize>,
    },
    /// 보존 기간이 지난 캡처 정리
    Cleanup,
    /// 저장 현황
    Status,
    /// 근무 시간/분석 간격 변경 (다음 실행부터 적용)
    Schedule {
        /// 근무 시작 (HH:MM)
        #[arg(long)]
        start: Option<String>,
        /// 근무 종료 (HH:MM)
        #[arg(long)]
        end: Option<String>,
        /// 분석 간격 (분)
        #[arg(long)]
        interval: Option<u32>,
        /// 근무 시간 제한 켜기/끄기
        #[arg(long)]
        enabled: Option<bool>,
    },
}

/// 조립된 구성 요소
struct App {
    config: ConfigManager,
    data_dir: PathBuf,
    storage: Arc<SqliteStorage>,
    engine: Arc<CaptureEngine>,
    pipeline: Arc<AnalysisPipeline>,
}

impl App {
    async fn build(config: ConfigManager, data_dir: PathBuf) -> Result<Self> {
        let snapshot = config.get();
        std::fs::create_dir_all(&data_dir)?;

        let db_path = data_dir.join(DB_FILE_NAME);
        let storage = Arc::new(SqliteStorage::open(&db_path)?);
        info!("SQLite 저장소: {}", db_path.display());

        let screenshots = ScreenshotFileStorage::new(&data_dir).await?;
        info!("스크린샷 저장소: {}", screenshots.root().display());

        let capturer = Arc::new(XcapScreenCapturer::new(
            storage.clone(),
            screenshots,
            &snapshot.capture,
        ));
        let engine = Arc::new(CaptureEngine::new(
            capturer,
            Arc::new(PlatformActivityProbe::new()),
            config.clone(),
        ));

        let analyzer: Arc<dyn Analyzer> =
            match VisionAnalyzer::new(&snapshot.analysis, storage.clone()) {
                Ok(analyzer) => Arc::new(analyzer),
                Err(e) => {
                    warn!("분석 비활성화: {e}");
                    Arc::new(UnavailableAnalyzer::new(e.to_string()))
                }
            };
        let pipeline = Arc::new(
            AnalysisPipeline::new(analyzer, storage.clone(), storage.clone())
                .with_reports(SummaryReportWriter::new(&data_dir)),
        );

        Ok(Self {
            config,
            data_dir,
            storage,
            engine,
            pipeline,
        })
    }

    async fn scheduler(&self) -> Result<AnalysisScheduler> {
        let screenshots = ScreenshotFileStorage::new(&self.data_dir).await?;
        let jobs = SchedulerJobs::new(
            self.config.clone(),
            self.pipeline.clone(),
            self.engine.clone(),
        )
        .with_screenshots(screenshots);
        Ok(AnalysisScheduler::new(jobs))
    }
}

/// 데이터 디렉토리 결정 (CLI 인자 → 설정 → 플랫폼 기본 경로)
///
/// - macOS: `~/Library/Application Support/com.worktrack.worktrack/`
/// - Windows: `%APPDATA%\worktrack\worktrack\data\`
/// - Linux: `~/.local/share/worktrack/`
fn resolve_data_dir(args: &Args, config: &ConfigManager) -> Result<PathBuf> {
    if let Some(dir) = &args.data_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = config.get().storage.data_dir {
        return Ok(dir);
    }
    Ok(ConfigManager::data_dir()?)
}

fn print_summary(summary: &SummaryRecord) {
    println!(
        "[{} - {}] {}",
        summary.start_time.format("%H:%M"),
        summary.end_time.format("%H:%M"),
        summary.summary
    );
    for activity in &summary.activities {
        println!(
            "    - {} ({}분, {})",
            activity.name,
            activity.duration_minutes,
            activity.apps.join(", ")
        );
    }
}

async fn run_daemon(app: &App) -> Result<()> {
    let scheduler = app.scheduler().await?;

    if app.config.get().capture.enabled {
        app.engine.start().await?;
    } else {
        info!("캡처 자동 시작 꺼짐 (capture.enabled = false), 근무 시작 시각에 시작");
    }

    scheduler.start().await?;
    for (name, expr) in scheduler.describe_jobs().await {
        info!("  {name}: {expr}");
    }

    info!("WorkTrack 실행 중 (Ctrl+C로 종료)");
    let signal = wait_for_shutdown().await;
    info!("{signal}: 스케줄러와 캡처 엔진 정지");

    scheduler.stop().await;
    if app.engine.is_running() {
        app.engine.stop().await?;
    }
    Ok(())
}

async fn run_regenerate(app: &App) -> Result<()> {
    let planner = SegmentPlanner::new(app.config.clone(), app.pipeline.clone());
    let report = planner.regenerate_today(Local::now()).await?;

    println!("세그먼트 {}개", report.segments.len());
    for summary in &report.written {
        print_summary(summary);
    }

    match report.error {
        Some(e) => Err(anyhow!(
            "재생성 중단 ({}/{} 기록): {e}",
            report.written.len(),
            report.segments.len()
        )),
        None => Ok(()),
    }
}

async fn run_analyze(app: &App, start: &str, end: &str) -> Result<()> {
    let today = Local::now().date_naive();
    let start = local_at(today, parse_clock(start)?)
        .ok_or_else(|| anyhow!("시작 시각을 계산할 수 없습니다: {start}"))?;
    let end = local_at(today, parse_clock(end)?)
        .ok_or_else(|| anyhow!("종료 시각을 계산할 수 없습니다: {end}"))?;
    if end <= start {
        return Err(anyhow!("종료 시각이 시작 시각보다 늦어야 합니다"));
    }

    let summary = app
        .pipeline
        .run_window(&AnalysisWindow::new(start, end))
        .await?;
    print_summary(&summary);
    Ok(())
}

async fn run_screens(app: &App) -> Result<()> {
    for screen in app.engine.screens().await? {
        println!(
            "{}{} {} ({}x{} @ {},{})",
            screen.index,
            if screen.is_primary { "*" } else { " " },
            screen.name,
            screen.bounds.width,
            screen.bounds.height,
            screen.bounds.x,
            screen.bounds.y
        );
    }
    Ok(())
}

async fn run_capture_now(app: &App, screen: Option<usize>) -> Result<()> {
    for record in app.engine.capture_now(screen).await? {
        println!(
            "{} {} ({} bytes)",
            record.resolution, record.file_path, record.size_bytes
        );
    }
    Ok(())
}

async fn run_cleanup(app: &App) -> Result<()> {
    let scheduler = app.scheduler().await?;
    let outcome = scheduler.jobs().run_cleanup(Local::now()).await?;
    println!("{outcome:?}");
    Ok(())
}

fn run_status(app: &App) -> Result<()> {
    let now = Local::now();
    let stats = app.storage.storage_stats()?;
    let today = app.storage.today_stats(now)?;
    let schedule = app.config.get().schedule;

    println!("설정 파일: {}", app.config.config_path().display());
    println!("데이터 디렉토리: {}", app.data_dir.display());
    println!(
        "근무 시간: {} - {} (제한 {})",
        schedule.start_time,
        schedule.end_time,
        if schedule.enabled { "켜짐" } else { "꺼짐" }
    );
    println!(
        "전체 캡처: {}개, {:.1} MB",
        stats.total_captures,
        stats.total_bytes as f64 / (1024.0 * 1024.0)
    );
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!(
            "캡처 기간: {} ~ {}",
            oldest.format("%Y-%m-%d"),
            newest.format("%Y-%m-%d %H:%M")
        );
    }
    println!(
        "오늘: 캡처 {}개 (분석 {}개), 요약 {}개",
        today.captures, today.analyzed_captures, today.summaries
    );
    for record in app.storage.recent_captures(5)? {
        println!(
            "  {} {}",
            record.timestamp.format("%H:%M:%S"),
            record.file_path
        );
    }
    Ok(())
}

fn run_schedule(
    config: &ConfigManager,
    start: Option<&str>,
    end: Option<&str>,
    interval: Option<u32>,
    enabled: Option<bool>,
) -> Result<()> {
    // 잘못된 값은 저장 전에 거른다
    for value in start.iter().chain(end.iter()) {
        parse_clock(value)?;
    }
    if interval == Some(0) {
        return Err(anyhow!("분석 간격은 1분 이상이어야 합니다"));
    }

    let updated = config.update_with(|c| {
        if let Some(start) = start {
            c.schedule.start_time = start.to_string();
        }
        if let Some(end) = end {
            c.schedule.end_time = end.to_string();
        }
        if let Some(interval) = interval {
            c.schedule.analysis_interval_minutes = interval;
        }
        if let Some(enabled) = enabled {
            c.schedule.enabled = enabled;
        }
    })?;

    let schedule = updated.schedule;
    println!(
        "근무 시간: {} - {}, 분석 간격 {}분, 제한 {}",
        schedule.start_time,
        schedule.end_time,
        schedule.analysis_interval_minutes,
        if schedule.enabled { "켜짐" } else { "꺼짐" }
    );
    println!("실행 중인 worktrack은 재시작해야 변경이 적용됩니다");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();

    let log_filter = format!(
        "worktrack={level},worktrack_app={level},worktrack_core={level},worktrack_monitor={level},worktrack_vision={level},worktrack_storage={level},worktrack_network={level}",
        level = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let config = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone())?,
        None => ConfigManager::new()?,
    };
    info!("설정 파일: {}", config.config_path().display());

    let command = args.command.take().unwrap_or(Command::Run);
    if let Command::Schedule {
        start,
        end,
        interval,
        enabled,
    } = &command
    {
        return run_schedule(&config, start.as_deref(), end.as_deref(), *interval, *enabled);
    }

    let data_dir = resolve_data_dir(&args, &config)?;
    let app = App::build(config, data_dir).await?;

    match command {
        Command::Run => run_daemon(&app).await?,
        Command::Regenerate => run_regenerate(&app).await?,
        Command::Analyze { start, end } => run_analyze(&app, &start, &end).await?,
        Command::Screens => run_screens(&app).await?,
        Command::CaptureNow { screen } => run_capture_now(&app, screen).await?,
        Command::Cleanup => run_cleanup(&app).await?,
        Command::Status => run_status(&app)?,
        Command::Schedule { .. } => {}
    }

    info!("WorkTrack 종료");
    Ok(())
}
