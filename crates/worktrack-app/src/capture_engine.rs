//! 캡처 엔진.
//!
//! 설정 간격마다 근무 시간 게이트와 활동 프로브를 확인하고,
//! 둘 다 통과하면 선택된 화면(또는 병합 이미지)을 캡처해 저장한다.
//!
//! 상태: Stopped → Running → Stopped. 설정은 `start()` 시점의 스냅샷을 사용한다.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use worktrack_core::config::{CaptureConfig, ScheduleConfig};
use worktrack_core::config_manager::ConfigManager;
use worktrack_core::error::CoreError;
use worktrack_core::models::capture::{CaptureRecord, CapturedFrame, ScreenInfo};
use worktrack_core::ports::activity::{ActivityProbe, ActivityReport};
use worktrack_core::ports::capture::ScreenCapturer;
use worktrack_core::ports::control::CaptureControl;
use worktrack_core::schedule::should_capture_at;

/// 한 주기의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 근무 시간 밖
    OutsideSchedule,
    /// 잠금/화면보호기 상태
    Inactive,
    /// 저장된 레코드 수 (0이면 모든 획득 실패)
    Captured(usize),
}

/// 루프와 공유하는 캡처 작업 부분
struct CaptureWorker {
    capturer: Arc<dyn ScreenCapturer>,
    probe: Arc<dyn ActivityProbe>,
    last_capture: RwLock<Option<DateTime<Local>>>,
}

impl CaptureWorker {
    async fn run_cycle(
        &self,
        capture: &CaptureConfig,
        schedule: &ScheduleConfig,
        now: DateTime<Local>,
    ) -> CycleOutcome {
        if !should_capture_at(schedule, now) {
            debug!("근무 시간 외, 캡처 건너뜀");
            return CycleOutcome::OutsideSchedule;
        }

        let report = self.probe_activity().await;
        if !report.active {
            debug!(
                screensaver = report.screensaver_running,
                locked = report.locked,
                "화면 비활성, 캡처 건너뜀"
            );
            return CycleOutcome::Inactive;
        }

        CycleOutcome::Captured(self.capture_sources(capture, now).await.len())
    }

    /// 활동 프로브 호출 (프로세스 조회/외부 명령이 있으므로 블로킹 스레드에서)
    ///
    /// 프로브 작업이 실패하면 활성으로 간주한다.
    async fn probe_activity(&self) -> ActivityReport {
        let probe = self.probe.clone();
        match tokio::task::spawn_blocking(move || probe.report()).await {
            Ok(report) => report,
            Err(e) => {
                warn!("활동 프로브 실패, 활성으로 간주: {e}");
                ActivityReport::active()
            }
        }
    }

    /// 설정된 화면 캡처 (실패는 로그만 남김)
    async fn capture_sources(
        &self,
        capture: &CaptureConfig,
        now: DateTime<Local>,
    ) -> Vec<CaptureRecord> {
        let records = if capture.merge_screens && capture.selected_screens.len() > 1 {
            self.capture_merged(&capture.selected_screens, now)
                .await
                .into_iter()
                .collect()
        } else {
            let mut records = Vec::with_capacity(capture.selected_screens.len());
            for &index in &capture.selected_screens {
                match self.capture_one(index, now).await {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("화면 {index} 캡처 실패: {e}"),
                }
            }
            records
        };

        if !records.is_empty() {
            *self.last_capture.write() = Some(now);
        }
        records
    }

    async fn capture_one(
        &self,
        index: usize,
        now: DateTime<Local>,
    ) -> Result<CaptureRecord, CoreError> {
        let frame = self.capturer.acquire_frame(index).await?;
        let record = self.capturer.persist_frame(frame, now).await?;
        debug!("캡처 저장: {} ({} bytes)", record.file_path, record.size_bytes);
        Ok(record)
    }

    async fn capture_merged(
        &self,
        screens: &[usize],
        now: DateTime<Local>,
    ) -> Option<CaptureRecord> {
        let mut frames: Vec<CapturedFrame> = Vec::with_capacity(screens.len());
        for &index in screens {
            match self.capturer.acquire_frame(index).await {
                Ok(frame) => frames.push(frame),
                Err(e) => warn!("화면 {index} 캡처 실패: {e}"),
            }
        }

        let frame = match frames.len() {
            0 => return None,
            1 => frames.pop()?,
            _ => match self.capturer.merge_frames(frames).await {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("화면 병합 실패: {e}");
                    return None;
                }
            },
        };

        match self.capturer.persist_frame(frame, now).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("병합 캡처 저장 실패: {e}");
                None
            }
        }
    }
}

#[derive(Default)]
struct EngineState {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

/// 캡처 엔진
pub struct CaptureEngine {
    worker: Arc<CaptureWorker>,
    config: ConfigManager,
    state: Mutex<EngineState>,
    running: AtomicBool,
}

impl CaptureEngine {
    pub fn new(
        capturer: Arc<dyn ScreenCapturer>,
        probe: Arc<dyn ActivityProbe>,
        config: ConfigManager,
    ) -> Self {
        Self {
            worker: Arc::new(CaptureWorker {
                capturer,
                probe,
                last_capture: RwLock::new(None),
            }),
            config,
            state: Mutex::new(EngineState::default()),
            running: AtomicBool::new(false),
        }
    }

    /// 캡처 루프 시작
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        if state.handle.is_some() {
            return Err(CoreError::StateConflict("캡처 엔진이 이미 실행 중입니다".into()));
        }

        let snapshot = self.config.get();
        let period = snapshot.capture.interval()?;
        let token = CancellationToken::new();

        let worker = self.worker.clone();
        let loop_token = token.clone();
        let capture = snapshot.capture;
        let schedule = snapshot.schedule;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // 첫 tick은 즉시 반환되므로 한 간격 뒤부터 캡처
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = loop_token.cancelled() => {
                        debug!("캡처 루프 취소");
                        break;
                    }
                    _ = ticker.tick() => {
                        worker.run_cycle(&capture, &schedule, Local::now()).await;
                    }
                }
            }
        });

        state.handle = Some(handle);
        state.cancel_token = Some(token);
        self.running.store(true, Ordering::SeqCst);
        info!("캡처 엔진 시작 (간격 {}초)", period.as_secs());
        Ok(())
    }

    /// 캡처 루프 정지 (루프 종료까지 대기)
    pub async fn stop(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        let Some(handle) = state.handle.take() else {
            return Err(CoreError::StateConflict("캡처 엔진이 실행 중이 아닙니다".into()));
        };

        if let Some(token) = state.cancel_token.take() {
            token.cancel();
        }
        self.running.store(false, Ordering::SeqCst);

        if let Err(e) = handle.await {
            warn!("캡처 루프 종료 대기 실패: {e}");
        }
        info!("캡처 엔진 정지");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 마지막 성공 캡처 시각
    pub fn last_capture(&self) -> Option<DateTime<Local>> {
        *self.worker.last_capture.read()
    }

    /// 현재 설정으로 한 주기 실행 (게이트 포함)
    pub async fn tick_at(&self, now: DateTime<Local>) -> CycleOutcome {
        let snapshot = self.config.get();
        self.worker
            .run_cycle(&snapshot.capture, &snapshot.schedule, now)
            .await
    }

    /// 즉시 캡처 (게이트 무시)
    ///
    /// 화면을 지정하면 해당 화면만, 아니면 설정된 화면(병합 설정 포함)을 캡처한다.
    pub async fn capture_now(&self, screen: Option<usize>) -> Result<Vec<CaptureRecord>, CoreError> {
        let now = Local::now();
        match screen {
            Some(index) => {
                let record = self.worker.capture_one(index, now).await?;
                *self.worker.last_capture.write() = Some(now);
                Ok(vec![record])
            }
            None => {
                let records = self
                    .worker
                    .capture_sources(&self.config.get().capture, now)
                    .await;
                if records.is_empty() {
                    return Err(CoreError::NoData("캡처된 화면이 없습니다".into()));
                }
                Ok(records)
            }
        }
    }

    /// 사용 가능한 화면 목록
    pub async fn screens(&self) -> Result<Vec<ScreenInfo>, CoreError> {
        self.worker.capturer.enumerate_sources().await
    }
}

#[async_trait]
impl CaptureControl for CaptureEngine {
    async fn start(&self) -> Result<(), CoreError> {
        CaptureEngine::start(self).await
    }

    async fn stop(&self) -> Result<(), CoreError> {
        CaptureEngine::stop(self).await
    }

    fn is_running(&self) -> bool {
        CaptureEngine::is_running(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;
    use worktrack_core::models::capture::{CaptureSource, ScreenBounds};

    #[derive(Default)]
    struct FakeCapturer {
        acquired: AtomicUsize,
        merged: AtomicUsize,
        fail_screen: Option<usize>,
    }

    fn frame(source: CaptureSource, x: i32) -> CapturedFrame {
        CapturedFrame {
            source,
            bounds: ScreenBounds {
                x,
                y: 0,
                width: 2,
                height: 2,
            },
            rgba: vec![0; 16],
        }
    }

    #[async_trait]
    impl ScreenCapturer for FakeCapturer {
        async fn enumerate_sources(&self) -> Result<Vec<ScreenInfo>, CoreError> {
            Ok(vec![])
        }

        async fn acquire_frame(&self, index: usize) -> Result<CapturedFrame, CoreError> {
            if self.fail_screen == Some(index) {
                return Err(CoreError::NotFound {
                    resource_type: "Screen".into(),
                    id: index.to_string(),
                });
            }
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(frame(CaptureSource::Screen(index), index as i32 * 2))
        }

        async fn merge_frames(&self, _frames: Vec<CapturedFrame>) -> Result<CapturedFrame, CoreError> {
            self.merged.fetch_add(1, Ordering::SeqCst);
            Ok(frame(CaptureSource::Merged, 0))
        }

        async fn persist_frame(
            &self,
            frame: CapturedFrame,
            captured_at: DateTime<Local>,
        ) -> Result<CaptureRecord, CoreError> {
            Ok(CaptureRecord {
                id: 1,
                timestamp: captured_at,
                source: frame.source,
                file_path: "fake.jpg".into(),
                size_bytes: 1,
                resolution: "2x2".into(),
                analyzed: false,
            })
        }
    }

    struct FixedProbe(ActivityReport);

    impl ActivityProbe for FixedProbe {
        fn report(&self) -> ActivityReport {
            self.0
        }
    }

    /// 호출된 스레드를 기록하는 프로브
    #[derive(Default)]
    struct ThreadRecordingProbe {
        threads: parking_lot::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl ActivityProbe for ThreadRecordingProbe {
        fn report(&self) -> ActivityReport {
            self.threads.lock().push(std::thread::current().id());
            ActivityReport::active()
        }
    }

    struct PanickingProbe;

    impl ActivityProbe for PanickingProbe {
        fn report(&self) -> ActivityReport {
            panic!("세션 조회 실패");
        }
    }

    fn monday(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 15, h, m, 0).unwrap()
    }

    fn engine(
        dir: &TempDir,
        capturer: Arc<FakeCapturer>,
        report: ActivityReport,
        screens: Vec<usize>,
        merge: bool,
    ) -> CaptureEngine {
        let config = ConfigManager::with_path(dir.path().join("config.json")).unwrap();
        config
            .update_with(|c| {
                c.capture.selected_screens = screens;
                c.capture.merge_screens = merge;
            })
            .unwrap();
        CaptureEngine::new(capturer, Arc::new(FixedProbe(report)), config)
    }

    #[tokio::test]
    async fn gate_blocks_outside_hours_and_when_locked() {
        let dir = TempDir::new().unwrap();
        let capturer = Arc::new(FakeCapturer::default());
        let eng = engine(&dir, capturer.clone(), ActivityReport::active(), vec![0], false);

        assert_eq!(eng.tick_at(monday(20, 0)).await, CycleOutcome::OutsideSchedule);
        assert_eq!(eng.tick_at(monday(10, 0)).await, CycleOutcome::Captured(1));
        assert_eq!(eng.last_capture(), Some(monday(10, 0)));

        let dir2 = TempDir::new().unwrap();
        let locked = engine(
            &dir2,
            capturer.clone(),
            ActivityReport::from_flags(false, true),
            vec![0],
            false,
        );
        assert_eq!(locked.tick_at(monday(10, 0)).await, CycleOutcome::Inactive);
        assert_eq!(locked.last_capture(), None);
        assert_eq!(capturer.acquired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn activity_check_runs_off_the_runtime_thread() {
        let dir = TempDir::new().unwrap();
        let probe = Arc::new(ThreadRecordingProbe::default());
        let config = ConfigManager::with_path(dir.path().join("config.json")).unwrap();
        let eng = CaptureEngine::new(Arc::new(FakeCapturer::default()), probe.clone(), config);

        assert_eq!(eng.tick_at(monday(10, 0)).await, CycleOutcome::Captured(1));
        let threads = probe.threads.lock().clone();
        assert_eq!(threads.len(), 1);
        // current_thread 런타임: 테스트 스레드가 곧 런타임 스레드
        assert_ne!(threads[0], std::thread::current().id());
    }

    #[tokio::test]
    async fn failed_activity_check_counts_as_active() {
        let dir = TempDir::new().unwrap();
        let config = ConfigManager::with_path(dir.path().join("config.json")).unwrap();
        let eng = CaptureEngine::new(
            Arc::new(FakeCapturer::default()),
            Arc::new(PanickingProbe),
            config,
        );

        assert_eq!(eng.tick_at(monday(10, 0)).await, CycleOutcome::Captured(1));
    }

    #[tokio::test]
    async fn merge_produces_single_record() {
        let dir = TempDir::new().unwrap();
        let capturer = Arc::new(FakeCapturer::default());
        let eng = engine(&dir, capturer.clone(), ActivityReport::active(), vec![0, 1], true);

        assert_eq!(eng.tick_at(monday(11, 0)).await, CycleOutcome::Captured(1));
        assert_eq!(capturer.acquired.load(Ordering::SeqCst), 2);
        assert_eq!(capturer.merged.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_screen_does_not_abort_cycle() {
        let dir = TempDir::new().unwrap();
        let capturer = Arc::new(FakeCapturer {
            fail_screen: Some(1),
            ..FakeCapturer::default()
        });
        let eng = engine(&dir, capturer, ActivityReport::active(), vec![0, 1], false);

        assert_eq!(eng.tick_at(monday(11, 0)).await, CycleOutcome::Captured(1));
        assert_matches!(eng.capture_now(Some(1)).await, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn start_stop_state_machine() {
        let dir = TempDir::new().unwrap();
        let eng = engine(
            &dir,
            Arc::new(FakeCapturer::default()),
            ActivityReport::active(),
            vec![0],
            false,
        );

        assert!(!eng.is_running());
        assert_matches!(eng.stop().await, Err(CoreError::StateConflict(_)));

        eng.start().await.unwrap();
        assert!(eng.is_running());
        assert_matches!(eng.start().await, Err(CoreError::StateConflict(_)));
        assert!(eng.is_running());

        eng.stop().await.unwrap();
        assert!(!eng.is_running());
        assert_matches!(eng.stop().await, Err(CoreError::StateConflict(_)));

        // 재시작 가능
        eng.start().await.unwrap();
        eng.stop().await.unwrap();
    }

    #[tokio::test]
    async fn capture_now_ignores_gate() {
        let dir = TempDir::new().unwrap();
        let eng = engine(
            &dir,
            Arc::new(FakeCapturer::default()),
            ActivityReport::from_flags(true, true),
            vec![0],
            false,
        );

        let records = eng.capture_now(None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(eng.last_capture().is_some());
    }
}
