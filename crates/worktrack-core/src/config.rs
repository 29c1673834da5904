//! 애플리케이션 설정 구조체.
//!
//! 캡처 주기, 근무 시간 스케줄, 분석 API, 저장소 경로 등 런타임 설정을 정의한다.
//! `ConfigManager`를 통해 JSON 파일에서 로드되며, 각 컴포넌트는 읽는 시점의 복제본을 사용한다.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 스크린 캡처 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 근무 시간 스케줄 설정
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// 분석(비전 모델) 설정
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

// ============================================================
// 캡처 설정
// ============================================================

/// 스크린 캡처 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 캡처 간격 (초)
    #[serde(default = "default_capture_interval_secs")]
    pub interval_secs: u64,
    /// 캡처할 화면 인덱스 목록
    #[serde(default = "default_selected_screens")]
    pub selected_screens: Vec<usize>,
    /// 다중 화면을 하나의 이미지로 병합
    #[serde(default)]
    pub merge_screens: bool,
    /// JPEG 품질 (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// 최대 너비 (0이면 리사이즈 안 함)
    #[serde(default)]
    pub max_width: u32,
    /// 최대 높이 (0이면 리사이즈 안 함)
    #[serde(default)]
    pub max_height: u32,
    /// 프로세스 시작 시 캡처 자동 시작
    #[serde(default)]
    pub enabled: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_capture_interval_secs(),
            selected_screens: default_selected_screens(),
            merge_screens: false,
            jpeg_quality: default_jpeg_quality(),
            max_width: 0,
            max_height: 0,
            enabled: false,
        }
    }
}

impl CaptureConfig {
    /// 캡처 간격을 Duration으로 반환
    pub fn interval(&self) -> Result<Duration, CoreError> {
        if self.interval_secs == 0 {
            return Err(CoreError::Validation {
                field: "capture.interval_secs".to_string(),
                message: "0보다 커야 합니다".to_string(),
            });
        }
        Ok(Duration::from_secs(self.interval_secs))
    }
}

// ============================================================
// 스케줄 설정
// ============================================================

/// 요일
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    /// cron 요일 번호 (0=일요일)
    pub fn cron_index(self) -> u8 {
        match self {
            Weekday::Sun => 0,
            Weekday::Mon => 1,
            Weekday::Tue => 2,
            Weekday::Wed => 3,
            Weekday::Thu => 4,
            Weekday::Fri => 5,
            Weekday::Sat => 6,
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Mon,
            chrono::Weekday::Tue => Weekday::Tue,
            chrono::Weekday::Wed => Weekday::Wed,
            chrono::Weekday::Thu => Weekday::Thu,
            chrono::Weekday::Fri => Weekday::Fri,
            chrono::Weekday::Sat => Weekday::Sat,
            chrono::Weekday::Sun => Weekday::Sun,
        }
    }
}

/// 근무 시간 스케줄 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 근무 시작 시각 ("HH:MM")
    #[serde(default = "default_start_time")]
    pub start_time: String,
    /// 근무 종료 시각 ("HH:MM")
    #[serde(default = "default_end_time")]
    pub end_time: String,
    /// 근무 요일 목록
    #[serde(default = "default_work_days")]
    pub work_days: Vec<Weekday>,
    /// 주기 분석 간격 (분)
    #[serde(default = "default_analysis_interval_minutes")]
    pub analysis_interval_minutes: u32,
    /// 스케줄 제한 활성화 (false면 캡처 게이트 항상 통과)
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            start_time: default_start_time(),
            end_time: default_end_time(),
            work_days: default_work_days(),
            analysis_interval_minutes: default_analysis_interval_minutes(),
            enabled: true,
        }
    }
}

/// 파싱된 근무 시간대
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ScheduleConfig {
    /// "HH:MM" 시작/종료 시각 파싱
    pub fn work_hours(&self) -> Result<WorkHours, CoreError> {
        Ok(WorkHours {
            start: parse_clock(&self.start_time)?,
            end: parse_clock(&self.end_time)?,
        })
    }

    /// 분석 간격을 chrono Duration으로 반환
    pub fn analysis_interval(&self) -> Result<chrono::Duration, CoreError> {
        if self.analysis_interval_minutes == 0 {
            return Err(CoreError::Validation {
                field: "schedule.analysis_interval_minutes".to_string(),
                message: "0보다 커야 합니다".to_string(),
            });
        }
        Ok(chrono::Duration::minutes(
            self.analysis_interval_minutes as i64,
        ))
    }

    /// 해당 요일이 근무일인지 확인
    pub fn is_work_day(&self, day: chrono::Weekday) -> bool {
        self.work_days.contains(&Weekday::from(day))
    }
}

/// "HH:MM" 형식 시각 파싱
pub fn parse_clock(value: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| CoreError::Config(format!("시각 형식 오류 '{value}': {e}")))
}

// ============================================================
// 분석 설정
// ============================================================

/// 비전 모델 분석 설정 (OpenAI 호환 API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// API URL (예: "https://api.openai.com/v1/chat/completions")
    #[serde(default = "default_analysis_endpoint")]
    pub endpoint: String,
    /// API 키 (로컬 config.json에 저장)
    #[serde(default)]
    pub api_key: String,
    /// 모델 이름
    #[serde(default = "default_model")]
    pub model: String,
    /// 최대 응답 토큰 수
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// 온도 파라미터
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// 1회 분석에 전송할 최대 이미지 수
    #[serde(default = "default_max_images")]
    pub max_images: usize,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_analysis_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_analysis_endpoint(),
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_images: default_max_images(),
            timeout_secs: default_analysis_timeout_secs(),
        }
    }
}

// ============================================================
// 저장소 설정
// ============================================================

/// 로컬 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 데이터 디렉토리 (None이면 플랫폼 기본 경로)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// 캡처 보존 기간 (일)
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            retention_days: default_retention_days(),
        }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            capture: CaptureConfig::default(),
            schedule: ScheduleConfig::default(),
            analysis: AnalysisConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_capture_interval_secs() -> u64 {
    3
}
fn default_selected_screens() -> Vec<usize> {
    vec![0]
}
fn default_jpeg_quality() -> u8 {
    75
}
fn default_start_time() -> String {
    "09:00".to_string()
}
fn default_end_time() -> String {
    "18:00".to_string()
}
fn default_work_days() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
}
fn default_analysis_interval_minutes() -> u32 {
    60
}
fn default_analysis_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_images() -> usize {
    20
}
fn default_analysis_timeout_secs() -> u64 {
    120
}
fn default_retention_days() -> u32 {
    30
}
