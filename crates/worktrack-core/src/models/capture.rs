//! 캡처 모델.
//!
//! 화면 정보, 획득된 프레임(픽셀), 저장된 캡처 레코드.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 병합 캡처를 나타내는 소스 인덱스 (DB 저장값)
pub const MERGED_SOURCE_INDEX: i32 = -1;

/// 캡처 소스 — 단일 화면 또는 병합 이미지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureSource {
    /// 단일 화면 (화면 인덱스)
    Screen(usize),
    /// 모든 화면을 합친 이미지
    Merged,
}

impl CaptureSource {
    /// DB 저장용 정수 인덱스 (병합은 -1)
    pub fn index(&self) -> i32 {
        match self {
            CaptureSource::Screen(i) => *i as i32,
            CaptureSource::Merged => MERGED_SOURCE_INDEX,
        }
    }

    /// DB 정수 인덱스에서 복원
    pub fn from_index(index: i32) -> Self {
        if index < 0 {
            CaptureSource::Merged
        } else {
            CaptureSource::Screen(index as usize)
        }
    }
}

/// 가상 데스크톱 좌표계에서의 화면 영역
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenBounds {
    /// 오른쪽 끝 x (배타적)
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// 아래쪽 끝 y (배타적)
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// 화면 정보 (열거 결과)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenInfo {
    /// 화면 인덱스
    pub index: usize,
    /// 화면 이름
    pub name: String,
    /// 화면 영역
    pub bounds: ScreenBounds,
    /// 주 화면 여부
    pub is_primary: bool,
}

/// 획득된 프레임 (RGBA 픽셀, 저장 전)
#[derive(Clone)]
pub struct CapturedFrame {
    /// 캡처 소스
    pub source: CaptureSource,
    /// 가상 데스크톱 좌표계에서의 영역
    pub bounds: ScreenBounds,
    /// RGBA8 픽셀 (width * height * 4)
    pub rgba: Vec<u8>,
}

impl CapturedFrame {
    pub fn width(&self) -> u32 {
        self.bounds.width
    }

    pub fn height(&self) -> u32 {
        self.bounds.height
    }
}

impl std::fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("source", &self.source)
            .field("bounds", &self.bounds)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// 저장 요청 (ID 발급 전)
#[derive(Debug, Clone)]
pub struct NewCapture {
    /// 캡처 시각
    pub timestamp: DateTime<Local>,
    /// 캡처 소스
    pub source: CaptureSource,
    /// 이미지 파일 경로
    pub file_path: String,
    /// 파일 크기 (바이트)
    pub size_bytes: u64,
    /// 해상도 (너비, 높이)
    pub resolution: (u32, u32),
}

/// 저장된 캡처 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// 레코드 ID
    pub id: i64,
    /// 캡처 시각
    pub timestamp: DateTime<Local>,
    /// 캡처 소스
    pub source: CaptureSource,
    /// 이미지 파일 경로
    pub file_path: String,
    /// 파일 크기 (바이트)
    pub size_bytes: u64,
    /// 해상도 ("WxH")
    pub resolution: String,
    /// 요약에 사용되었는지 여부
    pub analyzed: bool,
}

/// "WxH" 해상도 문자열
pub fn format_resolution(width: u32, height: u32) -> String {
    format!("{width}x{height}")
}
