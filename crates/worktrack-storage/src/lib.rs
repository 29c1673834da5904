//! # worktrack-storage
//!
//! 로컬 저장소 어댑터.
//! SQLite 기반 캡처/요약 레코드 저장, 스키마 마이그레이션,
//! 일자별 스크린샷 파일 저장과 마크다운 요약 리포트를 관리한다.
//!
//! ## 모듈
//! - `sqlite`: 캡처/요약 저장소 (CaptureStorage, SummaryStorage 구현)
//! - `screenshot_storage`: 스크린샷 이미지 파일 저장소
//! - `report`: 요약 마크다운 리포트 작성
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod report;
pub mod screenshot_storage;
pub mod sqlite;
