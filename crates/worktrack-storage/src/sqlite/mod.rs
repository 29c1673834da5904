//! SQLite 저장소 어댑터.
//!
//! `CaptureStorage` + `SummaryStorage` 포트 구현.
//!
//! # 모듈 구조
//! - `captures`: 캡처 레코드 저장/조회/보존 정리 (CaptureStorage 포트)
//! - `summaries`: 요약 레코드 저장/조회/대체 (SummaryStorage 포트)
//!
//! 시각은 밀리초 정밀도의 UTC RFC3339 문자열(`Z` 접미사)로 저장한다.
//! 고정 폭이므로 문자열 비교가 시간 순서와 일치한다.

mod captures;
mod summaries;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use worktrack_core::error::CoreError;
use worktrack_core::schedule::start_of_day;

use crate::migration;

/// SQLite 저장소 — `CaptureStorage` + `SummaryStorage` 포트 구현
pub struct SqliteStorage {
    pub(super) conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// 파일 기반 SQLite 저장소 생성
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path)
            .map_err(|e| CoreError::Internal(format!("SQLite 열기 실패: {e}")))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA busy_timeout=5000;
            PRAGMA temp_store=MEMORY;
            ",
        )
        .map_err(|e| CoreError::Internal(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Internal(format!("마이그레이션 실패: {e}")))?;

        info!("SQLite 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Internal(format!("인메모리 SQLite 생성 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Internal(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(super) fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))
    }

    /// 전체 캡처 저장 통계
    pub fn storage_stats(&self) -> Result<StorageStats, CoreError> {
        let conn = self.lock()?;

        let (count, total, oldest, newest): (i64, i64, Option<String>, Option<String>) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(file_size), 0), MIN(timestamp), MAX(timestamp)
                 FROM captures",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .map_err(|e| CoreError::Internal(format!("저장 통계 조회 실패: {e}")))?;

        Ok(StorageStats {
            total_captures: count as u64,
            total_bytes: total as u64,
            oldest: oldest.as_deref().map(from_db_time).transpose()?,
            newest: newest.as_deref().map(from_db_time).transpose()?,
        })
    }

    /// `now`가 속한 날의 자정 이후 통계
    pub fn today_stats(&self, now: DateTime<Local>) -> Result<TodayStats, CoreError> {
        let midnight = to_db_time(&start_of_day(now.date_naive())?);
        let conn = self.lock()?;

        let (captures, analyzed): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(analyzed), 0) FROM captures WHERE timestamp >= ?1",
                [&midnight],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| CoreError::Internal(format!("오늘 캡처 통계 조회 실패: {e}")))?;

        let summaries: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM summaries WHERE start_time >= ?1",
                [&midnight],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::Internal(format!("오늘 요약 통계 조회 실패: {e}")))?;

        Ok(TodayStats {
            captures: captures as u64,
            analyzed_captures: analyzed as u64,
            summaries: summaries as u64,
        })
    }
}

/// 전체 캡처 저장 통계
#[derive(Debug, Clone, PartialEq)]
pub struct StorageStats {
    /// 캡처 레코드 수
    pub total_captures: u64,
    /// 파일 크기 합계 (바이트)
    pub total_bytes: u64,
    /// 가장 오래된 캡처 시각
    pub oldest: Option<DateTime<Local>>,
    /// 가장 최근 캡처 시각
    pub newest: Option<DateTime<Local>>,
}

/// 오늘 통계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodayStats {
    pub captures: u64,
    pub analyzed_captures: u64,
    pub summaries: u64,
}

/// 로컬 시각 → DB 저장 문자열
pub(crate) fn to_db_time(t: &DateTime<Local>) -> String {
    t.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// DB 저장 문자열 → 로컬 시각
pub(crate) fn from_db_time(s: &str) -> Result<DateTime<Local>, CoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Local))
        .map_err(|e| CoreError::Internal(format!("시각 파싱 실패 ({s}): {e}")))
}
