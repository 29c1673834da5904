//! 캡처 레코드 스토리지 (CaptureStorage 포트 구현).
//!
//! 캡처 저장, 윈도우 조회, 분석 완료 마킹, 보존 정리.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use rusqlite::Row;
use tracing::{debug, info};
use worktrack_core::error::CoreError;
use worktrack_core::models::capture::{
    format_resolution, CaptureRecord, CaptureSource, NewCapture,
};
use worktrack_core::models::window::AnalysisWindow;
use worktrack_core::ports::storage::CaptureStorage;

use super::{from_db_time, to_db_time, SqliteStorage};

const CAPTURE_COLUMNS: &str =
    "id, timestamp, screen_index, file_path, file_size, resolution, analyzed";

/// 캡처 테이블 행 (시각은 저장 문자열 그대로)
struct CaptureRow {
    id: i64,
    timestamp: String,
    screen_index: i32,
    file_path: String,
    file_size: i64,
    resolution: String,
    analyzed: bool,
}

impl CaptureRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            screen_index: row.get(2)?,
            file_path: row.get(3)?,
            file_size: row.get(4)?,
            resolution: row.get(5)?,
            analyzed: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<CaptureRecord, CoreError> {
        Ok(CaptureRecord {
            id: self.id,
            timestamp: from_db_time(&self.timestamp)?,
            source: CaptureSource::from_index(self.screen_index),
            file_path: self.file_path,
            size_bytes: self.file_size.max(0) as u64,
            resolution: self.resolution,
            analyzed: self.analyzed,
        })
    }
}

impl SqliteStorage {
    fn collect_captures(
        rows: impl Iterator<Item = rusqlite::Result<CaptureRow>>,
    ) -> Result<Vec<CaptureRecord>, CoreError> {
        let mut records = Vec::new();
        for row in rows {
            let row = row.map_err(|e| CoreError::Internal(format!("행 읽기 실패: {e}")))?;
            records.push(row.into_record()?);
        }
        Ok(records)
    }

    /// 최근 캡처 조회 (최신순)
    pub fn recent_captures(&self, limit: usize) -> Result<Vec<CaptureRecord>, CoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CAPTURE_COLUMNS} FROM captures ORDER BY timestamp DESC LIMIT ?1"
            ))
            .map_err(|e| CoreError::Internal(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map([limit as i64], CaptureRow::read)
            .map_err(|e| CoreError::Internal(format!("쿼리 실행 실패: {e}")))?;

        Self::collect_captures(rows)
    }

    /// 윈도우 조건절 (`timestamp >= ?1 AND timestamp < ?2` 또는 `<= ?2`)
    fn window_clause(window: &AnalysisWindow) -> &'static str {
        if window.end_inclusive {
            "timestamp >= ?1 AND timestamp <= ?2"
        } else {
            "timestamp >= ?1 AND timestamp < ?2"
        }
    }
}

#[async_trait]
impl CaptureStorage for SqliteStorage {
    async fn save_capture(&self, capture: &NewCapture) -> Result<CaptureRecord, CoreError> {
        let resolution = format_resolution(capture.resolution.0, capture.resolution.1);
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO captures (timestamp, screen_index, file_path, file_size, resolution)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                to_db_time(&capture.timestamp),
                capture.source.index(),
                capture.file_path,
                capture.size_bytes as i64,
                resolution,
            ],
        )
        .map_err(|e| CoreError::Internal(format!("캡처 저장 실패: {e}")))?;

        let id = conn.last_insert_rowid();
        debug!("캡처 저장: id={id}, file={}", capture.file_path);

        Ok(CaptureRecord {
            id,
            timestamp: capture.timestamp,
            source: capture.source,
            file_path: capture.file_path.clone(),
            size_bytes: capture.size_bytes,
            resolution,
            analyzed: false,
        })
    }

    async fn get_captures(&self, window: &AnalysisWindow) -> Result<Vec<CaptureRecord>, CoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CAPTURE_COLUMNS} FROM captures WHERE {} ORDER BY timestamp ASC, id ASC",
                Self::window_clause(window)
            ))
            .map_err(|e| CoreError::Internal(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map(
                rusqlite::params![to_db_time(&window.start), to_db_time(&window.end)],
                CaptureRow::read,
            )
            .map_err(|e| CoreError::Internal(format!("쿼리 실행 실패: {e}")))?;

        Self::collect_captures(rows)
    }

    async fn count_captures(&self, window: &AnalysisWindow) -> Result<usize, CoreError> {
        let conn = self.lock()?;

        let count: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM captures WHERE {}",
                    Self::window_clause(window)
                ),
                rusqlite::params![to_db_time(&window.start), to_db_time(&window.end)],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::Internal(format!("캡처 수 조회 실패: {e}")))?;

        Ok(count as usize)
    }

    async fn mark_analyzed(&self, ids: &[i64]) -> Result<(), CoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| CoreError::Internal(format!("트랜잭션 시작 실패: {e}")))?;

        {
            let mut stmt = tx
                .prepare_cached("UPDATE captures SET analyzed = 1 WHERE id = ?1")
                .map_err(|e| CoreError::Internal(format!("쿼리 준비 실패: {e}")))?;
            for id in ids {
                stmt.execute([id])
                    .map_err(|e| CoreError::Internal(format!("분석 완료 마킹 실패: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| CoreError::Internal(format!("트랜잭션 커밋 실패: {e}")))?;

        debug!("분석 완료 마킹: {}건", ids.len());
        Ok(())
    }

    async fn purge_captures_before(&self, cutoff: DateTime<Local>) -> Result<usize, CoreError> {
        let cutoff = to_db_time(&cutoff);
        let conn = self.lock()?;

        let paths: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT file_path FROM captures WHERE timestamp < ?1")
                .map_err(|e| CoreError::Internal(format!("쿼리 준비 실패: {e}")))?;
            let rows = stmt
                .query_map([&cutoff], |row| row.get(0))
                .map_err(|e| CoreError::Internal(format!("쿼리 실행 실패: {e}")))?;
            rows.filter_map(|r| r.ok()).collect()
        };

        // 파일 삭제 실패는 무시 (이미 지워진 파일 등)
        for path in &paths {
            if let Err(e) = std::fs::remove_file(path) {
                debug!("스크린샷 파일 삭제 건너뜀 {path}: {e}");
            }
        }

        let deleted = conn
            .execute("DELETE FROM captures WHERE timestamp < ?1", [&cutoff])
            .map_err(|e| CoreError::Internal(format!("캡처 삭제 실패: {e}")))?;

        if deleted > 0 {
            info!("보존 기간 경과 캡처 삭제: {deleted}건 (기준 {cutoff})");
        }
        Ok(deleted)
    }
}
