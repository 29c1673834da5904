//! 요약 레코드 스토리지 (SummaryStorage 포트 구현).
//!
//! 활동 목록과 앱 사용량은 JSON 컬럼으로 저장한다.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use rusqlite::{ErrorCode, Row};
use tracing::{debug, info};
use worktrack_core::error::CoreError;
use worktrack_core::models::summary::SummaryRecord;
use worktrack_core::models::window::AnalysisWindow;
use worktrack_core::ports::storage::SummaryStorage;

use super::{from_db_time, to_db_time, SqliteStorage};

struct SummaryRow {
    id: i64,
    start_time: String,
    end_time: String,
    summary: String,
    activities: String,
    app_usage: String,
    created_at: String,
}

impl SummaryRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            start_time: row.get(1)?,
            end_time: row.get(2)?,
            summary: row.get(3)?,
            activities: row.get(4)?,
            app_usage: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<SummaryRecord, CoreError> {
        Ok(SummaryRecord {
            id: Some(self.id),
            start_time: from_db_time(&self.start_time)?,
            end_time: from_db_time(&self.end_time)?,
            summary: self.summary,
            activities: serde_json::from_str(&self.activities)?,
            app_usage: serde_json::from_str(&self.app_usage)?,
            created_at: from_db_time(&self.created_at)?,
        })
    }
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl SummaryStorage for SqliteStorage {
    async fn save_summary(&self, summary: &SummaryRecord) -> Result<i64, CoreError> {
        let activities = serde_json::to_string(&summary.activities)?;
        let app_usage = serde_json::to_string(&summary.app_usage)?;
        let window = summary.window();
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO summaries (start_time, end_time, summary, activities, app_usage, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                to_db_time(&summary.start_time),
                to_db_time(&summary.end_time),
                summary.summary,
                activities,
                app_usage,
                to_db_time(&summary.created_at),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                CoreError::Duplicate(format!("요약 {window}"))
            } else {
                CoreError::Internal(format!("요약 저장 실패: {e}"))
            }
        })?;

        let id = conn.last_insert_rowid();
        debug!("요약 저장: id={id}, {window}");
        Ok(id)
    }

    async fn replace_summary(&self, summary: &SummaryRecord) -> Result<i64, CoreError> {
        let activities = serde_json::to_string(&summary.activities)?;
        let app_usage = serde_json::to_string(&summary.app_usage)?;
        let window = summary.window();
        let start = to_db_time(&summary.start_time);
        let end = to_db_time(&summary.end_time);

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| CoreError::Internal(format!("트랜잭션 시작 실패: {e}")))?;

        let replaced = tx
            .execute(
                "DELETE FROM summaries WHERE start_time = ?1 AND end_time = ?2",
                rusqlite::params![start, end],
            )
            .map_err(|e| CoreError::Internal(format!("기존 요약 삭제 실패: {e}")))?;

        tx.execute(
            "INSERT INTO summaries (start_time, end_time, summary, activities, app_usage, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                start,
                end,
                summary.summary,
                activities,
                app_usage,
                to_db_time(&summary.created_at),
            ],
        )
        .map_err(|e| CoreError::Internal(format!("요약 저장 실패: {e}")))?;
        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| CoreError::Internal(format!("트랜잭션 커밋 실패: {e}")))?;

        debug!("요약 대체: id={id}, {window} (기존 {replaced}건)");
        Ok(id)
    }

    async fn has_summary(&self, window: &AnalysisWindow) -> Result<bool, CoreError> {
        let conn = self.lock()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM summaries WHERE start_time = ?1 AND end_time = ?2",
                rusqlite::params![to_db_time(&window.start), to_db_time(&window.end)],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::Internal(format!("요약 존재 확인 실패: {e}")))?;

        Ok(count > 0)
    }

    async fn get_summaries(
        &self,
        from: DateTime<Local>,
        to: DateTime<Local>,
    ) -> Result<Vec<SummaryRecord>, CoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, start_time, end_time, summary, activities, app_usage, created_at
                 FROM summaries
                 WHERE start_time >= ?1 AND start_time < ?2
                 ORDER BY start_time ASC",
            )
            .map_err(|e| CoreError::Internal(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map(
                rusqlite::params![to_db_time(&from), to_db_time(&to)],
                SummaryRow::read,
            )
            .map_err(|e| CoreError::Internal(format!("쿼리 실행 실패: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let row = row.map_err(|e| CoreError::Internal(format!("행 읽기 실패: {e}")))?;
            records.push(row.into_record()?);
        }
        Ok(records)
    }

    async fn delete_summaries_between(
        &self,
        from: DateTime<Local>,
        to: DateTime<Local>,
    ) -> Result<usize, CoreError> {
        let conn = self.lock()?;

        let deleted = conn
            .execute(
                "DELETE FROM summaries WHERE start_time >= ?1 AND start_time < ?2",
                rusqlite::params![to_db_time(&from), to_db_time(&to)],
            )
            .map_err(|e| CoreError::Internal(format!("요약 삭제 실패: {e}")))?;

        info!("요약 삭제: {deleted}건");
        Ok(deleted)
    }
}
