//! 요약 마크다운 리포트.
//!
//! 분석이 끝난 요약을
//! `<base_dir>/summaries/summary_{구간 시작}-{구간 끝}_{작성 시각}.md`로 남긴다.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use worktrack_core::error::CoreError;
use worktrack_core::models::summary::SummaryRecord;

/// 리포트 하위 디렉토리 이름
const REPORT_DIR: &str = "summaries";

/// 요약 리포트 작성기
pub struct SummaryReportWriter {
    dir: PathBuf,
}

impl SummaryReportWriter {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            dir: base_dir.join(REPORT_DIR),
        }
    }

    /// 리포트 디렉토리
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 리포트 파일 작성, 파일 경로 반환
    ///
    /// 같은 초에 같은 구간을 다시 쓸 때만 덮어쓴다.
    pub async fn write(
        &self,
        summary: &SummaryRecord,
        generated_at: DateTime<Local>,
    ) -> Result<PathBuf, CoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CoreError::Internal(format!("리포트 디렉토리 생성 실패: {e}")))?;

        let path = self.dir.join(report_file_name(summary, generated_at));
        fs::write(&path, render_markdown(summary, generated_at))
            .await
            .map_err(|e| CoreError::Internal(format!("리포트 파일 저장 실패: {e}")))?;

        info!("분석 리포트 저장: {}", path.display());
        Ok(path)
    }
}

/// `summary_20260615_090312-100000_20260615_100003.md`
fn report_file_name(summary: &SummaryRecord, generated_at: DateTime<Local>) -> String {
    format!(
        "summary_{}-{}_{}.md",
        summary.start_time.format("%Y%m%d_%H%M%S"),
        summary.end_time.format("%H%M%S"),
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

/// 요약 → 마크다운
pub fn render_markdown(summary: &SummaryRecord, generated_at: DateTime<Local>) -> String {
    let mut md = String::new();
    let minutes = (summary.end_time - summary.start_time).num_minutes();

    md.push_str("# 작업 분석 리포트\n\n");
    md.push_str(&format!(
        "**분석 시각**: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    md.push_str(&format!(
        "**작업 구간**: {} - {}\n\n",
        summary.start_time.format("%H:%M"),
        summary.end_time.format("%H:%M")
    ));
    md.push_str(&format!("**총 시간**: {minutes}분\n\n"));
    md.push_str("---\n\n");

    md.push_str("## 작업 요약\n\n");
    md.push_str(&summary.summary);
    md.push_str("\n\n");

    if !summary.activities.is_empty() {
        md.push_str("## 활동 상세\n\n");
        for (i, activity) in summary.activities.iter().enumerate() {
            md.push_str(&format!("### {}. {}\n\n", i + 1, activity.name));
            md.push_str(&format!("- **분류**: {}\n", activity.category));
            md.push_str(&format!("- **시간**: {}분\n", activity.duration_minutes));
            if !activity.apps.is_empty() {
                md.push_str(&format!("- **사용 앱**: {}\n", activity.apps.join(", ")));
            }
            md.push('\n');
        }
    }

    if !summary.app_usage.is_empty() {
        md.push_str("## 앱 사용 통계\n\n");
        md.push_str("| 앱 | 사용 시간 |\n");
        md.push_str("|----|----------|\n");
        for (app, minutes) in &summary.app_usage {
            md.push_str(&format!("| {app} | {minutes}분 |\n"));
        }
        md.push('\n');
    }

    md
}
