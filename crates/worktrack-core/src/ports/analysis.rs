//! 분석 협력자 포트.
//!
//! 구현: `worktrack-network` crate (OpenAI 호환 비전 API)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::summary::SummaryRecord;
use crate::models::window::AnalysisWindow;

/// 윈도우 분석기
///
/// 윈도우 안의 캡처를 샘플링해 비전 모델에 보내고 구조화된 요약을 반환한다.
/// 저장은 하지 않는다. 실패는 단일 에러로 전달된다.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// 윈도우 분석
    async fn analyze(&self, window: &AnalysisWindow) -> Result<SummaryRecord, CoreError>;
}
