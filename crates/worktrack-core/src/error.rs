//! WorkTrack 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 외부 에러를 `CoreError`로 변환해서 반환한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류 (시각 형식, 트리거 계산 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Screen", "Capture")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 상태 충돌 (실행 중 재시작, 정지 상태에서 정지)
    #[error("상태 충돌: {0}")]
    StateConflict(String),

    /// 처리할 데이터 없음
    #[error("데이터 없음: {0}")]
    NoData(String),

    /// 동일 키 레코드 중복
    #[error("중복 레코드: {0}")]
    Duplicate(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}
