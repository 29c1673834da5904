//! 도메인 모델.
//!
//! 캡처 레코드, 분석 윈도우, 요약 레코드 등 컴포넌트 간에 주고받는 값 타입.

pub mod capture;
pub mod summary;
pub mod window;
