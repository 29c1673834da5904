//! # worktrack-network
//!
//! 분석 어댑터 크레이트.
//! 분석 윈도우의 스크린샷을 샘플링해 OpenAI 호환 비전 API에 보내고,
//! 응답을 구조화된 요약으로 파싱하는 `Analyzer` 포트 구현을 담당한다.

pub mod ai_vision_client;
