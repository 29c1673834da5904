//! # worktrack-app
//!
//! 캡처 엔진, 분석 스케줄러, 당일 재생성기와 이들을 묶는 파이프라인.
//! 바이너리(`worktrack`)는 이 크레이트의 구성 요소를 DI로 조립한다.

pub mod analysis;
pub mod capture_engine;
pub mod lifecycle;
pub mod scheduler;
pub mod segment_planner;
pub mod task_runner;
