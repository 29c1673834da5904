//! # worktrack-vision
//!
//! 화면 캡처 어댑터 크레이트.
//! xcap 기반 화면 열거/획득, 다중 화면 병합, 리사이즈와 JPEG 인코딩을 거쳐
//! 스크린샷 파일과 캡처 레코드를 남기는 `ScreenCapturer` 포트 구현을 담당한다.

pub mod capture;
pub mod capturer;
pub mod encoder;
pub mod merge;
