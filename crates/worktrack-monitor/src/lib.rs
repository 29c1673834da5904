//! # worktrack-monitor
//!
//! 머신 활동 프로브 어댑터.
//! 화면 잠금/화면보호기 상태를 감지해 캡처 게이트에 보고한다.
//! 플랫폼별(macOS, Windows, Linux) 네이티브 API를 통해 구현하며,
//! 그 외 플랫폼은 항상 활성으로 보고한다.

pub mod screen_state;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "linux")]
pub mod linux;
