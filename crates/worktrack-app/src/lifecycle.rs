//! 종료 시그널 대기.
//!
//! 상주 모드는 SIGINT/SIGTERM(그 외 플랫폼은 Ctrl+C) 중 하나를 받으면
//! 스케줄러와 캡처 엔진을 정지하고 끝난다.

use std::fmt;
use tracing::{info, warn};

/// 수신한 종료 요청
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// 등록된 종료 시그널 핸들러
///
/// 핸들러는 `install` 시점에 등록되므로, 그 이후 도착한 시그널은 `recv`에서 받는다.
pub struct ShutdownListener {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownListener {
    /// 시그널 핸들러 등록 (tokio 런타임 안에서 호출)
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// 다음 종료 시그널까지 대기
    #[cfg(unix)]
    pub async fn recv(&mut self) -> ShutdownSignal {
        let signal = tokio::select! {
            _ = self.interrupt.recv() => ShutdownSignal::Interrupt,
            _ = self.terminate.recv() => ShutdownSignal::Terminate,
        };
        info!("{signal} 수신");
        signal
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> ShutdownSignal {
        wait_ctrl_c().await
    }
}

/// 종료 시그널 대기
///
/// 핸들러 등록에 실패하면 Ctrl+C 대기로 대체한다.
pub async fn wait_for_shutdown() -> ShutdownSignal {
    match ShutdownListener::install() {
        Ok(mut listener) => listener.recv().await,
        Err(e) => {
            warn!("시그널 핸들러 등록 실패, Ctrl+C 대기: {e}");
            wait_ctrl_c().await
        }
    }
}

async fn wait_ctrl_c() -> ShutdownSignal {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl+C 핸들러 등록 실패: {e}");
    } else {
        info!("Ctrl+C 수신");
    }
    ShutdownSignal::Interrupt
}
