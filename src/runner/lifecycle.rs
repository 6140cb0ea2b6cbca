//! Process lifecycle: signal-driven cancellation
//!
//! [`LifecycleController`] is the only place that listens for OS signals. It
//! owns the root cancellation token of an invocation and cancels it once when
//! an interrupt or termination signal arrives.

use crate::runner::Context;
use std::io;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct LifecycleController {
    token: CancellationToken,
    listener: Option<JoinHandle<()>>,
}

impl LifecycleController {
    /// Derive a cancellable token from `base` and start listening for
    /// SIGINT/SIGTERM (Ctrl-C elsewhere).
    ///
    /// Must be called from within a Tokio runtime. Handlers are registered
    /// before this returns, so no signal is lost to the default action.
    pub fn start(base: &CancellationToken) -> io::Result<Self> {
        let token = base.child_token();
        let signals = ShutdownSignals::register()?;

        let listener_token = token.clone();
        let listener = tokio::spawn(async move {
            tokio::select! {
                name = signals.recv() => {
                    info!(signal = name, "received shutdown signal, cancelling");
                    listener_token.cancel();
                }
                _ = listener_token.cancelled() => {
                    debug!("lifecycle context finished");
                }
            }
        });

        Ok(LifecycleController {
            token,
            listener: Some(listener),
        })
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Root execution context bound to this controller's token
    pub fn context(&self) -> Context {
        Context::new().with_cancellation(self.token.clone())
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Finish the invocation: cancel the token and wait for the listener
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(listener) = self.listener.take() {
            let _ = listener.await;
        }
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

#[cfg(unix)]
struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(ShutdownSignals {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn register() -> io::Result<Self> {
        Ok(ShutdownSignals)
    }

    async fn recv(self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "ctrl-c",
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for ctrl-c");
                std::future::pending().await
            }
        }
    }
}
