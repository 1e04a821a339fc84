//! Process lifecycle: start the server, wait for a termination signal, drain.
//!
//! ```text
//! Starting --listener bound--> Running --SIGINT/SIGTERM--> Draining --drained or deadline--> Stopped
//! Starting --bind failure--> Stopped
//! ```
//!
//! SIGKILL cannot be caught by a process; SIGTERM is its catchable
//! counterpart and is treated the same as an interrupt.

use std::future::Future;

use axum::Router;
use tokio::sync::{oneshot, watch};

use crate::config::ServerConfig;
use crate::server::{Server, ServerError, ShutdownRequest};

/// Where the server is in its lifecycle. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// Task spawned, listener not yet bound.
    Starting,
    /// Accepting and serving connections.
    Running,
    /// No longer accepting; open connections are finishing.
    Draining,
    /// Terminal.
    Stopped,
}

/// Resolves on the first SIGINT (Ctrl+C) or SIGTERM.
///
/// If a handler cannot be installed the failure is logged and that signal is
/// never observed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}

/// Drives one server from start to stop.
pub struct LifecycleController {
    server: Server,
    state: watch::Receiver<LifecycleState>,
}

impl LifecycleController {
    /// Controller for a server built from `config` and `router`.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let server = Server::new(config, router);
        let state = server.subscribe();
        Self { server, state }
    }

    /// Watch the lifecycle state.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.clone()
    }

    /// Start the server in the background, wait for `signal`, then drain.
    ///
    /// Returns once the server is stopped. A bind failure ends the run early
    /// with [`ServerError::Bind`] without waiting for the signal.
    pub async fn run_until<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let shutdown_window = self.server.config().timeouts.shutdown;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let mut serving = tokio::spawn(self.server.run(shutdown_rx));

        tokio::select! {
            result = &mut serving => {
                // Only reachable before a shutdown was requested, i.e. bind failed.
                let result = result?;
                if let Err(e) = &result {
                    tracing::error!(error = %e, "Server failed to start");
                }
                return result;
            }
            _ = signal => {}
        }

        let request = ShutdownRequest::within(shutdown_window);
        tracing::info!(
            timeout_secs = shutdown_window.as_secs_f64(),
            "Shutting down"
        );
        // The receiver only goes away if the server task already finished.
        let _ = shutdown_tx.send(request);

        serving.await?
    }

    /// Same as [`run_until`](Self::run_until) with the OS termination signals.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_ordered() {
        assert!(LifecycleState::Starting < LifecycleState::Running);
        assert!(LifecycleState::Running < LifecycleState::Draining);
        assert!(LifecycleState::Draining < LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_bind_failure_stops_without_signal() {
        let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = occupied.local_addr().unwrap().to_string();

        let controller = LifecycleController::new(ServerConfig::new(address), Router::new());
        let state = controller.subscribe();

        let result = controller.run_until(std::future::pending()).await;

        assert!(matches!(result, Err(ServerError::Bind { .. })));
        assert_eq!(*state.borrow(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_signal_with_no_traffic_stops() {
        let controller =
            LifecycleController::new(ServerConfig::new("127.0.0.1:0"), Router::new());
        let mut state = controller.subscribe();

        let (tx, rx) = oneshot::channel::<()>();
        let run = tokio::spawn(controller.run_until(async {
            let _ = rx.await;
        }));

        state
            .wait_for(|s| *s == LifecycleState::Running)
            .await
            .unwrap();
        tx.send(()).unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), run)
            .await
            .expect("controller did not stop in time")
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(*state.borrow(), LifecycleState::Stopped);
    }
}
