//! HTTP server with connection timeouts and deadline-bounded draining.
//!
//! The server owns the listener and publishes its [`LifecycleState`] on a
//! watch channel. It accepts connections until a [`ShutdownRequest`] arrives,
//! then drops the listener, lets every open connection finish the request it
//! is serving, and aborts whatever is still running when the request's
//! deadline passes.
//!
//! Per connection:
//! - once a request's first byte arrives, its headers must be complete
//!   within the read timeout,
//! - a response must be produced within the write timeout (408 otherwise),
//! - a keep-alive connection with nothing in flight closes after the idle
//!   timeout.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch, Notify};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tower::ServiceExt;
use tower_http::timeout::TimeoutLayer;

use crate::config::{ServerConfig, Timeouts};
use crate::lifecycle::LifecycleState;

/// Errors raised by the server and its lifecycle controller.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The listener could not be established.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The server task panicked or was cancelled.
    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Instruction to stop accepting work and drain by `deadline`.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownRequest {
    deadline: Instant,
}

impl ShutdownRequest {
    /// Drain window starting now.
    pub fn within(window: Duration) -> Self {
        Self {
            deadline: Instant::now() + window,
        }
    }

    /// Instant after which remaining connections are aborted.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// One HTTP server instance.
pub struct Server {
    config: ServerConfig,
    router: Router,
    state: watch::Sender<LifecycleState>,
}

impl Server {
    /// Create a server for `router`. Nothing is bound yet.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.timeouts.write,
        ));
        let (state, _) = watch::channel(LifecycleState::Starting);

        Self {
            config,
            router,
            state,
        }
    }

    /// Watch the server's lifecycle state.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Server settings.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address.
    ///
    /// A failure moves the server straight to [`LifecycleState::Stopped`].
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = self.config.listen_address();

        match TcpListener::bind(&address).await {
            Ok(listener) => Ok(listener),
            Err(source) => {
                self.state.send_replace(LifecycleState::Stopped);
                Err(ServerError::Bind { address, source })
            }
        }
    }

    /// Bind, then serve until shutdown completes.
    pub async fn run(
        self,
        shutdown: oneshot::Receiver<ShutdownRequest>,
    ) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serve connections from an already-bound listener.
    ///
    /// If the shutdown sender is dropped without sending, the server drains
    /// with the configured shutdown timeout.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: oneshot::Receiver<ShutdownRequest>,
    ) {
        let timeouts = self.config.timeouts;

        match listener.local_addr() {
            Ok(addr) => tracing::info!(%addr, "Listening"),
            Err(_) => tracing::info!(address = %self.config.bind_address, "Listening"),
        }
        self.state.send_replace(LifecycleState::Running);

        let mut connections = JoinSet::new();

        let request = loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        connections.spawn(serve_connection(
                            stream,
                            remote_addr,
                            self.router.clone(),
                            timeouts,
                            self.state.subscribe(),
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                request = &mut shutdown => {
                    break request.unwrap_or_else(|_| ShutdownRequest::within(timeouts.shutdown));
                }
            }
        };

        drop(listener);
        self.state.send_replace(LifecycleState::Draining);
        tracing::info!(
            connections = connections.len(),
            "Stopped accepting connections, draining"
        );

        let drained = tokio::time::timeout_at(request.deadline(), async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        match drained {
            Ok(()) => tracing::info!("All connections drained"),
            Err(_) => {
                tracing::warn!(
                    connections = connections.len(),
                    "Shutdown deadline reached, closing remaining connections"
                );
                connections.shutdown().await;
            }
        }

        self.state.send_replace(LifecycleState::Stopped);
        tracing::info!("Server stopped");
    }
}

/// Marks that no request is waiting for its headers.
const NO_PENDING_REQUEST: u64 = u64::MAX;

/// Request activity on one connection, used for the read and idle timeouts.
///
/// Times are stored as milliseconds since the connection opened.
struct Activity {
    opened: Instant,
    in_flight: AtomicUsize,
    last_done_ms: AtomicU64,
    /// First byte of a request whose headers are not complete yet.
    pending_since_ms: AtomicU64,
    request_started: Notify,
}

impl Activity {
    fn new() -> Self {
        Self {
            opened: Instant::now(),
            in_flight: AtomicUsize::new(0),
            last_done_ms: AtomicU64::new(0),
            pending_since_ms: AtomicU64::new(NO_PENDING_REQUEST),
            request_started: Notify::new(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.opened.elapsed().as_millis() as u64
    }

    /// Called for every read that returned data. Between requests this arms
    /// the read timeout for the next one.
    fn bytes_arrived(&self) {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return;
        }
        let armed = self.pending_since_ms.compare_exchange(
            NO_PENDING_REQUEST,
            self.elapsed_ms(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        if armed.is_ok() {
            self.request_started.notify_one();
        }
    }

    /// Headers are complete and the request is dispatched.
    fn begin(self: &Arc<Self>) -> InFlight {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.pending_since_ms.store(NO_PENDING_REQUEST, Ordering::SeqCst);
        InFlight(Arc::clone(self))
    }

    fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
            || self.pending_since_ms.load(Ordering::SeqCst) != NO_PENDING_REQUEST
    }

    fn idle_deadline(&self, idle: Duration) -> Instant {
        self.opened + Duration::from_millis(self.last_done_ms.load(Ordering::SeqCst)) + idle
    }

    /// Resolves once the connection has been idle for `idle`.
    async fn idle_for(&self, idle: Duration) {
        loop {
            let next = if self.is_busy() {
                Instant::now() + idle
            } else {
                let deadline = self.idle_deadline(idle);
                if deadline <= Instant::now() {
                    return;
                }
                deadline
            };
            tokio::time::sleep_until(next).await;
        }
    }

    /// Resolves once a started request has waited longer than `read` for the
    /// rest of its headers.
    async fn read_expired(&self, read: Duration) {
        loop {
            let since = self.pending_since_ms.load(Ordering::SeqCst);
            if since == NO_PENDING_REQUEST {
                self.request_started.notified().await;
                continue;
            }
            let deadline = self.opened + Duration::from_millis(since) + read;
            if deadline <= Instant::now() {
                return;
            }
            tokio::time::sleep_until(deadline).await;
        }
    }
}

struct InFlight(Arc<Activity>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.last_done_ms.store(self.0.elapsed_ms(), Ordering::SeqCst);
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Client socket that reports incoming bytes to the connection's [`Activity`].
struct WatchedStream {
    inner: TcpStream,
    activity: Arc<Activity>,
}

impl AsyncRead for WatchedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let polled = Pin::new(&mut this.inner).poll_read(cx, buf);
        if matches!(polled, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            this.activity.bytes_arrived();
        }
        polled
    }
}

impl AsyncWrite for WatchedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// Resolves once the server starts draining (or is gone).
async fn draining(state: &mut watch::Receiver<LifecycleState>) {
    let _ = state.wait_for(|s| *s >= LifecycleState::Draining).await;
}

/// Serve one connection until the client closes it, it idles out, its
/// headers time out, or the server drains.
async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    router: Router,
    timeouts: Timeouts,
    mut state: watch::Receiver<LifecycleState>,
) {
    let activity = Arc::new(Activity::new());

    let service = {
        let activity = Arc::clone(&activity);
        service_fn(move |request: hyper::Request<Incoming>| {
            let in_flight = activity.begin();
            let router = router.clone();
            async move {
                let response = router.oneshot(request).await;
                drop(in_flight);
                Ok::<_, Infallible>(match response {
                    Ok(response) => response,
                    Err(never) => match never {},
                })
            }
        })
    };

    let io = TokioIo::new(WatchedStream {
        inner: stream,
        activity: Arc::clone(&activity),
    });

    // Header reads are timed by `Activity::read_expired`, which only starts
    // counting once a request's first byte arrives. hyper's own timer would
    // also run while a keep-alive connection waits for its next request.
    let mut builder = http1::Builder::new();
    builder.header_read_timeout(None).keep_alive(true);

    let conn = builder.serve_connection(io, service);
    tokio::pin!(conn);

    let mut closing = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(%remote_addr, error = %e, "Connection closed with error");
                }
                break;
            }
            _ = activity.read_expired(timeouts.read) => {
                tracing::debug!(%remote_addr, "Request headers not received in time");
                break;
            }
            _ = draining(&mut state), if !closing => {
                tracing::debug!(%remote_addr, "Draining connection");
                conn.as_mut().graceful_shutdown();
                closing = true;
            }
            _ = activity.idle_for(timeouts.idle), if !closing => {
                tracing::debug!(%remote_addr, "Closing idle connection");
                conn.as_mut().graceful_shutdown();
                closing = true;
            }
        }
    }
}
