// src/server/mod.rs

//! Development server: static files from the output directory, a WebSocket
//! reload channel, and a client script injected into every HTML page.

pub mod inject;
pub mod reload;

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{PipelineError, Result};
use crate::orchestrator::TaskCompletion;

pub use inject::inject_client;
pub use reload::{ReloadHub, ReloadMessage};

/// WebSocket endpoint the injected client connects to.
pub const RELOAD_PATH: &str = "/__assetpipe/reload";

#[derive(Clone)]
struct ServerState {
    root: Arc<PathBuf>,
    hub: Arc<ReloadHub>,
    notify: bool,
}

/// A bound (but not yet serving) dev server.
#[derive(Debug)]
pub struct DevServer {
    listener: TcpListener,
    addr: SocketAddr,
    root: PathBuf,
    hub: Arc<ReloadHub>,
    notify: bool,
}

impl DevServer {
    /// Bind `host:port`. Fails with [`PipelineError::PortInUse`] when the
    /// port is taken; nothing is served in that case.
    pub async fn bind(
        root: impl Into<PathBuf>,
        host: &str,
        port: u16,
        hub: Arc<ReloadHub>,
        notify: bool,
    ) -> Result<Self> {
        let requested = format!("{host}:{port}");
        let listener = TcpListener::bind(&requested).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                PipelineError::PortInUse {
                    addr: requested.clone(),
                }
            } else {
                PipelineError::IoError(e)
            }
        })?;
        let addr = listener.local_addr()?;

        Ok(Self {
            listener,
            addr,
            root: root.into(),
            hub,
            notify,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(&self) -> Router {
        let state = ServerState {
            root: Arc::new(self.root.clone()),
            hub: self.hub.clone(),
            notify: self.notify,
        };

        Router::new()
            .route(RELOAD_PATH, get(reload_socket_handler))
            .fallback(static_handler)
            .with_state(state)
    }

    /// Serve until the process ends.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        info!(url = %format!("http://{}", self.addr), root = %self.root.display(), "dev server listening");
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Turn task completions into reload messages until the orchestrator goes
/// away.
pub fn forward_completions(
    mut completions: broadcast::Receiver<TaskCompletion>,
    hub: Arc<ReloadHub>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match completions.recv().await {
                Ok(completion) => {
                    if let Some(message) = ReloadMessage::for_completion(&completion) {
                        let clients = hub.notify_reload(message);
                        debug!(task = %completion.task, clients, "reload signal sent");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed task completions; forcing a full reload");
                    hub.notify_reload(ReloadMessage::Reload);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn reload_socket_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.on_upgrade(move |socket| reload_socket(socket, state))
}

async fn reload_socket(socket: WebSocket, state: ServerState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.hub.subscribe();
    debug!(clients = state.hub.client_count(), "reload client connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = next_message(&mut rx).await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to encode reload message");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    debug!("reload client disconnected");
}

/// Next message for one client. A client that fell behind gets a full
/// reload in place of what it missed; `None` once the hub is gone.
async fn next_message(rx: &mut broadcast::Receiver<ReloadMessage>) -> Option<ReloadMessage> {
    match rx.recv().await {
        Ok(msg) => Some(msg),
        Err(RecvError::Lagged(skipped)) => {
            debug!(skipped, "reload client lagged; sending a full reload");
            Some(ReloadMessage::Reload)
        }
        Err(RecvError::Closed) => None,
    }
}

async fn static_handler(State(state): State<ServerState>, uri: Uri) -> Response {
    let Some(mut path) = resolve_request_path(&state.root, uri.path()) else {
        return (StatusCode::FORBIDDEN, "forbidden").into_response();
    };

    if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
        path = path.join("index.html");
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(_) => {
            debug!(path = %uri.path(), "not found");
            return (StatusCode::NOT_FOUND, "not found").into_response();
        }
    };

    let content_type = guess_content_type(&path);
    let body = if content_type.starts_with("text/html") {
        inject_client(&String::from_utf8_lossy(&bytes), state.notify).into_bytes()
    } else {
        bytes
    };

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

/// Map a percent-encoded request path onto `root`. Returns `None` for paths
/// that would escape it or do not decode to UTF-8.
pub fn resolve_request_path(root: &Path, request: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for raw in request.split('/') {
        let decoded = percent_decode_str(raw).decode_utf8().ok()?;
        let segment: &str = &decoded;
        if segment.contains('\\') || segment.contains('/') {
            return None;
        }
        match Path::new(segment).components().next() {
            None | Some(Component::CurDir) => continue,
            Some(Component::Normal(part)) if Path::new(segment).components().count() == 1 => {
                path.push(part)
            }
            _ => return None,
        }
    }
    Some(path)
}

fn guess_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
