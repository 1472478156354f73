// src/server/mod.rs

//! Development server: static files from the output directory plus a
//! live-reload channel.
//!
//! Reloads arrive on a `broadcast` channel fed by the watch runtime and are
//! pushed to browsers as server-sent events (`event: reload`, data `full` or
//! `css`).

pub mod inject;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::middleware;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::model::ServerSection;
use crate::types::ReloadKind;

pub use inject::inject_script_tag;

/// Server-sent event stream of reload notifications.
pub const EVENTS_PATH: &str = "/__sitepipe/livereload";
/// Browser client subscribing to [`EVENTS_PATH`].
pub const CLIENT_PATH: &str = "/__sitepipe/livereload.js";

const CLIENT_JS: &str = include_str!("livereload.js");

#[derive(Clone)]
struct LiveReload {
    tx: broadcast::Sender<ReloadKind>,
}

/// A running dev server.
#[derive(Debug)]
pub struct DevServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl DevServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

/// Build the router serving `base_dir`.
pub fn router(base_dir: impl Into<PathBuf>, reload_tx: broadcast::Sender<ReloadKind>, cors: bool) -> Router {
    let app = Router::new()
        .route(EVENTS_PATH, get(livereload_events))
        .route(CLIENT_PATH, get(livereload_client))
        .fallback_service(ServeDir::new(base_dir.into()))
        .with_state(LiveReload { tx: reload_tx })
        .layer(middleware::map_response(inject::inject_client))
        .layer(TraceLayer::new_for_http());

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind, then serve in a background task.
pub async fn start(
    root: &Path,
    cfg: &ServerSection,
    reload_tx: broadcast::Sender<ReloadKind>,
) -> Result<DevServer> {
    let base_dir = root.join(&cfg.base_dir);
    let listener = bind_with_fallback(&cfg.host, cfg.port, cfg.port_attempts).await?;
    let addr = listener.local_addr().context("reading bound address")?;
    let app = router(base_dir.clone(), reload_tx, cfg.cors);

    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(error = %err, "dev server stopped");
        }
    });

    let server = DevServer { addr, handle };
    info!(url = %server.url(), base_dir = %base_dir.display(), "dev server listening");
    Ok(server)
}

/// Bind `host:port`, moving on to the next port while the current one is
/// taken. Port `0` binds an ephemeral port in a single attempt.
pub async fn bind_with_fallback(host: &str, port: u16, attempts: u16) -> Result<TcpListener> {
    let attempts = if port == 0 { 1 } else { attempts.max(1) };
    let mut last_err = None;

    for offset in 0..attempts {
        let Some(candidate) = port.checked_add(offset) else {
            break;
        };
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => {
                if offset > 0 {
                    info!(port = candidate, preferred = port, "preferred port busy; using next free port");
                }
                return Ok(listener);
            }
            Err(err) => {
                debug!(port = candidate, error = %err, "port unavailable");
                last_err = Some(err);
            }
        }
    }

    let err = anyhow!("no free port in {host}:{port}..+{attempts}");
    Err(match last_err {
        Some(io) => anyhow::Error::new(io).context(err.to_string()),
        None => err,
    })
}

async fn livereload_events(
    State(state): State<LiveReload>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("live-reload client connected");
    let stream = BroadcastStream::new(state.tx.subscribe()).map(|msg| {
        // A client that fell behind gets a full reload.
        let kind = msg.unwrap_or(ReloadKind::Full);
        Ok(Event::default().event("reload").data(kind.as_event_data()))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn livereload_client() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_JS,
    )
}
