//! Local HTTP API for the web channel.
//!
//! - `GET /status` returns the current snapshot.
//! - `POST /control` takes a web command body (`{"action": .., "value": ..}`).
//!
//! Requests become `Inbound::Command` messages for the run loop; handlers
//! wait for its reply off the async runtime.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use crossbeam_channel as xch;
use eyre::WrapErr;
use foamguard_core::{CommandChannel, CommandReply, Inbound};
use serde_json::json;
use tower_http::trace::TraceLayer;

/// How long a request waits for the control loop.
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

struct AppState {
    inbound: xch::Sender<Inbound>,
}

type AppStateArc = Arc<AppState>;

pub fn routes() -> Router<AppStateArc> {
    Router::new()
        .route("/status", get(status))
        .route("/control", post(control))
}

/// Bind `addr` and serve on a background thread. Bind errors surface here;
/// the thread is detached and ends with the process.
pub fn spawn(addr: SocketAddr, inbound: xch::Sender<Inbound>) -> eyre::Result<SocketAddr> {
    let listener =
        std::net::TcpListener::bind(addr).wrap_err_with(|| format!("bind web API on {addr}"))?;
    listener
        .set_nonblocking(true)
        .wrap_err("set web listener non-blocking")?;
    let local = listener.local_addr().wrap_err("web listener address")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("build web runtime")?;

    let app = routes()
        .with_state(Arc::new(AppState { inbound }))
        .layer(TraceLayer::new_for_http());

    std::thread::spawn(move || {
        runtime.block_on(async move {
            let listener = match tokio::net::TcpListener::from_std(listener) {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(error = %e, "web listener unusable");
                    return;
                }
            };
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "web API stopped");
            }
        });
    });
    tracing::info!(%local, "web API listening");
    Ok(local)
}

async fn status(State(state): State<AppStateArc>) -> Response {
    forward(&state, r#"{"action":"status"}"#.to_string()).await
}

async fn control(State(state): State<AppStateArc>, body: String) -> Response {
    forward(&state, body).await
}

async fn forward(state: &AppState, payload: String) -> Response {
    let (reply_tx, reply_rx) = xch::bounded(1);
    let msg = Inbound::Command {
        channel: CommandChannel::Web,
        payload,
        reply_to: Some(reply_tx),
    };
    if state.inbound.try_send(msg).is_err() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ok": false, "error": "control loop busy" })),
        )
            .into_response();
    }
    let reply = tokio::task::spawn_blocking(move || reply_rx.recv_timeout(REPLY_TIMEOUT)).await;
    match reply {
        Ok(Ok(reply)) => reply_response(reply),
        _ => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(json!({ "ok": false, "error": "no reply from control loop" })),
        )
            .into_response(),
    }
}

fn reply_response(reply: CommandReply) -> Response {
    match reply {
        CommandReply::Ack(cmd) => {
            Json(json!({ "ok": true, "command": cmd.to_string() })).into_response()
        }
        CommandReply::Status(snapshot) => Json(*snapshot).into_response(),
        CommandReply::Help(text) => Json(json!({ "ok": true, "help": text })).into_response(),
        CommandReply::Rejected(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}
