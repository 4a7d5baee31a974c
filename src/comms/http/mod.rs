//! Axum HTTP channel: the JSON API used by the web client.
//!
//! `run()` drives the axum event loop; the shared [`CancellationToken`] is
//! wired to axum's graceful shutdown.
//!
//! ```text
//! GET  /api/health
//! POST /api/study-tutor
//! GET  /api/profile/{user_id}?email=&name=
//! GET  /api/dashboard/{user_id}?email=&name=
//! POST /api/mock/reset
//! ```

mod api;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;
use crate::tutor::TutorService;

use super::{Channel, ChannelFuture};

/// Router state injected into every handler.  Cheap to clone.
#[derive(Clone)]
pub(crate) struct AxumState {
    pub channel_id: Arc<str>,
    pub service: TutorService,
}

pub struct HttpChannel {
    channel_id: String,
    bind_addr: String,
    service: TutorService,
}

impl HttpChannel {
    pub fn new(channel_id: impl Into<String>, bind_addr: impl Into<String>, service: TutorService) -> Self {
        Self { channel_id: channel_id.into(), bind_addr: bind_addr.into(), service }
    }
}

impl Channel for HttpChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ChannelFuture {
        Box::pin(run_axum(self.channel_id, self.bind_addr, self.service, shutdown))
    }
}

async fn run_axum(
    channel_id: String,
    bind_addr: String,
    service: TutorService,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let router = build_router(AxumState { channel_id: Arc::from(channel_id.as_str()), service });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("http bind failed on {bind_addr}: {e}")))?;

    info!(%channel_id, %bind_addr, "http channel listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("http server error: {e}")))?;

    info!(%channel_id, "http channel shut down");
    Ok(())
}

pub(crate) fn build_router(state: AxumState) -> Router {
    Router::new()
        .route("/api/health",                 get(api::health))
        .route("/api/study-tutor",            post(api::study_tutor))
        .route("/api/profile/{user_id}",      get(api::profile))
        .route("/api/dashboard/{user_id}",    get(api::dashboard))
        .route("/api/mock/reset",             post(api::mock_reset))
        .fallback(api::not_found)
        .with_state(state)
}
