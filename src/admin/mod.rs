//! Read-only admin API.
//!
//! # Routes
//! ```text
//! GET /admin/status                  process and session overview
//! GET /admin/targets                 targets with status and stale flag
//! GET /admin/targets/{id}/history    summary plus persisted updates
//! GET /admin/queue                   queue counters and circuit state
//! ```
//!
//! Every route requires `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::probe::ResultCache;
use crate::queue::ProbeQueue;
use crate::scheduler::PollScheduler;
use crate::session::MonitorSession;
use crate::store::InMemoryTargetStore;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub scheduler: Arc<PollScheduler>,
    pub queue: Arc<ProbeQueue>,
    pub cache: Arc<ResultCache>,
    pub store: Arc<InMemoryTargetStore>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(session: &MonitorSession, store: Arc<InMemoryTargetStore>, api_key: &str) -> Self {
        Self {
            scheduler: session.scheduler().clone(),
            queue: session.queue().clone(),
            cache: session.cache().clone(),
            store,
            api_key: Arc::from(api_key),
        }
    }
}

#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/targets", get(get_targets))
        .route("/admin/targets/{id}/history", get(get_history))
        .route("/admin/queue", get(get_queue))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout)),
        )
}

/// Serve the admin API until shutdown is signalled.
pub async fn serve_admin(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
