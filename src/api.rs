use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::ToSocketAddrs;

use crate::container::{Container, ContainerID};
use crate::error::ResultOkLogExt;
use crate::monitor::{self, Monitor};

mod models;

pub use models::{ContainerStatEntry, RegisterContainer};

async fn list_stats(State(monitor): State<Arc<Monitor>>) -> Response {
    let stats = tokio::task::spawn_blocking(move || {
        let mut out = Vec::with_capacity(monitor.size());
        let before = std::time::Instant::now();
        monitor.collect_stats(&mut out);
        log::trace!(
            "collect_stats() took {} nanoseconds",
            before.elapsed().as_nanos()
        );
        out
    })
    .await
    .ok_log();

    match stats {
        Some(stats) => {
            let body: Vec<ContainerStatEntry> = stats
                .into_iter()
                .map(|(id, stat)| ContainerStatEntry::new(&id, stat))
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "failed to collect stats").into_response(),
    }
}

async fn container_stats(
    State(monitor): State<Arc<Monitor>>,
    Path(id): Path<String>,
) -> Response {
    // An id that cannot be valid cannot be registered either.
    let Ok(id) = ContainerID::new(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let result = tokio::task::spawn_blocking(move || monitor.stat_container(&id))
        .await
        .ok_log();

    match result {
        Some(Ok(stat)) => (StatusCode::OK, Json(stat)).into_response(),
        Some(Err(err @ monitor::Error::MissingContainer(_))) => {
            (StatusCode::NOT_FOUND, err.to_string()).into_response()
        }
        Some(Err(err)) => {
            log::error!("Failed to stat container: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "failed to stat container").into_response(),
    }
}

async fn register_container(
    State(monitor): State<Arc<Monitor>>,
    Path(id): Path<String>,
    Json(body): Json<RegisterContainer>,
) -> Response {
    let id = match ContainerID::new(&id) {
        Ok(id) => id,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    monitor.register_container(Container::new(id, body.base_dir, body.pid));
    StatusCode::CREATED.into_response()
}

async fn remove_container(
    State(monitor): State<Arc<Monitor>>,
    Path(id): Path<String>,
) -> Response {
    match monitor.remove_container(&id) {
        Some(container) => {
            log::debug!("Removed container: container_id={}", container.id());
            StatusCode::NO_CONTENT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new(monitor: Arc<Monitor>) -> Self {
        let router = axum::Router::new()
            .route("/containers", get(list_stats))
            .route("/containers/{id}/stats", get(container_stats))
            .route(
                "/containers/{id}",
                axum::routing::put(register_container).delete(remove_container),
            )
            .with_state(monitor);
        Self { router }
    }

    pub fn router(&self) -> axum::Router {
        self.router.clone()
    }

    /// Serves the API until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to `addr` or accepting connections fails.
    pub async fn listen(self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("Listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router.into_make_service()).await
    }
}
