//! Router assembly shared by the server binary and the request-level tests.

use axum::extract::{DefaultBodyLimit, Extension, connect_info::ConnectInfo};
use axum::http::Request;
use axum::routing::{get, post};
use axum::{Router, middleware};
use axum_server::Handle;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, info_span};

use crate::auth::{self, AuthConfig};
use crate::config::{MEDIA_PATH, SHUTDOWN_GRACE_SECS, UPLOAD_PATH};
use crate::error::ApiError;
use crate::http::{add_security_headers, client_ip};
use crate::media::media_service;
use crate::storage::Storage;
use crate::upload::{self, UploadConfig};

pub const LIVENESS_MESSAGE: &str = "Media server running 🚀";

pub fn build_router(
    storage: Arc<Storage>,
    auth_config: Arc<AuthConfig>,
    upload_config: Arc<UploadConfig>,
) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route(
            UPLOAD_PATH,
            post(upload::upload_file).layer(DefaultBodyLimit::disable()),
        )
        .nest_service(MEDIA_PATH, media_service(&storage))
        .fallback(not_found)
        .layer(middleware::from_fn(auth::auth_middleware))
        .layer(middleware::from_fn(add_security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let connect_ip = request
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| addr.ip().to_string());
                    let client_ip = client_ip(request.headers(), connect_ip);

                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        client_ip,
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(Extension(storage))
        .layer(Extension(auth_config))
        .layer(Extension(upload_config))
}

/// Serves `app` until `shutdown` resolves, then drains in-flight requests.
///
/// Returns once every connection has finished or the grace period ran out.
pub async fn serve<F>(app: Router, addr: SocketAddr, handle: Handle, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let server = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(app.into_make_service_with_connect_info::<SocketAddr>());

    tokio::spawn(async move {
        shutdown.await;
        info!(
            grace_secs = SHUTDOWN_GRACE_SECS,
            "draining in-flight requests"
        );
        handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_SECS)));
    });

    server.await
}

async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
