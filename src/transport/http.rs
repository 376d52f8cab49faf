//! Local HTTP transport.
//!
//! Serves the records routes with axum, for running the handlers outside
//! Lambda. Every request is routed through [`RecordsApi`], so responses match
//! the Lambda surface exactly.

use crate::db::Connector;
use crate::handlers::{ApiRequest, ApiResponse, RecordsApi};
use crate::transport::{BoxError, Transport};
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// HTTP transport implementation.
pub struct HttpTransport<C> {
    api: Arc<RecordsApi<C>>,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
}

impl<C: Connector + 'static> HttpTransport<C> {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    ///
    /// * `api` - Records API shared by every request
    /// * `host` - Host address to bind to
    /// * `port` - Port to bind to
    pub fn new(api: RecordsApi<C>, host: impl Into<String>, port: u16) -> Self {
        Self {
            api: Arc::new(api),
            host: host.into(),
            port,
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Router sending every path through the shared handler.
    pub fn router(&self) -> axum::Router {
        axum::Router::new()
            .fallback(serve_request::<C>)
            .with_state(self.api.clone())
    }
}

impl<C: Connector + 'static> Transport for HttpTransport<C> {
    async fn run(self) -> Result<(), BoxError> {
        let bind_addr = self.bind_addr();
        info!("Starting records server with HTTP transport on {}", bind_addr);

        let app = self.router();

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            error!(error = %e, addr = %bind_addr, "Failed to bind");
            format!("Failed to bind to {}: {}", bind_addr, e)
        })?;

        info!("Records endpoint ready at http://{}/records", bind_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_signal())
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server error");
                Box::new(e) as BoxError
            })?;

        info!("HTTP server stopped");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

async fn serve_request<C: Connector + 'static>(
    State(api): State<Arc<RecordsApi<C>>>,
    method: Method,
    uri: Uri,
) -> Response {
    let request = ApiRequest::new(method, uri.path()).with_query_string(uri.query());
    into_axum_response(api.handle(&request).await)
}

/// Convert the shared envelope into an axum response.
pub fn into_axum_response(response: ApiResponse) -> Response {
    let mut builder = axum::http::Response::builder().status(response.status_code);
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(axum::body::Body::from(response.body))
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to build HTTP response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
