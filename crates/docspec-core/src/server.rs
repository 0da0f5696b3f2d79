//! HTTP server implementation

use crate::app::App;
use crate::error::ApiError;
use crate::response::{IntoResponse, Response};
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Internal server struct
pub(crate) struct Server {
    app: App,
}

impl Server {
    pub fn new(app: App) -> Self {
        Self { app }
    }

    /// Run the server
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!(app = %self.app.name(), "Serving on http://{}", addr);

        loop {
            let (stream, _remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let app = self.app.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let app = app.clone();
                    async move { Ok::<_, Infallible>(handle_request(app, req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Connection error: {}", err);
                }
            });
        }
    }
}

/// Handle a single HTTP request
async fn handle_request(app: App, req: hyper::Request<Incoming>) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let response = ApiError::bad_request(format!("Failed to read body: {}", err)).into_response();
            log_request(&method, &path, response.status(), start);
            return response;
        }
    };

    let response = app.dispatch(http::Request::from_parts(parts, body)).await;

    log_request(&method, &path, response.status(), start);
    response
}

/// Log request completion
fn log_request(method: &http::Method, path: &str, status: StatusCode, start: std::time::Instant) {
    let elapsed = start.elapsed();

    if status.is_success() {
        info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    } else {
        error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    }
}
