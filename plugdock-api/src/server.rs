//! API Server

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::AUTHORIZATION;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::handlers::ApiState;

/// Run the API server until the task is cancelled
pub async fn run_api_server(addr: SocketAddr, state: Arc<ApiState>) -> plugdock_core::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| plugdock_core::Error::Server(format!("Failed to bind API: {}", e)))?;

    tracing::info!("Plugdock API listening on http://{}", addr);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("API accept error: {}", e);
                continue;
            }
        };

        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service_fn(move |req| handle_request(req, state.clone())))
                .await
            {
                tracing::error!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<ApiState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    tracing::info!("{} {}", parts.method, parts.uri.path());

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!("Failed to read request body: {}", e);
            let mut response = Response::new(Full::new(Bytes::from_static(b"Bad Request")));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return Ok(response);
        }
    };

    let authorization = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let response = state
        .handle(&parts.method, parts.uri.path(), authorization, &body)
        .await;
    tracing::debug!("{} {} -> {}", parts.method, parts.uri.path(), response.status());
    Ok(response)
}
