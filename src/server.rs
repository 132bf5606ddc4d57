//! On-demand exposition endpoint.
//!
//! `GET /` fetches a fresh snapshot, transforms it and answers with the six
//! documents as a JSON array in category order. Nothing is cached from the
//! periodic cycle and nothing is forwarded.

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::relay::Relay;
use crate::transform::Batch;

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// HTTP server answering exposition requests.
#[derive(Debug)]
pub struct ExpositionServer {
    listener: TcpListener,
    relay: Relay,
}

impl ExpositionServer {
    /// Bind the listening socket.
    pub async fn bind(addr: &str, relay: Relay) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, relay })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the process exits. Each connection is
    /// served in its own task, so requests may overlap freely.
    pub async fn serve(self) -> io::Result<()> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "Exposition endpoint listening");
        }

        loop {
            let listener = &self.listener;
            let (stream, peer) = accept_with_backoff(move || listener.accept()).await;
            let io = TokioIo::new(stream);
            let relay = self.relay.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let relay = relay.clone();
                    async move { handle_request(req, &relay).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!(%peer, error = %e, "Connection error");
                }
            });
        }
    }
}

/// Serialize the documents of a batch as one JSON array.
pub fn render(batch: &Batch) -> Result<String, serde_json::Error> {
    serde_json::to_string(&batch.documents)
}

async fn handle_request<B>(
    req: Request<B>,
    relay: &Relay,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let is_get = req.method() == Method::GET;
    let path = req.uri().path().to_owned();
    drop(req);

    let response = match path.as_str() {
        "/" if is_get => expose(relay).await,
        "/" => respond(
            StatusCode::METHOD_NOT_ALLOWED,
            "text/plain",
            "Method Not Allowed",
        ),
        "/health" | "/healthz" => respond(StatusCode::OK, "text/plain", "OK"),
        _ => respond(StatusCode::NOT_FOUND, "text/plain", "Not Found"),
    };
    Ok(response)
}

async fn expose(relay: &Relay) -> Response<Full<Bytes>> {
    let batch = match relay.collect().await {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!(error = %e, "Exposition request failed");
            return respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain",
                format!("failed to collect metrics: {e}"),
            );
        }
    };

    match render(&batch) {
        Ok(body) => respond(StatusCode::OK, "application/json", body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render documents");
            respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain",
                "failed to render documents",
            )
        }
    }
}

fn respond(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Retry `accept` until it yields a connection, sleeping between failures.
async fn accept_with_backoff<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(conn) => return conn,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}
