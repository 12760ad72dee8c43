//! Demo server for the compression middleware
//!
//! Serves the same text page at `/` (compressed when the client allows it)
//! and at `/raw` (always sent as-is).
//!
//! Run with: cargo run --bin cinch-demo -- demos/compression.yaml
//! Then:     curl -sv -H 'Accept-Encoding: gzip' http://127.0.0.1:3000/ -o /dev/null

use anyhow::Result;
use cinch_compression::{load_from_file, CompressionConfig, CompressionMiddleware};
use cinch_core::prelude::{handler_fn, responses, Body, Error, Middleware, Next};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LISTEN_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(config = %path, "Loading compression config");
            load_from_file(&path)?
        }
        None => CompressionConfig::default(),
    };
    let config = config.with_exclude(|ctx, _| ctx.path() == "/raw");

    let compression = Arc::new(CompressionMiddleware::new(Some(config))) as Arc<dyn Middleware>;
    let stack: Arc<[Arc<dyn Middleware>]> = Arc::new([compression]);
    let next = Next::with_handler(stack, handler_fn(route));

    let listener = TcpListener::bind(LISTEN_ADDR).await?;
    tracing::info!(listen = LISTEN_ADDR, "Demo server listening");

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, addr) = match result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                        continue;
                    }
                };
                tracing::trace!("Accepted connection from {}", addr);

                let next = next.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| handle(next.clone(), req));
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        tracing::error!("HTTP connection error: {}", e);
                    }
                });
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

/// Run the middleware chain, mapping failures to an error response
async fn handle(next: Next, req: Request<Incoming>) -> Result<Response<Body>, http::Error> {
    match dispatch(next, req).await {
        Ok(response) => Ok(response),
        Err(e) => {
            tracing::error!("Request handler error: {}", e);
            Response::builder()
                .status(e.to_status_code())
                .body(Body::from(format!("Error: {e}")))
        }
    }
}

/// Collect the incoming body and hand the request to the chain
async fn dispatch(next: Next, req: Request<Incoming>) -> cinch_core::Result<Response<Body>> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read request body: {e}")))?
        .to_bytes();

    next.run(Request::from_parts(parts, Body::new(body))).await
}

async fn route(req: Request<Body>) -> cinch_core::Result<Response<Body>> {
    match req.uri().path() {
        "/" | "/raw" => responses::ok().text(
            "Cinch compresses responses after the handler chain has run.\n".repeat(64),
        ),
        path => responses::not_found(format!("No route for {path}")),
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
                .add_directive("hyper=warn".parse()?),
        )
        .init();

    Ok(())
}
