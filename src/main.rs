use policyqa::{api, config, logging, processing::QuestionAnsweringService};
use std::{io, net::Ipv4Addr, ops::RangeInclusive, sync::Arc};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();
    if config::get_config().using_development_token {
        tracing::warn!(
            "API_BEARER_TOKEN is not set; using the development token. Override it in production"
        );
    }
    let service = QuestionAnsweringService::from_config(config::get_config())
        .expect("Failed to initialize question answering service");
    let app = api::create_router(Arc::new(service));

    let (listener, port) = bind_listener().await.expect("Failed to bind listener");
    tracing::info!(port, "Policy QA listening on http://0.0.0.0:{port}/hackrx/run");
    axum::serve(listener, app).await.expect("Server terminated");
}

const FALLBACK_PORTS: RangeInclusive<u16> = 8000..=8099;

/// Bind `SERVER_PORT` when configured; otherwise take the first free port in 8000-8099.
async fn bind_listener() -> io::Result<(TcpListener, u16)> {
    if let Some(port) = config::get_config().server_port {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
        return Ok((listener, port));
    }

    let mut busy = 0usize;
    for port in FALLBACK_PORTS {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, skipped = busy, "Bound fallback port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == io::ErrorKind::AddrInUse => busy += 1,
            Err(err) => return Err(err),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AddrNotAvailable,
        format!(
            "all {busy} fallback ports {}-{} are in use; set SERVER_PORT",
            FALLBACK_PORTS.start(),
            FALLBACK_PORTS.end()
        ),
    ))
}
