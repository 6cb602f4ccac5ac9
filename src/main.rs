use mosaic::{analysis::AnalysisService, api, config, logging};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Default listening port when `SERVER_PORT` is not configured.
const DEFAULT_PORT: u16 = 5001;

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();
    let service = AnalysisService::new().expect("Failed to initialize analysis service");
    let app = api::create_router(Arc::new(service));

    let (listener, port) = bind_listener().await.expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let port = config::get_config().server_port.unwrap_or(DEFAULT_PORT);
    TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .map(|listener| (listener, port))
}
