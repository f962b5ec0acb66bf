use std::net::SocketAddr;

use mimalloc::MiMalloc;
use scoped_attributes_config::load_config;
use scoped_attributes_internal::http::install_panic_hook;
use scoped_attributes_server::{router, telemetry};
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("SCOPE_CONFIG_FILE_PATH").ok();
    let config = load_config(config_path)?;
    let providers = telemetry::init(&config)?;
    install_panic_hook();

    let addr = config.http.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);

    axum::serve(
        listener,
        router(&config).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutting down");
    })
    .await?;

    providers.graceful_shutdown().await;

    Ok(())
}
