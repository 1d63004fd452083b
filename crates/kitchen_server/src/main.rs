//! Kitchen HTTP server entry point.

use kitchen_core::{
    build_notifier, init_logging, open_order_store, KitchenConfig, KitchenService,
};
use kitchen_server::{build_router, AppState};
use log::{error, info, warn};
use std::error::Error;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = KitchenConfig::from_env()?;
    init_logging(&config.log_level, config.log_dir.as_deref())?;

    let store = open_order_store(&config.store).map_err(|err| {
        error!(
            "event=server_start module=server status=error stage=store_open error={}",
            err
        );
        err
    })?;
    let notifier = build_notifier(&config.notifier);
    if config.notifier.webhook_url.is_none() {
        warn!("event=server_start module=server status=ok ready_webhook=disabled");
    }
    if config.api_key.is_none() {
        warn!("event=server_start module=server status=ok intake=disabled reason=api_key_not_configured");
    }

    let service = KitchenService::new(store, notifier)
        .with_default_phone_region(config.default_phone_region.clone());
    let state = AppState::new(service, config.api_key.clone());

    let addr: SocketAddr = config.bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "event=server_start module=server status=ok addr={} backend={}",
        addr,
        config.store.backend.as_str()
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            "event=server_stop module=server status=error reason=signal_listener error={}",
            err
        );
        std::future::pending::<()>().await;
    }
}
