use clap::Parser;
use earshot_server::{
    Coordinator, CoordinatorCommand, LoggingReportSink, ServerConfig, SignalingService,
    signaling_router,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    info!("Initializing earshot coordinator...");

    // Socket tasks write commands here, the coordinator reads them.
    let (cmd_tx, cmd_rx) = mpsc::channel::<CoordinatorCommand>(config.command_buffer);

    let signaling = SignalingService::new(cmd_tx, config.ice_server_configs());
    let reports = Arc::new(LoggingReportSink::new());

    let coordinator = Coordinator::new(cmd_rx, Arc::new(signaling.clone()), reports)
        .with_max_distance(config.max_distance);
    tokio::spawn(coordinator.run());

    let app = signaling_router(signaling);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Signaling server listening on ws://{}/ws", config.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
