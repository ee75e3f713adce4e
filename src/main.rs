//! Transaq Export
//!
//! Connects to a Transaq connector bridge and streams quotes, trades,
//! candles and reference data into ClickHouse until interrupted.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use transaq_export::{
    shutdown, Args, BatchWriter, Bootstrapper, ClickHouseStore, Dispatcher, IngestError,
};
use transaq_session::TransaqClient;

fn init_logging(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

async fn run(args: Args) -> Result<(), IngestError> {
    let (trigger, shutdown) = shutdown::channel();
    ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, shutting down");
        trigger.trigger();
    })
    .map_err(|e| IngestError::Startup(format!("cannot install signal handler: {e}")))?;

    let store = ClickHouseStore::connect(args.clickhouse_config()).await?;
    store.ensure_schema().await?;
    let writer = BatchWriter::new(Arc::new(store));

    tracing::info!(addr = %args.bridge_addr, "connecting to connector bridge");
    let (client, events) = TransaqClient::connect(&args.bridge_addr, args.connect_params()).await?;
    let session = Arc::new(client);

    let config = Arc::new(args.export_config());
    let dispatcher = Dispatcher::new(Arc::clone(&session), writer.clone(), &config);
    let (plan_tx, plan_rx) = mpsc::channel(1);
    let bootstrapper = Bootstrapper::new(
        Arc::clone(&session),
        writer,
        Arc::clone(&config),
        dispatcher.status_watch(),
        dispatcher.progress_feed(),
        plan_tx,
        shutdown.clone(),
    );

    let dispatch = tokio::spawn(dispatcher.run(events, plan_rx, shutdown.clone()));

    match bootstrapper.run().await {
        Ok(()) | Err(IngestError::Shutdown) => {}
        Err(e) => tracing::error!("bootstrap failed: {e}"),
    }

    shutdown.clone().wait().await;
    if let Err(e) = dispatch.await {
        tracing::error!("dispatcher task failed: {e}");
    }
    session.disconnect().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    if let Err(e) = run(args).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}
