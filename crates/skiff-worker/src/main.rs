//! skiff worker binary.
//!
//! Launched by the host as
//! `skiff-worker <host> <port> <worker-id> <request-id> <max-message-length>`.

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skiff_worker::{signals, transport, Args, ProcessEngine, Settings, Worker, WorkerConfig, WorkerSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = WorkerConfig::new(args, settings)?;

    info!(
        worker_id = %config.identity.worker_id,
        host = %config.address(),
        max_message_size = config.max_message_size,
        "skiff worker starting"
    );

    let stream = transport::connect(&config.host, config.port)
        .await
        .context("connecting to host")?;
    let (reader, writer) = stream.into_split();

    let engine = ProcessEngine::from_settings(&config.settings.engine);
    let session = WorkerSession::new(config.identity.clone(), Box::new(engine))
        .with_invocation_timeout(config.settings.engine.invocation_timeout());
    let worker = Worker::new(session)
        .with_max_message_size(config.max_message_size)
        .with_outbound_capacity(config.settings.stream.outbound_capacity);

    let cancel = CancellationToken::new();
    tokio::spawn(signals::cancel_on_shutdown_signal(cancel.clone()));

    worker.run(reader, writer, cancel).await?;

    info!("skiff worker stopped");
    Ok(())
}
