use std::sync::Arc;

use clap::Parser;
use netdash::{
    actors::PollerHandle,
    alerts::AlertDispatcher,
    api::{ApiState, spawn_api_server},
    config::{Config, read_config_file},
    monitors::{
        probe::{NetworkProbe, Probe},
        system::SysinfoSource,
    },
    notifications::{NotificationService, spawn_retention_task},
    poller::HealthPoller,
    registry::ServiceRegistry,
    storage,
};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON); built-in defaults are used without one
    #[arg(short)]
    file: Option<String>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("netdash", LevelFilter::DEBUG),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = match &args.file {
        Some(file) => read_config_file(file)?,
        None => Config::default(),
    };
    config.apply_env_overrides();

    let storage_config = config.storage.clone().unwrap_or_default();
    let storage = storage::open(&storage_config).await?;

    let notifications = NotificationService::new(
        storage.clone(),
        AlertDispatcher::with_endpoints(&config.channels),
        config.notifications.suppression_window(),
    );

    if let Some(days) = storage_config.retention_days() {
        info!("pruning notifications older than {days} days");
        spawn_retention_task(notifications.clone(), days);
    }

    let probe: Arc<dyn Probe> = Arc::new(NetworkProbe::new(
        config.polling.http_timeout(),
        config.polling.ping_timeout(),
    )?);

    let poller = PollerHandle::spawn(
        HealthPoller::new(
            storage.clone(),
            probe.clone(),
            notifications.clone(),
            config.polling.concurrency,
        ),
        config.user_id,
        config.polling.interval(),
    );

    let state = ApiState {
        registry: ServiceRegistry::new(storage.clone()),
        poller: poller.clone(),
        notifications,
        storage: storage.clone(),
        metrics: Arc::new(SysinfoSource::new()),
        thresholds: config.thresholds,
        probe,
        ping_target: config.ping_target.clone(),
        user_id: config.user_id,
        recent_limit: config.notifications.recent_limit,
    };

    let addr = spawn_api_server(config.api.clone(), state).await?;
    info!("netdash ready on http://{addr}");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    poller.shutdown().await;
    storage.close().await?;

    Ok(())
}
