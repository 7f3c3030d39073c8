//! Uptime monitor daemon.
//!
//! Loads the TOML config, seeds the target store, starts the tenant's
//! monitor session plus the optional admin API and metrics exporter, and
//! runs until SIGINT or SIGTERM.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use uptime_monitor::admin::{serve_admin, setup_admin_router, AdminState};
use uptime_monitor::config::{load_config, watcher::ConfigWatcher, MonitorConfig};
use uptime_monitor::lifecycle::{wait_for_signal, Shutdown};
use uptime_monitor::notifications::{LogNotifier, Notifier, WebhookNotifier};
use uptime_monitor::observability::{logging, metrics};
use uptime_monitor::probe::HttpProbeTransport;
use uptime_monitor::store::InMemoryTargetStore;
use uptime_monitor::target::TenantId;
use uptime_monitor::MonitorSession;

#[derive(Parser)]
#[command(name = "uptime-monitor")]
#[command(about = "Polls website targets and reports status changes", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "monitor.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        "uptime-monitor starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let tenant = TenantId::new(config.session.tenant.clone());
    let store = Arc::new(open_store(&config)?);
    store.sync_tenant(&tenant, &config.targets);

    let notifier = build_notifier(&config)?;
    let transport = Arc::new(HttpProbeTransport::new(
        config.probe.probe_path.clone(),
        &config.probe.user_agent,
    )?);

    let session = MonitorSession::start(tenant.clone(), &config, store.clone(), notifier, transport);
    let shutdown = Shutdown::new();

    let admin = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState::new(&session, store.clone(), &config.admin.api_key);
        let router = setup_admin_router(state, Duration::from_secs(config.admin.request_timeout_secs));
        let rx = shutdown.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = serve_admin(listener, router, rx).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        }))
    } else {
        None
    };

    // Keep the watcher alive for the lifetime of the process.
    let (watcher, mut updates) = ConfigWatcher::new(&args.config, config.targets.clone());
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    };
    let reload = {
        let store = store.clone();
        let tenant = tenant.clone();
        let mut stop = shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(targets) = updates.recv() => {
                        store.sync_tenant(&tenant, &targets);
                    }
                    _ = stop.recv() => break,
                }
            }
        })
    };

    wait_for_signal().await;
    tracing::info!("Shutting down");

    shutdown.trigger();
    session.end().await;
    let _ = reload.await;
    if let Some(admin) = admin {
        let _ = admin.await;
    }

    if let Some(path) = &config.store.snapshot_path {
        match store.save_to_file(Path::new(path)) {
            Ok(()) => tracing::info!(path = %path, targets = store.len(), "Store snapshot written"),
            Err(e) => tracing::error!(path = %path, error = %e, "Failed to write store snapshot"),
        }
    }

    tracing::info!("uptime-monitor stopped");
    Ok(())
}

fn open_store(config: &MonitorConfig) -> Result<InMemoryTargetStore, Box<dyn std::error::Error>> {
    match &config.store.snapshot_path {
        Some(path) if Path::new(path).exists() => {
            let store = InMemoryTargetStore::load_from_file(Path::new(path))?;
            tracing::info!(path = %path, targets = store.len(), "Store snapshot restored");
            Ok(store)
        }
        _ => Ok(InMemoryTargetStore::new()),
    }
}

fn build_notifier(
    config: &MonitorConfig,
) -> Result<Option<Arc<dyn Notifier>>, Box<dyn std::error::Error>> {
    let settings = &config.notifications;
    if !settings.enabled {
        return Ok(None);
    }

    let notifier: Arc<dyn Notifier> = match &settings.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url, Duration::from_secs(settings.timeout_secs))?),
        None => Arc::new(LogNotifier),
    };
    Ok(Some(notifier))
}
