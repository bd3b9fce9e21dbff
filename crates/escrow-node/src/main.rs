//! escrow-node — the coordinator binary.
//!
//! Startup sequence:
//!   1. Load configuration from CLI args / environment
//!   2. Open the persistent store
//!   3. Construct the chain and messaging clients
//!   4. Wire EscrowService, Permissions, Notifier, Scheduler
//!   5. Serve HTTP, run the scheduler loop, wait for a shutdown signal

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use escrow_chain::{ChainClient, MockChainClient};
use escrow_crypto::EscrowKey;
use escrow_messaging::{MessagingClient, MockMessagingClient};
use escrow_notifier::{NotificationSink, Notifier};
use escrow_scheduler::Scheduler;
use escrow_service::EscrowService;
use escrow_store::Store;

#[derive(Parser, Debug)]
#[command(name = "escrow-node", version, about = "Escrow-backed ad marketplace coordinator")]
struct Args {
    /// Directory for the persistent sled store.
    #[arg(long, env = "DATA_DIR", default_value = "~/.escrow/data")]
    data_dir: PathBuf,

    /// HTTP bind address.
    #[arg(long, env = "PORT", default_value_t = escrow_core::DEFAULT_PORT)]
    port: u16,

    /// Run with production config validation (requires ESCROW_SECRET_KEY).
    #[arg(long, env = "PRODUCTION", default_value_t = false)]
    production: bool,

    /// TON network selector — semantic only until a real chain client lands.
    #[arg(long, env = "TON_NETWORK", default_value = "testnet")]
    ton_network: String,
}

/// Delivers notifications to process logs. Real delivery (Telegram DM, etc.)
/// is out of this system's scope (spec §1) — a production deployment swaps
/// this sink for one backed by the bot's outbound message API.
struct LoggingSink;

#[async_trait::async_trait]
impl NotificationSink for LoggingSink {
    async fn deliver(&self, user_id: escrow_core::UserId, text: String) {
        info!(user_id, %text, "notification delivered");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,escrow=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!(ton_network = %args.ton_network, "escrow-node starting");

    if std::env::var("BOT_TOKEN").is_err() {
        if args.production {
            anyhow::bail!("BOT_TOKEN is required in production");
        }
        warn!("BOT_TOKEN not set; messaging driver is a mock and will not reach a real bot");
    }

    let key = EscrowKey::from_env(args.production).context("loading ESCROW_SECRET_KEY")?;

    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir).with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let store = Arc::new(Store::open(&data_dir).context("opening store")?);

    // Real TON/Telegram wire clients are out of scope for this coordinator
    // (spec §1); these mocks are the documented seam a production deployment
    // replaces with `ChainClient`/`MessagingClient` implementations that
    // actually speak to TON Center and the Bot API.
    let chain: Arc<dyn ChainClient> = Arc::new(MockChainClient::new(key));
    let messaging: Arc<dyn MessagingClient> = Arc::new(MockMessagingClient::new());

    let service = Arc::new(EscrowService::new(store.clone(), chain.clone()));
    let notifier = Arc::new(Notifier::new(Arc::new(LoggingSink)));

    let scheduler = Scheduler::new(store.clone(), messaging.clone(), service.clone(), notifier.clone());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));

    let app_state = Arc::new(escrow_api::AppState {
        store: store.clone(),
        service,
        messaging,
        notifier,
    });
    let router = escrow_api::build_router(app_state);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await.context("binding HTTP listener")?;
    info!(%addr, "HTTP server listening");

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
    });

    if let Err(e) = server.await {
        warn!(error = %e, "HTTP server exited with error");
    }

    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(
        std::time::Duration::from_secs(escrow_core::SHUTDOWN_GRACE_SECS),
        scheduler_task,
    )
    .await
    {
        Ok(Ok(())) => info!("scheduler stopped cleanly"),
        Ok(Err(e)) => warn!(error = %e, "scheduler task panicked"),
        Err(_) => warn!("scheduler did not stop within the shutdown grace period"),
    }

    store.flush().context("final store flush")?;
    info!("escrow-node shut down");
    Ok(())
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.clone()
}
