//! Wallet Sync Engine CLI
//!
//! Command-line harness that drives one screen's sync engine against a live
//! backend and prints state snapshots as they evolve.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --token $TOKEN --screen wallet
//! cargo run -- --token $TOKEN --screen admin --api-url http://localhost:8000
//! cargo run -- --token $TOKEN --poll-period-ms 5000 --watch-secs 120
//! ```
//!
//! The harness binds the given token, lets the staged loader and poll
//! scheduler run, and prints a one-line snapshot every few seconds until the
//! watch window elapses, then deactivates the screen.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (backend client could not be built)

use std::process;
use std::sync::Arc;
use std::time::Duration;

use wallet_sync_engine::api::HttpBackend;
use wallet_sync_engine::cli::{self, ScreenType};
use wallet_sync_engine::screens::{AdminScreen, WalletScreen};
use wallet_sync_engine::types::BearerToken;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::parse_args();
    let config = args.to_sync_config();

    let backend = match HttpBackend::new(&args.api_url, config.request_timeout) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let token = BearerToken::new(args.token.clone());
    let watch = Duration::from_secs(args.watch_secs);

    match args.screen {
        ScreenType::Wallet => watch_wallet(backend, &token, config, watch).await,
        ScreenType::Admin => watch_admin(backend, &token, config, watch).await,
    }
}

async fn watch_wallet(
    backend: HttpBackend,
    token: &BearerToken,
    config: wallet_sync_engine::config::SyncConfig,
    watch: Duration,
) {
    let screen = WalletScreen::new(Arc::new(backend), config);
    screen.activate(Some(token));

    let started = tokio::time::Instant::now();
    while started.elapsed() < watch {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = screen.snapshot();
        if let Some(error) = &snapshot.flags.error {
            eprintln!("error: {}", error);
        }
        println!(
            "balance={} transactions={} pending={} loading={} refreshing={} poll={:?}",
            snapshot.data.balance,
            snapshot.data.transactions.len(),
            snapshot
                .data
                .transactions
                .iter()
                .filter(|t| t.is_pending())
                .count(),
            snapshot.flags.loading,
            snapshot.flags.refreshing,
            screen.poll_phase(),
        );
    }

    screen.deactivate();
}

async fn watch_admin(
    backend: HttpBackend,
    token: &BearerToken,
    config: wallet_sync_engine::config::SyncConfig,
    watch: Duration,
) {
    let screen = AdminScreen::new(Arc::new(backend), config);
    screen.activate(Some(token));

    let started = tokio::time::Instant::now();
    while started.elapsed() < watch {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = screen.snapshot();
        if let Some(error) = &snapshot.flags.error {
            eprintln!("error: {}", error);
        }
        println!(
            "pending={} rules={} enforcement={} users={} all_transactions={} loading={} poll={:?}",
            snapshot.data.pending.len(),
            snapshot.data.rules.len(),
            snapshot.data.toggle.status,
            snapshot.data.users.len(),
            snapshot.data.all_transactions.len(),
            snapshot.flags.loading,
            screen.poll_phase(),
        );
    }

    screen.deactivate();
}
