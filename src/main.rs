use std::net::SocketAddr;
use std::sync::Arc;

use boxoffice::application::checkout::CheckoutService;
use boxoffice::application::payouts::PayoutLifecycle;
use boxoffice::application::reconciler::WebhookReconciler;
use boxoffice::config::AppConfig;
use boxoffice::domain::ports::{SellerStoreArc, TicketStoreArc};
use boxoffice::domain::seller::Seller;
use boxoffice::domain::ticket::Ticket;
use boxoffice::infrastructure::in_memory::{InMemorySellerStore, InMemoryTicketStore};
use boxoffice::interfaces::http::{AppState, build_router};
use boxoffice::stripe::{StripeClient, WebhookVerifier};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<std::path::PathBuf>,

    /// Seed a demo seller and ticket catalog on startup
    #[arg(long)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().into_diagnostic()?;

    let (sellers, tickets) = open_stores(&cli).into_diagnostic()?;
    if cli.seed_demo {
        seed_demo(&sellers, &tickets, &config)
            .await
            .into_diagnostic()?;
    }

    let gateway = Arc::new(StripeClient::new(config.stripe.secret_key.clone()).into_diagnostic()?);
    let lifecycle = Arc::new(PayoutLifecycle::new(
        sellers.clone(),
        gateway.clone(),
        config.platform.base_url.clone(),
        config.stripe.account_country.clone(),
    ));
    let checkout = Arc::new(CheckoutService::new(
        tickets.clone(),
        gateway,
        config.platform.base_url.clone(),
        config.platform.currency.clone(),
        config.platform.service_fee,
    ));
    let verifier = WebhookVerifier::new(config.stripe.webhook_secret.clone());
    let reconciler = Arc::new(WebhookReconciler::new(
        verifier,
        lifecycle.clone(),
        sellers.clone(),
    ));

    let state = AppState {
        sellers,
        tickets,
        lifecycle,
        checkout,
        reconciler,
        platform: config.platform,
    };

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .into_diagnostic()?;
    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, build_router(state))
        .await
        .into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(cli: &Cli) -> boxoffice::error::Result<(SellerStoreArc, TicketStoreArc)> {
    use boxoffice::infrastructure::rocksdb::RocksDBStore;

    match &cli.db_path {
        Some(db_path) => {
            let store = RocksDBStore::open(db_path)?;
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
        None => Ok((
            Arc::new(InMemorySellerStore::new()),
            Arc::new(InMemoryTicketStore::new()),
        )),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(_cli: &Cli) -> boxoffice::error::Result<(SellerStoreArc, TicketStoreArc)> {
    Ok((
        Arc::new(InMemorySellerStore::new()),
        Arc::new(InMemoryTicketStore::new()),
    ))
}

/// Seeds one demo seller plus a small catalog so the storefront has
/// something to sell before onboarding is wired up.
async fn seed_demo(
    sellers: &SellerStoreArc,
    tickets: &TicketStoreArc,
    config: &AppConfig,
) -> boxoffice::error::Result<()> {
    let seller = Seller::new(1, "demo@boxoffice.test", config.platform.default_fee_percent)?;
    sellers.upsert(seller).await?;

    let catalog = [
        ("General Admission", dec!(13.00), None),
        ("Matinee", dec!(8.00), None),
        ("VIP", dec!(49.00), Some(dec!(8.5))),
    ];
    for (name, price, fee_percent) in catalog {
        let id = tickets.next_id().await?;
        tickets
            .insert(Ticket::new(id, 1, name, price, fee_percent)?)
            .await?;
    }
    tracing::info!(seller = 1, tickets = catalog.len(), "seeded demo catalog");
    Ok(())
}
