//! Arquea bot process.
//!
//! Reads inbound messages as JSON lines on stdin and writes replies as JSON
//! lines on stdout. Logs go to stderr.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arquea::adapters::memory::InMemoryDatabase;
use arquea::adapters::postgres::{
    PostgresConversationStore, PostgresPersistenceGateway, PostgresRecordReader,
    PostgresUserDirectory, MIGRATOR,
};
use arquea::adapters::ConsoleTransport;
use arquea::application::{
    serve, MessageRouter, RouterConfig, RouterPorts, StalenessSweeper, SweeperConfig,
};
use arquea::config::{AppConfig, DatabaseConfig, LoggingConfig, StorageBackend};
use arquea::domain::dialogue::{DialogueCatalog, DialogueEngine};
use arquea::domain::foundation::UserId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    init_tracing(&config.logging)?;

    let catalog = match &config.bot.dialogues_path {
        Some(path) => DialogueCatalog::load(path)
            .with_context(|| format!("failed to load dialogues from {}", path.display()))?,
        None => DialogueCatalog::builtin(),
    };
    info!(dialogues = catalog.len(), "Dialogue catalog loaded");

    if config.bot.token().is_none() {
        warn!("No bot token configured; serving the console transport only");
    }

    let admins = config.bot.admin_ids()?;
    let ports = build_ports(&config.database, admins).await?;

    let router = Arc::new(MessageRouter::with_config(
        DialogueEngine::new(Arc::new(catalog)),
        ports.clone(),
        RouterConfig::default()
            .with_staleness_threshold(config.dialogue.staleness_threshold())
            .with_retry(config.retry.policy()),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = StalenessSweeper::with_config(
        ports.store.clone(),
        SweeperConfig::default()
            .with_interval(config.dialogue.sweep_interval())
            .with_threshold(config.dialogue.staleness_threshold()),
    );
    let sweeper_task = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    info!("Arquea ready");
    let transport = Arc::new(ConsoleTransport::stdio());
    let outcome = tokio::select! {
        served = serve(router, transport) => served.context("transport failed"),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    };

    shutdown_tx.send(true).ok();
    sweeper_task.await.context("sweeper task failed")?;
    info!("Arquea stopped");
    outcome
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = logging.env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

async fn build_ports(
    database: &DatabaseConfig,
    admins: HashSet<UserId>,
) -> anyhow::Result<RouterPorts> {
    match database.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            let db = InMemoryDatabase::new();
            Ok(RouterPorts {
                store: Arc::new(db.conversation_store()),
                gateway: Arc::new(db.persistence_gateway()),
                users: Arc::new(db.user_directory(admins)),
                records: Arc::new(db.record_reader()),
            })
        }
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .min_connections(database.min_connections)
                .max_connections(database.max_connections)
                .acquire_timeout(database.acquire_timeout())
                .idle_timeout(database.idle_timeout())
                .max_lifetime(database.max_lifetime())
                .connect(&database.url)
                .await
                .context("failed to connect to PostgreSQL")?;
            info!("Database connection established");

            if database.run_migrations {
                MIGRATOR
                    .run(&pool)
                    .await
                    .context("failed to run migrations")?;
                info!("Migrations applied");
            }

            Ok(RouterPorts {
                store: Arc::new(PostgresConversationStore::new(pool.clone())),
                gateway: Arc::new(PostgresPersistenceGateway::new(pool.clone())),
                users: Arc::new(PostgresUserDirectory::new(pool.clone(), admins)),
                records: Arc::new(PostgresRecordReader::new(pool)),
            })
        }
    }
}
