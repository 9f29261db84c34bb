pub mod cli;
pub mod config;
pub mod web;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::Args;
use config::Config;
use internal::{
    FieldSet, MemoryStore, NonceIssuer, OptionStore, SettingsPage, TomlFileStore,
    nonce::random_token,
};
use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::select;
use tokio::sync::Mutex;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

const SECRET_LEN: usize = 48;

pub type AppState = Arc<Mutex<SettingsPage<Box<dyn OptionStore>>>>;

fn open_store(config: &Config) -> Result<Box<dyn OptionStore>> {
    Ok(match &config.store.path {
        Some(path) => {
            tracing::info!("Using site options file {}", path.display());
            Box::new(TomlFileStore::open(path)?)
        }
        None => {
            tracing::warn!("No site options file configured. Settings are lost on restart");
            Box::new(MemoryStore::default())
        }
    })
}

fn nonce_issuer(config: &Config) -> NonceIssuer {
    let secret = match &config.nonce.secret {
        Some(secret) if !secret.is_empty() => secret.clone(),
        _ => {
            tracing::warn!("No nonce secret configured. Open forms stop working after restart");
            random_token(SECRET_LEN)
        }
    };

    NonceIssuer::new(
        secret,
        Duration::from_secs(config.nonce.lifetime_hours.saturating_mul(60 * 60)),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let mut config: Config = if let Some(conf) = &args.config {
        let file = String::from_utf8(std::fs::read(conf)?)?;
        toml::from_str(&file)?
    } else {
        Default::default()
    };

    if let Some(expose_address) = args.expose_address {
        config.server.expose_address = expose_address;
    }

    if let Some(expose_port) = args.expose_port {
        config.server.expose_port = expose_port;
    }

    if let Some(store) = args.store {
        config.store.path = Some(store);
    }

    if let Some(metrics_port) = args.metrics_port {
        config.metrics.expose_port = Some(metrics_port);
    }

    if args.validation_only {
        config.common.fields = FieldSet::ValidationOnly;
    }

    if let Some(metrics_port) = config.metrics.expose_port {
        PrometheusBuilder::new()
            .with_http_listener(
                format!("{}:{}", config.metrics.expose_address, metrics_port)
                    .parse::<SocketAddr>()?,
            )
            .install()?;

        describe_counter!(
            "settings.submissions",
            "Posts of the settings form by outcome"
        );
        describe_counter!(
            "settings.initialized_keys",
            "Site options written with their default value"
        );
    }

    let mut page = SettingsPage::new(open_store(&config)?, nonce_issuer(&config))
        .with_defaults(config.common.defaults.clone())
        .with_fields(config.common.fields);

    let initialized = page.initialize()?;
    tracing::info!("Initialized {initialized} site options");

    let entry = page.menu_entry();
    tracing::info!(
        "Serving '{}' ({}) on {}:{}{}",
        entry.page_title,
        entry.slug,
        config.server.expose_address,
        config.server.expose_port,
        web::PAGE_PATH
    );

    let app_state: AppState = Arc::new(Mutex::new(page));

    let tracker = TaskTracker::new();
    let cancel_token_orig = CancellationToken::new();

    let cancel_token = cancel_token_orig.clone();
    tracker.spawn(async move {
        select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("Failed to register ctrl-c handler: {}", e);
                    tracing::warn!("Program will work. But killing it can be hard");
                    return;
                }
                tracing::info!("Received ctrl-c");
                tracing::info!("Shutting down");
                cancel_token.cancel();
            },
            _ = cancel_token.cancelled() => {}
        }
    });

    let result = web::webserver(
        config.server.expose_address.clone(),
        config.server.expose_port,
        app_state,
        cancel_token_orig.clone(),
    )
    .await;

    cancel_token_orig.cancel();
    tracker.close();
    tracker.wait().await;

    result
}
