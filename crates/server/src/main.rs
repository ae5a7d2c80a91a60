mod api;
mod metrics;
mod state;
mod telegram;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediafetch_core::{
    create_authenticator, load_config, load_config_from_env, validate_config, AcquisitionPipeline,
    AlternateSender, Authenticator, CommandRunner, Config, Converter, Dispatcher as ActionDispatcher,
    FfmpegConverter, HttpFetcher, JobStore, MediaPipeline, ProcessRunner, ReqwestFetcher,
    SanitizedConfig, TokenStore, Transport,
};

use api::create_router;
use state::AppState;
use telegram::TelegramTransport;

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "MEDIAFETCH_CONFIG";

/// Config file looked up when [`CONFIG_ENV`] is unset.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

/// Explicit path from the environment, else `config.toml` when present,
/// else environment variables alone.
fn read_config() -> Result<Config> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(path);
        info!("Loading configuration from {:?}", path);
        return load_config(&path).with_context(|| format!("Failed to load config from {:?}", path));
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        info!("Loading configuration from {:?}", default_path);
        return load_config(&default_path)
            .with_context(|| format!("Failed to load config from {:?}", default_path));
    }

    info!("No config file, reading environment only");
    load_config_from_env().context("Failed to load config from environment")
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = read_config()?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");
    info!("Effective configuration: {:?}", SanitizedConfig::from(&config));

    tokio::fs::create_dir_all(&config.storage.download_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create download directory {:?}",
                config.storage.download_dir
            )
        })?;

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(create_authenticator(&config.bot));
    info!("Using authenticator: {}", authenticator.method_name());

    // External tools and HTTP
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new());
    let fetcher: Arc<dyn HttpFetcher> =
        Arc::new(ReqwestFetcher::new(&config.acquire).context("Failed to create HTTP client")?);
    let converter: Arc<dyn Converter> = Arc::new(FfmpegConverter::new(
        config.converter.clone(),
        Arc::clone(&runner),
    ));

    // Chat transport
    let bot = Bot::new(config.bot.token.clone());
    let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(bot.clone()));

    let alternate = AlternateSender::from_config(
        &config.alternate,
        &config.credentials,
        Arc::clone(&runner),
    );
    if alternate.is_some() {
        info!("Alternate transport enabled");
    } else {
        info!("Alternate transport disabled");
    }

    let acquisition = Arc::new(AcquisitionPipeline::new(
        config.acquire.clone(),
        config.credentials.clone(),
        Arc::clone(&runner),
        Arc::clone(&fetcher),
    ));
    let media = Arc::new(
        MediaPipeline::new(
            config.delivery.clone(),
            config.converter.clone(),
            Arc::clone(&converter),
            Arc::clone(&transport),
        )
        .with_alternate(alternate),
    );

    // Stores
    let jobs = Arc::new(JobStore::new(
        config.storage.download_dir.clone(),
        config.store.job_policy(),
    ));
    let tokens = Arc::new(TokenStore::new(
        config.store.token_policy(),
        config.store.single_use_tokens,
    ));

    let actions = Arc::new(ActionDispatcher::new(
        config.dispatch.clone(),
        authenticator,
        acquisition,
        media,
        Arc::clone(&jobs),
        Arc::clone(&tokens),
    ));

    let sweeper = tokio::spawn(sweep_stores(
        Arc::clone(&jobs),
        Arc::clone(&tokens),
        config.store.sweep_interval(),
    ));

    notify_admin(&config, transport.as_ref()).await;

    // Bot update loop
    let mut bot_dispatcher = Dispatcher::builder(bot, telegram::schema())
        .dependencies(dptree::deps![Arc::clone(&actions)])
        .default_handler(|_| async {})
        .build();
    let bot_shutdown = bot_dispatcher.shutdown_token();
    let bot_handle = tokio::spawn(async move { bot_dispatcher.dispatch().await });
    info!("Bot update loop started");

    // Health and metrics
    let state = Arc::new(AppState::new(config.clone(), jobs, tokens));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    match bot_shutdown.shutdown() {
        Ok(done) => done.await,
        Err(e) => debug!("Bot update loop was idle: {}", e),
    }
    if let Err(e) = bot_handle.await {
        warn!("Bot update loop ended abnormally: {}", e);
    }
    sweeper.abort();
    info!("Bot stopped");

    Ok(())
}

/// Sends the startup notice to the admin chat, defaulting to the allowed user.
async fn notify_admin(config: &Config, transport: &dyn Transport) {
    let admin = config
        .bot
        .admin_chat_id
        .or_else(|| {
            config
                .bot
                .allowed_user_id
                .filter(|id| *id != 0)
                .and_then(|id| i64::try_from(id).ok())
        });
    let Some(chat_id) = admin else {
        return;
    };

    let text = match config.bot.instance_name.as_deref() {
        Some(name) if !name.is_empty() => format!("✅ Bot started ({})", name),
        _ => "✅ Bot started".to_string(),
    };
    if let Err(e) = transport.send_text(chat_id, &text, None).await {
        warn!(chat_id, error = %e, "startup notice not delivered");
    }
}

/// Periodically drops expired jobs and tokens.
async fn sweep_stores(jobs: Arc<JobStore>, tokens: Arc<TokenStore>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let expired_jobs = jobs.sweep().await.len();
        let expired_tokens = tokens.sweep().await;
        if expired_jobs > 0 || expired_tokens > 0 {
            info!(expired_jobs, expired_tokens, "swept expired state");
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
