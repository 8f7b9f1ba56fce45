//! Discord command bot - main entry point.

use anyhow::Context;
use api_cache::CacheSweeper;
use api_clients::{
    CachePolicy, DictionaryClient, MinecraftClient, SearchClient, SteamClient, TriviaClient,
    WynncraftClient, XkcdClient,
};
use command_bot::api::{create_router_with_rate_limit, AppState, RateLimitState};
use command_bot::commands::*;
use command_bot::{AppResult, Config};
use discord_client::{DiscordClient, SignatureVerifier};
use interactive::ComponentRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting command bot...");

    let upstream = &config.upstream;
    let policy = CachePolicy::with_alias_factor(config.cache.ttl, config.cache.alias_ttl_factor);

    // Initialize clients
    let steam = Arc::new(
        SteamClient::new(
            &upstream.snaz_url,
            &upstream.steam_community_url,
            upstream.timeout,
            policy,
        )
        .context("Failed to create Steam client")?,
    );
    let minecraft = Arc::new(
        MinecraftClient::new(&upstream.mcsrvstat_url, upstream.timeout, policy)
            .context("Failed to create Minecraft client")?,
    );
    let search = Arc::new(
        SearchClient::new(
            &upstream.duckduckgo_url,
            &upstream.duckduckgo_links_url,
            upstream.timeout,
            policy,
        )
        .context("Failed to create search client")?,
    );
    let wynncraft = Arc::new(
        WynncraftClient::new(&upstream.wynncraft_url, upstream.timeout, policy)
            .context("Failed to create Wynncraft client")?,
    );
    let dictionary = Arc::new(
        DictionaryClient::new(&upstream.duckduckgo_url, upstream.timeout)
            .context("Failed to create dictionary client")?,
    );
    let xkcd = Arc::new(
        XkcdClient::new(&upstream.xkcd_url, upstream.timeout)
            .context("Failed to create XKCD client")?,
    );
    let trivia = Arc::new(
        TriviaClient::new(&upstream.opentdb_url, upstream.timeout)
            .context("Failed to create trivia client")?,
    );

    let discord = DiscordClient::new(
        &config.discord.api_base,
        &config.discord.application_id,
        config.discord.token.clone(),
    )
    .context("Failed to create Discord client")?;
    let verifier = SignatureVerifier::from_hex(&config.discord.public_key)
        .context("Invalid Discord public key")?;

    // Create command handlers
    let mut handlers: Vec<Arc<dyn CommandHandler>> = vec![
        Arc::new(SteamHandler::new(steam.clone())),
        Arc::new(MinecraftHandler::new(minecraft.clone(), &upstream.mcsrvstat_url)),
        Arc::new(SearchHandler::new(search.clone())),
        Arc::new(WynncraftHandler::new(wynncraft.clone())),
        Arc::new(DictionaryHandler::new(dictionary)),
        Arc::new(XkcdHandler::new(xkcd)),
        Arc::new(TriviaHandler::new(trivia)),
    ];
    let help = HelpHandler::new(&handlers);
    handlers.push(Arc::new(help));

    info!("Registered {} command handlers", handlers.len());

    let components = Arc::new(ComponentRegistry::new(config.cache.component_ttl));
    let state = AppState::new(verifier, discord, components.clone(), handlers);

    // Cache sweeping
    let mut sweeper = CacheSweeper::new();
    steam.register_sweeps(&mut sweeper);
    minecraft.register_sweeps(&mut sweeper);
    search.register_sweeps(&mut sweeper);
    wynncraft.register_sweeps(&mut sweeper);
    components.register_sweep(&mut sweeper);
    sweeper.register("throttles", state.throttles.clone(), config.cache.sweep_interval);
    let sweeper_handle = Arc::new(sweeper).spawn(config.cache.sweep_interval);

    info!(
        "Caches ready (ttl={:?}, alias_ttl_factor={}, components={:?})",
        config.cache.ttl, config.cache.alias_ttl_factor, config.cache.component_ttl
    );

    let app = create_router_with_rate_limit(
        state,
        RateLimitState::new(config.bot.rate_limit_per_minute),
    );

    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}/interactions", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    sweeper_handle.abort();
    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
