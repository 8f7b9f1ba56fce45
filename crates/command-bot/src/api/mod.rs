//! HTTP interactions endpoint.

mod handlers;
mod middleware;
mod surface;

pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, RateLimitState};
pub use surface::DiscordSurface;

use crate::commands::CommandHandler;
use crate::throttle::CommandThrottles;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use discord_client::{DiscordClient, SignatureVerifier};
use interactive::ComponentRegistry;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Verifies that requests come from Discord
    pub verifier: Arc<SignatureVerifier>,
    /// Webhook client for deferred replies
    pub discord: Arc<DiscordClient>,
    /// Live interactive messages
    pub components: Arc<ComponentRegistry>,
    /// Registered commands
    pub commands: Arc<Vec<Arc<dyn CommandHandler>>>,
    /// Per-user command throttles
    pub throttles: Arc<CommandThrottles>,
}

impl AppState {
    /// Create new application state. Throttles come from the commands.
    pub fn new(
        verifier: SignatureVerifier,
        discord: DiscordClient,
        components: Arc<ComponentRegistry>,
        commands: Vec<Arc<dyn CommandHandler>>,
    ) -> Self {
        let mut throttles = CommandThrottles::new();
        for command in &commands {
            if let Some(throttle) = command.throttle() {
                throttles.add(command.name(), throttle);
            }
        }

        Self {
            verifier: Arc::new(verifier),
            discord: Arc::new(discord),
            components,
            commands: Arc::new(commands),
            throttles: Arc::new(throttles),
        }
    }

    pub fn command(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.commands.iter().find(|c| c.name() == name).cloned()
    }
}

/// Create the API router with rate limiting.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(600))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/interactions", post(handlers::interactions))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
