//! HTTP request handlers.

use super::{AppState, DiscordSurface};
use crate::commands::{CommandContext, CommandHandler};
use crate::error::{AppError, AppResult};
use crate::render::to_payload;
use crate::throttle::throttled_message;
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use discord_client::{
    CommandArgs, DiscordClient, Interaction, InteractionResponse, InteractionType, MessagePayload,
    SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use interactive::{parse_scoped_id, ComponentRegistry};
use serde::Serialize;
use tracing::{debug, error, info, warn};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub commands: usize,
    pub live_components: usize,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        commands: state.commands.len(),
        live_components: state.components.len(),
    })
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::InvalidSignature)
}

/// Interaction webhook.
///
/// Every request must carry a valid Ed25519 signature over timestamp and
/// body. Commands and component presses are acknowledged immediately and
/// finished in the background.
pub async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<InteractionResponse>> {
    let signature = header(&headers, SIGNATURE_HEADER)?;
    let timestamp = header(&headers, TIMESTAMP_HEADER)?;
    if let Err(e) = state.verifier.verify(signature, timestamp, &body) {
        warn!("Rejected interaction: {}", e);
        return Err(AppError::InvalidSignature);
    }

    let interaction: Interaction = serde_json::from_slice(&body)?;
    let response = match interaction.kind {
        InteractionType::Ping => {
            debug!("Ping");
            InteractionResponse::pong()
        }
        InteractionType::ApplicationCommand => start_command(&state, interaction)?,
        InteractionType::MessageComponent => start_component(&state, interaction)?,
        other => {
            return Err(AppError::BadRequest(format!(
                "Unsupported interaction type {:?}",
                other
            )))
        }
    };
    Ok(Json(response))
}

fn ephemeral_message(text: impl Into<String>) -> InteractionResponse {
    InteractionResponse::message(MessagePayload::text(text).ephemeral())
}

fn start_command(state: &AppState, interaction: Interaction) -> AppResult<InteractionResponse> {
    let args = interaction
        .command_args()
        .ok_or_else(|| AppError::BadRequest("Missing command data".into()))?;
    let user = interaction
        .actor()
        .ok_or_else(|| AppError::BadRequest("Missing user".into()))?;

    let Some(handler) = state.command(args.name()) else {
        warn!(command = args.name(), "Unknown command");
        return Ok(ephemeral_message("Unknown command."));
    };
    if let Err(wait) = state.throttles.check(handler.name(), &user.id) {
        return Ok(ephemeral_message(throttled_message(wait)));
    }

    info!(
        command = %args.path.join(" "),
        user = %user.username,
        user_id = %user.id,
        "Running command"
    );
    let ephemeral = handler.ephemeral(&args);
    let ctx = CommandContext {
        interaction_id: interaction.id.clone(),
        user_id: user.id.clone(),
        components: state.components.clone(),
    };
    let discord = state.discord.clone();
    tokio::spawn(async move {
        finish_command(&discord, handler.as_ref(), &ctx, &args, &interaction.token).await;
    });

    Ok(InteractionResponse::deferred(ephemeral))
}

/// Run a command and replace its deferred response with the result.
pub async fn finish_command(
    discord: &DiscordClient,
    handler: &dyn CommandHandler,
    ctx: &CommandContext,
    args: &CommandArgs,
    token: &str,
) {
    let reply = match handler.execute(ctx, args).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(command = handler.name(), "Command failed: {}", e);
            e.to_reply()
        }
    };

    let payload = to_payload(&reply.scoped(&ctx.interaction_id));
    if let Err(e) = discord.edit_original(token, &payload).await {
        error!(command = handler.name(), "Failed to send reply: {}", e);
    }
}

fn start_component(state: &AppState, interaction: Interaction) -> AppResult<InteractionResponse> {
    let custom_id = interaction
        .custom_id()
        .ok_or_else(|| AppError::BadRequest("Missing custom_id".into()))?
        .to_string();
    let actor_id = interaction
        .actor()
        .map(|user| user.id.clone())
        .ok_or_else(|| AppError::BadRequest("Missing user".into()))?;
    let Some((scope, _)) = parse_scoped_id(&custom_id) else {
        debug!(custom_id, "Ignoring component without scope");
        return Ok(InteractionResponse::deferred_update());
    };

    let values = interaction.values().to_vec();
    let surface = DiscordSurface::new(state.discord.clone(), interaction.token, scope);
    let components = state.components.clone();
    tokio::spawn(async move {
        dispatch_component(&components, &custom_id, &actor_id, &values, &surface).await;
    });

    Ok(InteractionResponse::deferred_update())
}

/// Route a component press to its live message.
pub async fn dispatch_component(
    components: &ComponentRegistry,
    custom_id: &str,
    actor_id: &str,
    values: &[String],
    surface: &DiscordSurface,
) {
    let outcome = components.dispatch(custom_id, actor_id, values, surface).await;
    debug!(custom_id, actor_id, ?outcome, "Component handled");
}
