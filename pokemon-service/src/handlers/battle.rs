use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::time::Instant;

use crate::models::BattleRecommendationRequest;
use crate::services::{metrics, prompt};
use crate::startup::AppState;

pub const WILD_POKEMON_REQUIRED: &str = "A wild Pokémon name is required.";
pub const NO_OWNED_POKEMON: &str = "You have no Pokémon yet. Please add a Pokémon first.";
pub const RECOMMENDATION_FAILED: &str = "Failed to get a battle recommendation.";

/// Reads the owned collection, asks the text provider for a matchup analysis
/// against the wild pokemon, and returns its answer verbatim as plain text.
#[tracing::instrument(skip(state, payload))]
pub async fn battle_recommendation(
    State(state): State<AppState>,
    payload: Result<Json<BattleRecommendationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let wild = match payload {
        Ok(Json(request)) => request.into_valid_wild_pokemon(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable battle-recommendation body");
            None
        }
    }
    .ok_or_else(|| AppError::bad_request(WILD_POKEMON_REQUIRED))?;

    let owned = state
        .collection
        .list()
        .await
        .map_err(|e| AppError::collaborator(RECOMMENDATION_FAILED, e))?;

    if owned.is_empty() {
        return Err(AppError::bad_request(NO_OWNED_POKEMON));
    }

    let prompt = prompt::battle_prompt(&owned, &wild);
    let model = state.text_provider.model().to_string();

    let start = Instant::now();
    let result = state.text_provider.generate(&prompt).await;
    metrics::record_collaborator_call("genai", "generate", start.elapsed().as_secs_f64());

    let response = result.map_err(|e| {
        metrics::record_collaborator_error("genai", "generate");
        AppError::collaborator(RECOMMENDATION_FAILED, e)
    })?;

    metrics::record_tokens(&model, response.input_tokens, response.output_tokens);

    tracing::info!(
        wild = %wild,
        owned_count = owned.len(),
        model = %model,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        finish_reason = ?response.finish_reason,
        "Generated battle recommendation"
    );

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        response.text,
    ))
}
