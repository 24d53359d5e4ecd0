use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::models::AddPokemonRequest;
use crate::startup::AppState;

pub const NAME_REQUIRED: &str = "A Pokémon name is required.";
pub const LIST_FAILED: &str = "Failed to load your Pokémon.";
pub const ADD_FAILED: &str = "Failed to add the new Pokémon.";

#[tracing::instrument(skip(state))]
pub async fn list_pokemons(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let pokemons = state
        .collection
        .list()
        .await
        .map_err(|e| AppError::collaborator(LIST_FAILED, e))?;

    tracing::debug!(count = pokemons.len(), "Listed owned pokemons");

    Ok(Json(pokemons))
}

#[tracing::instrument(skip(state, payload))]
pub async fn add_pokemon(
    State(state): State<AppState>,
    payload: Result<Json<AddPokemonRequest>, JsonRejection>,
) -> Result<(StatusCode, String), AppError> {
    let name = match payload {
        Ok(Json(request)) => request.into_valid_name(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable add-pokemon body");
            None
        }
    }
    .ok_or_else(|| AppError::bad_request(NAME_REQUIRED))?;

    let key = state
        .collection
        .add(&name)
        .await
        .map_err(|e| AppError::collaborator(ADD_FAILED, e))?;

    tracing::info!(name = %name, key = %key, "Added pokemon to collection");

    Ok((
        StatusCode::CREATED,
        format!("{} was added successfully.", name),
    ))
}
