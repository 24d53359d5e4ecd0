//! Request bodies. Fields are optional at the serde level so that a missing
//! field and an empty one are rejected by the same validation step.

use serde::Deserialize;
use validator::Validate;

/// Body of `POST /my-pokemons`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AddPokemonRequest {
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
}

impl AddPokemonRequest {
    /// The name to store, or `None` when it is missing or empty.
    pub fn into_valid_name(self) -> Option<String> {
        self.validate().ok()?;
        self.name
    }
}

/// Body of `POST /battle-recommendation`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BattleRecommendationRequest {
    #[validate(required, length(min = 1))]
    pub wild_pokemon: Option<String>,
}

impl BattleRecommendationRequest {
    pub fn into_valid_wild_pokemon(self) -> Option<String> {
        self.validate().ok()?;
        self.wild_pokemon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_request_accepts_name() {
        let request: AddPokemonRequest = serde_json::from_str(r#"{"name":"Pikachu"}"#).unwrap();
        assert_eq!(request.into_valid_name().as_deref(), Some("Pikachu"));
    }

    #[test]
    fn add_request_rejects_missing_and_empty_name() {
        let missing: AddPokemonRequest = serde_json::from_str("{}").unwrap();
        assert!(missing.into_valid_name().is_none());

        let empty: AddPokemonRequest = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert!(empty.into_valid_name().is_none());
    }

    #[test]
    fn battle_request_uses_camel_case_field() {
        let request: BattleRecommendationRequest =
            serde_json::from_str(r#"{"wildPokemon":"Geodude"}"#).unwrap();
        assert_eq!(request.into_valid_wild_pokemon().as_deref(), Some("Geodude"));

        let snake: BattleRecommendationRequest =
            serde_json::from_str(r#"{"wild_pokemon":"Geodude"}"#).unwrap();
        assert!(snake.into_valid_wild_pokemon().is_none());
    }
}
