//! Domain models for the pokemon service.

pub mod collection;
pub mod requests;

pub use collection::decode_collection;
pub use requests::{AddPokemonRequest, BattleRecommendationRequest};
