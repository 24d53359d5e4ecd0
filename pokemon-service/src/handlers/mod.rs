//! HTTP handlers for pokemon-service.

pub mod battle;
pub mod health;
pub mod pokemons;

pub use battle::battle_recommendation;
pub use health::{health_check, metrics_endpoint, root};
pub use pokemons::{add_pokemon, list_pokemons};
