pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod store;

pub use metrics::{get_metrics, init_metrics};
pub use store::{CollectionStore, PokemonCollection, StoreError};
