//! Petitions is a small data layer which fetches a petitions feed over HTTP
//! and publishes it to an observable [store::Store].
pub mod config;
pub mod errorhandling;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod store;
pub mod transport;

pub use model::Petition;
pub use pipeline::GetPetitions;
pub use store::Store;
