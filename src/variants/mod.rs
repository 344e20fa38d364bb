//! Team variants for a match: generation, ranking, apply and the manual slot.

pub mod error;
pub mod ranking;
pub mod service;
pub mod store;
pub mod types;

pub use error::{ServiceError, StoreError};
pub use service::{GenerationConfig, VariantService};
pub use store::{InMemoryStore, JsonFileStore, MatchStore};
pub use types::{ManualVariantOutcome, Variant, VariantAlgorithm, VariantId, VariantKind};
