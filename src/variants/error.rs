use crate::data::matches::MatchId;
use crate::data::player::{PlayerId, RatingError};
use crate::variants::types::VariantId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("match {0} not found")]
    MatchNotFound(MatchId),
    #[error("variant {0} not found")]
    VariantNotFound(VariantId),
    #[error("match {0} has no starters")]
    NoStarters(MatchId),
    #[error("player '{0}' has no ratings")]
    MissingRatings(PlayerId),
    #[error("player '{0}' is not a starter for this match")]
    NotAStarter(PlayerId),
    #[error("player '{0}' appears more than once in the split")]
    DuplicatePlayer(PlayerId),
    #[error("player '{0}' is not signed up for this match")]
    NotSignedUp(PlayerId),
    #[error("player '{0}' is already signed up for this match")]
    AlreadySignedUp(PlayerId),
    #[error("match {match_id} already has {capacity} starters")]
    StartersFull { match_id: MatchId, capacity: usize },
    #[error("invalid ratings: {0}")]
    Rating(#[from] RatingError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MatchNotFound(_) | Self::VariantNotFound(_))
    }
}
