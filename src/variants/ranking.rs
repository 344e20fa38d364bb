use crate::balance::TeamPartition;
use crate::variants::types::VariantKind;

/// One algorithm run before it is ranked and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub partition: TeamPartition,
    pub seed: u64,
    pub score: f64,
    pub mean_delta: f64,
}

/// Orders candidates by ascending mean delta (balance score breaks ties) and labels them
/// V1, V2, V3. Anything past the third candidate is dropped.
pub fn rank_candidates(mut candidates: Vec<Candidate>) -> Vec<(VariantKind, Candidate)> {
    candidates.sort_by(|left, right| {
        left.mean_delta
            .total_cmp(&right.mean_delta)
            .then_with(|| left.score.total_cmp(&right.score))
    });

    VariantKind::GENERATED
        .into_iter()
        .zip(candidates)
        .collect()
}
