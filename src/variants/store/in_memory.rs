use std::sync::Mutex;

use crate::variants::error::StoreError;
use crate::variants::store::{StateBackend, StoreState};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Clones the current state, e.g. to write a snapshot.
    pub fn snapshot(&self) -> Result<StoreState, StoreError> {
        self.read(|state| state.clone())
    }
}

impl StateBackend for InMemoryStore {
    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> Result<R, StoreError> {
        let guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&guard))
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> Result<R, StoreError> {
        let mut guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut guard))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::InMemoryStore;
    use crate::data::format::MatchFormat;
    use crate::data::matches::{MatchRecord, TeamAssignment, TeamSide};
    use crate::variants::store::MatchStore;
    use crate::variants::types::{Variant, VariantAlgorithm, VariantKind};

    fn variant(match_id: Uuid, kind: VariantKind) -> Variant {
        Variant {
            id: Uuid::new_v4(),
            match_id,
            ordinal: kind.ordinal(),
            kind,
            algorithm: VariantAlgorithm::GreedyLocal,
            seed: Some(1),
            score: 0.0,
            mean_delta: 0.0,
            computed_best: kind == VariantKind::V1,
            recommended: kind == VariantKind::V1,
            light: vec![],
            dark: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn variants_are_listed_by_ordinal_and_scoped_to_match() {
        let store = InMemoryStore::new();
        let match_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        for kind in [VariantKind::V3, VariantKind::V1, VariantKind::V2] {
            store.insert_variant(variant(match_id, kind)).expect("insert");
        }
        store.insert_variant(variant(other, VariantKind::V1)).expect("insert");

        let kinds: Vec<VariantKind> = store
            .list_variants(match_id)
            .expect("list")
            .into_iter()
            .map(|v| v.kind)
            .collect();
        assert_eq!(kinds, vec![VariantKind::V1, VariantKind::V2, VariantKind::V3]);

        assert_eq!(store.delete_variant_kind(match_id, VariantKind::V2).expect("delete"), 1);
        assert_eq!(store.delete_variants(match_id).expect("delete"), 2);
        assert_eq!(store.list_variants(other).expect("list").len(), 1);
    }

    #[test]
    fn mark_recommended_leaves_exactly_one() {
        let store = InMemoryStore::new();
        let match_id = Uuid::new_v4();
        let v1 = variant(match_id, VariantKind::V1);
        let v3 = variant(match_id, VariantKind::V3);
        let v3_id = v3.id;
        store.insert_variant(v1).expect("insert");
        store.insert_variant(v3).expect("insert");

        store.mark_recommended(match_id, v3_id).expect("mark");
        let recommended: Vec<_> = store
            .list_variants(match_id)
            .expect("list")
            .into_iter()
            .filter(|v| v.recommended)
            .map(|v| v.id)
            .collect();
        assert_eq!(recommended, vec![v3_id]);
    }

    #[test]
    fn ensure_teams_is_idempotent() {
        let store = InMemoryStore::new();
        let record = MatchRecord::new(MatchFormat::FiveASide, None);
        let match_id = record.id;
        store.insert_match(record).expect("insert");

        let first = store.ensure_teams(match_id).expect("teams");
        let second = store.ensure_teams(match_id).expect("teams");
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);

        store
            .replace_assignments(
                match_id,
                vec![TeamAssignment {
                    side: TeamSide::Dark,
                    player_id: "x".into(),
                }],
            )
            .expect("assign");
        assert_eq!(store.load_assignments(match_id).expect("load").len(), 1);
        store.replace_assignments(match_id, vec![]).expect("clear");
        assert!(store.load_assignments(match_id).expect("load").is_empty());
    }

    #[test]
    fn save_signups_reports_missing_match() {
        let store = InMemoryStore::new();
        assert!(!store.save_signups(Uuid::new_v4(), vec![]).expect("save"));
    }
}
