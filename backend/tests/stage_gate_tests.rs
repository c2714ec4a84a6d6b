//! Market stage tests
//!
//! Tests for the composition sequence of a cycle including:
//! - Unlock gate (stage N opens when stage N-1 is done)
//! - Inactive cycles lock every stage
//! - Active stage resolution
//! - Direct-sale publishing checks

use proptest::prelude::*;
use shared::*;

fn cycle(status: CycleStatus) -> Cycle {
    Cycle {
        id: "c1".to_string(),
        name: "Ciclo de março".to_string(),
        offer_window_start: None,
        offer_window_end: None,
        status,
    }
}

fn stage(order: u32, status: CompositionStatus) -> MarketStage {
    MarketStage {
        id: format!("s{}", order),
        cycle_id: "c1".to_string(),
        market_id: format!("m{}", order),
        order,
        sale_type: SaleType::Basket,
        composition_status: status,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Stage 2 opens after stage 1 is done; stage 3 waits for stage 2
    #[test]
    fn test_sequential_unlock() {
        let stages = vec![
            stage(1, CompositionStatus::Done),
            stage(2, CompositionStatus::Pending),
            stage(3, CompositionStatus::Pending),
        ];
        let active = cycle(CycleStatus::Active);

        assert!(!is_stage_locked(&active, &stages[0], &stages));
        assert!(!is_stage_locked(&active, &stages[1], &stages));
        assert!(is_stage_locked(&active, &stages[2], &stages));
    }

    /// An inactive cycle locks even stage 1
    #[test]
    fn test_inactive_cycle_locks_first_stage() {
        let stages = vec![stage(1, CompositionStatus::Pending)];
        let finished = cycle(CycleStatus::Inactive);

        assert!(is_stage_locked(&finished, &stages[0], &stages));
    }

    /// A gap in the sequence keeps the next stage closed
    #[test]
    fn test_missing_predecessor_locks() {
        let stages = vec![
            stage(1, CompositionStatus::Done),
            stage(3, CompositionStatus::Pending),
        ];

        assert!(is_stage_locked(&cycle(CycleStatus::Active), &stages[1], &stages));
    }

    /// A malformed order 0 has no predecessor and stays closed
    #[test]
    fn test_order_zero_locked() {
        let stages = vec![
            stage(0, CompositionStatus::Pending),
            stage(1, CompositionStatus::Done),
        ];

        assert!(is_stage_locked(&cycle(CycleStatus::Active), &stages[0], &stages));
    }

    /// Drafts, publishing and completion only touch open stages
    #[test]
    fn test_closed_stages_reject_writes() {
        let stages = vec![
            stage(1, CompositionStatus::InProgress),
            stage(2, CompositionStatus::Pending),
        ];
        let active = cycle(CycleStatus::Active);
        let finished = cycle(CycleStatus::Inactive);

        assert_eq!(ensure_stage_open(&active, &stages[0], &stages), Ok(()));
        assert_eq!(
            ensure_stage_open(&active, &stages[1], &stages),
            Err(StageClosed::Locked)
        );
        assert_eq!(
            ensure_stage_open(&finished, &stages[0], &stages),
            Err(StageClosed::CycleInactive)
        );
        assert_eq!(StageClosed::Locked.code(), "STAGE_LOCKED");
    }

    /// Stages of other cycles never count as predecessors
    #[test]
    fn test_predecessor_from_other_cycle_ignored() {
        let mut other = stage(1, CompositionStatus::Done);
        other.cycle_id = "c2".to_string();
        let stages = vec![other, stage(2, CompositionStatus::Pending)];

        assert!(is_stage_locked(&cycle(CycleStatus::Active), &stages[1], &stages));
    }

    /// In-progress stages come before pending ones
    #[test]
    fn test_active_stage_prefers_in_progress() {
        let stages = vec![
            stage(3, CompositionStatus::InProgress),
            stage(1, CompositionStatus::Done),
            stage(2, CompositionStatus::Pending),
        ];

        let active = resolve_active_stage(&stages, None);
        assert_eq!(active.map(|s| s.order), Some(3));
    }

    /// The lowest pending order wins when nothing is in progress
    #[test]
    fn test_active_stage_lowest_pending() {
        let stages = vec![
            stage(3, CompositionStatus::Pending),
            stage(2, CompositionStatus::Pending),
            stage(1, CompositionStatus::Done),
        ];

        let active = resolve_active_stage(&stages, None);
        assert_eq!(active.map(|s| s.order), Some(2));
    }

    /// A chosen stage wins even when locked; unknown choices fall back
    #[test]
    fn test_active_stage_override() {
        let stages = vec![
            stage(1, CompositionStatus::InProgress),
            stage(2, CompositionStatus::Pending),
        ];

        assert_eq!(resolve_active_stage(&stages, Some("s2")).map(|s| s.order), Some(2));
        assert_eq!(resolve_active_stage(&stages, Some("nope")).map(|s| s.order), Some(1));
    }

    /// Nothing left to compose
    #[test]
    fn test_active_stage_all_done() {
        let stages = vec![
            stage(1, CompositionStatus::Done),
            stage(2, CompositionStatus::Done),
        ];

        assert!(resolve_active_stage(&stages, None).is_none());
    }

    /// Publishing reasons, checked in order
    #[test]
    fn test_publish_direct_sale_reasons() {
        let active = cycle(CycleStatus::Active);
        let finished = cycle(CycleStatus::Inactive);

        let basket = stage(1, CompositionStatus::InProgress);
        assert_eq!(
            can_publish_direct_sale(&active, &basket),
            Err(PublishBlocked::NotDirectSale)
        );

        let mut direct = stage(1, CompositionStatus::InProgress);
        direct.sale_type = SaleType::DirectSale;
        assert_eq!(
            can_publish_direct_sale(&finished, &direct),
            Err(PublishBlocked::CycleInactive)
        );
        assert_eq!(can_publish_direct_sale(&active, &direct), Ok(()));

        direct.composition_status = CompositionStatus::Pending;
        let check = PublishCheck::from(can_publish_direct_sale(&active, &direct));
        assert!(!check.can);
        assert_eq!(check.reason.as_deref(), Some("no items in composition"));
    }

    /// Stage views come back in order with their lock state
    #[test]
    fn test_stage_views_ordered() {
        let stages = vec![
            stage(2, CompositionStatus::Pending),
            stage(1, CompositionStatus::InProgress),
        ];

        let views = stage_views(&cycle(CycleStatus::Active), &stages);
        let summary: Vec<(u32, bool)> = views.iter().map(|v| (v.stage.order, v.locked)).collect();
        assert_eq!(summary, vec![(1, false), (2, true)]);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = CompositionStatus> {
        prop_oneof![
            Just(CompositionStatus::Pending),
            Just(CompositionStatus::InProgress),
            Just(CompositionStatus::Done),
        ]
    }

    fn stages_strategy() -> impl Strategy<Value = Vec<MarketStage>> {
        prop::collection::vec(status_strategy(), 1..8).prop_map(|statuses| {
            statuses
                .into_iter()
                .enumerate()
                .map(|(i, status)| stage(i as u32 + 1, status))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Stage 1 of an active cycle is always open
        #[test]
        fn prop_first_stage_open(stages in stages_strategy()) {
            prop_assert!(!is_stage_locked(&cycle(CycleStatus::Active), &stages[0], &stages));
        }

        /// An inactive cycle locks everything
        #[test]
        fn prop_inactive_locks_all(stages in stages_strategy()) {
            let finished = cycle(CycleStatus::Inactive);
            for stage in &stages {
                prop_assert!(is_stage_locked(&finished, stage, &stages));
            }
        }

        /// A stage is open exactly when its predecessor is done
        #[test]
        fn prop_open_iff_predecessor_done(stages in stages_strategy()) {
            let active = cycle(CycleStatus::Active);
            for pair in stages.windows(2) {
                let locked = is_stage_locked(&active, &pair[1], &stages);
                prop_assert_eq!(locked, pair[0].composition_status != CompositionStatus::Done);
            }
        }

        /// Completing a predecessor never locks a stage
        #[test]
        fn prop_completion_only_unlocks(stages in stages_strategy(), index in 0usize..8) {
            let active = cycle(CycleStatus::Active);
            let index = index % stages.len();

            let mut completed = stages.clone();
            completed[index].composition_status = CompositionStatus::Done;

            for (before, after) in stages.iter().zip(&completed) {
                if !is_stage_locked(&active, before, &stages) {
                    prop_assert!(!is_stage_locked(&active, after, &completed));
                }
            }
        }

        /// A stage accepts writes exactly when the cycle is active and it is unlocked
        #[test]
        fn prop_open_matches_gate(stages in stages_strategy(), active in any::<bool>()) {
            let status = if active { CycleStatus::Active } else { CycleStatus::Inactive };
            let cycle = cycle(status);
            for stage in &stages {
                prop_assert_eq!(
                    ensure_stage_open(&cycle, stage, &stages).is_ok(),
                    !is_stage_locked(&cycle, stage, &stages)
                );
            }
        }

        /// The resolved stage is never done unless chosen explicitly
        #[test]
        fn prop_active_stage_not_done(stages in stages_strategy()) {
            match resolve_active_stage(&stages, None) {
                Some(stage) => prop_assert_ne!(stage.composition_status, CompositionStatus::Done),
                None => prop_assert!(stages
                    .iter()
                    .all(|s| s.composition_status == CompositionStatus::Done)),
            }
        }
    }
}
