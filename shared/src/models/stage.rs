//! Market stages and the unlock gate
//!
//! Each market taking part in a cycle holds a numbered stage. Stages are
//! composed in order: stage N opens once stage N-1 is done. Composition status
//! is written elsewhere (by composition saves); this module only reads it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Cycle;
use crate::types::{CycleId, MarketId, StageId};

/// One market's slot in a cycle's composition sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketStage {
    pub id: StageId,
    pub cycle_id: CycleId,
    pub market_id: MarketId,
    /// 1-based position within the cycle
    pub order: u32,
    pub sale_type: SaleType,
    pub composition_status: CompositionStatus,
}

/// How a market sells what it composes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    /// Fixed-value basket (cesta)
    #[serde(alias = "cesta")]
    Basket,
    /// Bulk lot (lote)
    #[serde(alias = "lote")]
    Lot,
    /// Direct sale catalog (venda direta)
    #[serde(alias = "venda_direta")]
    DirectSale,
}

impl SaleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::Basket => "basket",
            SaleType::Lot => "lot",
            SaleType::DirectSale => "direct_sale",
        }
    }

    /// Slug used in draft storage keys
    pub fn storage_slug(&self) -> &'static str {
        match self {
            SaleType::Basket => "cesta",
            SaleType::Lot => "lote",
            SaleType::DirectSale => "venda-direta",
        }
    }

    /// Accepts the canonical name, the storage slug or the Portuguese name
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "basket" | "cesta" => Some(SaleType::Basket),
            "lot" | "lote" => Some(SaleType::Lot),
            "direct_sale" | "direct-sale" | "venda-direta" | "venda_direta" => {
                Some(SaleType::DirectSale)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for SaleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleType::Basket => write!(f, "Basket"),
            SaleType::Lot => write!(f, "Lot"),
            SaleType::DirectSale => write!(f, "Direct Sale"),
        }
    }
}

/// Progress of a stage's composition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompositionStatus {
    Pending,
    InProgress,
    Done,
}

impl CompositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionStatus::Pending => "pending",
            CompositionStatus::InProgress => "in_progress",
            CompositionStatus::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(CompositionStatus::Pending),
            "in_progress" => Some(CompositionStatus::InProgress),
            "done" => Some(CompositionStatus::Done),
            _ => None,
        }
    }
}

/// Whether `stage` is closed for composition.
///
/// An inactive cycle locks everything. Otherwise stage 1 is open and any later
/// stage opens only when its predecessor is done. A missing predecessor locks,
/// and so does a malformed order 0, which has none.
pub fn is_stage_locked(cycle: &Cycle, stage: &MarketStage, all_stages: &[MarketStage]) -> bool {
    if !cycle.is_active() {
        return true;
    }
    if stage.order == 1 {
        return false;
    }

    let Some(previous_order) = stage.order.checked_sub(1) else {
        return true;
    };
    let predecessor = all_stages
        .iter()
        .find(|s| s.cycle_id == stage.cycle_id && s.order == previous_order);

    match predecessor {
        Some(prev) => prev.composition_status != CompositionStatus::Done,
        None => true,
    }
}

/// Why a stage cannot be written to
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageClosed {
    #[error("cycle inactive")]
    CycleInactive,

    #[error("previous stage not done")]
    Locked,
}

impl StageClosed {
    pub fn code(&self) -> &'static str {
        match self {
            StageClosed::CycleInactive => "CYCLE_INACTIVE",
            StageClosed::Locked => "STAGE_LOCKED",
        }
    }

    pub fn message_pt(&self) -> &'static str {
        match self {
            StageClosed::CycleInactive => "o ciclo não está ativo",
            StageClosed::Locked => "a etapa anterior ainda não foi concluída",
        }
    }
}

/// Check that a stage may be composed, published or completed.
///
/// Finished cycles are read-only; otherwise the unlock gate decides.
pub fn ensure_stage_open(
    cycle: &Cycle,
    stage: &MarketStage,
    all_stages: &[MarketStage],
) -> Result<(), StageClosed> {
    if !cycle.is_active() {
        return Err(StageClosed::CycleInactive);
    }
    if is_stage_locked(cycle, stage, all_stages) {
        return Err(StageClosed::Locked);
    }
    Ok(())
}

/// Pick the stage the composition screen should open on.
///
/// An explicit choice wins when it names one of `stages`, locked or not.
/// Otherwise the lowest-order stage in progress, then the lowest-order pending
/// one. `None` means every stage is done.
pub fn resolve_active_stage<'a>(
    stages: &'a [MarketStage],
    override_stage_id: Option<&str>,
) -> Option<&'a MarketStage> {
    if let Some(chosen) = override_stage_id.and_then(|id| stages.iter().find(|s| s.id == id)) {
        return Some(chosen);
    }

    let first_with = |status: CompositionStatus| {
        stages
            .iter()
            .filter(|s| s.composition_status == status)
            .min_by_key(|s| s.order)
    };

    first_with(CompositionStatus::InProgress).or_else(|| first_with(CompositionStatus::Pending))
}

/// Why a direct-sale catalog cannot be published
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishBlocked {
    #[error("not a direct-sale stage")]
    NotDirectSale,

    #[error("cycle inactive")]
    CycleInactive,

    #[error("no items in composition")]
    EmptyComposition,
}

impl PublishBlocked {
    pub fn code(&self) -> &'static str {
        match self {
            PublishBlocked::NotDirectSale => "NOT_DIRECT_SALE",
            PublishBlocked::CycleInactive => "CYCLE_INACTIVE",
            PublishBlocked::EmptyComposition => "EMPTY_COMPOSITION",
        }
    }

    /// Portuguese message shown to market administrators
    pub fn message_pt(&self) -> &'static str {
        match self {
            PublishBlocked::NotDirectSale => "esta etapa não é de venda direta",
            PublishBlocked::CycleInactive => "o ciclo não está ativo",
            PublishBlocked::EmptyComposition => "a composição não possui itens",
        }
    }
}

/// Check whether a direct-sale stage can be published
pub fn can_publish_direct_sale(cycle: &Cycle, stage: &MarketStage) -> Result<(), PublishBlocked> {
    if stage.sale_type != SaleType::DirectSale {
        return Err(PublishBlocked::NotDirectSale);
    }
    if !cycle.is_active() {
        return Err(PublishBlocked::CycleInactive);
    }
    if stage.composition_status == CompositionStatus::Pending {
        return Err(PublishBlocked::EmptyComposition);
    }
    Ok(())
}

/// Serializable outcome of a publish check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishCheck {
    pub can: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Result<(), PublishBlocked>> for PublishCheck {
    fn from(result: Result<(), PublishBlocked>) -> Self {
        match result {
            Ok(()) => PublishCheck {
                can: true,
                reason: None,
            },
            Err(blocked) => PublishCheck {
                can: false,
                reason: Some(blocked.to_string()),
            },
        }
    }
}

/// A stage together with its computed lock state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageView {
    #[serde(flatten)]
    pub stage: MarketStage,
    pub locked: bool,
}

/// Annotate every stage of a cycle with its lock state, in stage order
pub fn stage_views(cycle: &Cycle, stages: &[MarketStage]) -> Vec<StageView> {
    let mut views: Vec<StageView> = stages
        .iter()
        .map(|stage| StageView {
            stage: stage.clone(),
            locked: is_stage_locked(cycle, stage, stages),
        })
        .collect();
    views.sort_by_key(|v| v.stage.order);
    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CycleStatus;

    fn cycle(status: CycleStatus) -> Cycle {
        Cycle {
            id: "c1".to_string(),
            name: "Ciclo de março".to_string(),
            offer_window_start: None,
            offer_window_end: None,
            status,
        }
    }

    fn stage(id: &str, order: u32, status: CompositionStatus) -> MarketStage {
        MarketStage {
            id: id.to_string(),
            cycle_id: "c1".to_string(),
            market_id: format!("m{}", order),
            order,
            sale_type: SaleType::Basket,
            composition_status: status,
        }
    }

    #[test]
    fn test_stages_unlock_in_order() {
        let stages = vec![
            stage("s1", 1, CompositionStatus::Done),
            stage("s2", 2, CompositionStatus::Pending),
            stage("s3", 3, CompositionStatus::Pending),
        ];
        let c = cycle(CycleStatus::Active);
        assert!(!is_stage_locked(&c, &stages[0], &stages));
        assert!(!is_stage_locked(&c, &stages[1], &stages));
        assert!(is_stage_locked(&c, &stages[2], &stages));
    }

    #[test]
    fn test_inactive_cycle_locks_stage_one() {
        let stages = vec![stage("s1", 1, CompositionStatus::Pending)];
        assert!(is_stage_locked(&cycle(CycleStatus::Inactive), &stages[0], &stages));
    }

    #[test]
    fn test_missing_predecessor_locks() {
        let stages = vec![
            stage("s1", 1, CompositionStatus::Done),
            stage("s3", 3, CompositionStatus::Pending),
        ];
        assert!(is_stage_locked(&cycle(CycleStatus::Active), &stages[1], &stages));
    }

    #[test]
    fn test_order_zero_stays_locked() {
        let stages = vec![
            stage("s0", 0, CompositionStatus::Pending),
            stage("s1", 1, CompositionStatus::Done),
        ];
        assert!(is_stage_locked(&cycle(CycleStatus::Active), &stages[0], &stages));
    }

    #[test]
    fn test_ensure_stage_open() {
        let stages = vec![
            stage("s1", 1, CompositionStatus::InProgress),
            stage("s2", 2, CompositionStatus::Pending),
        ];
        let active = cycle(CycleStatus::Active);

        assert_eq!(ensure_stage_open(&active, &stages[0], &stages), Ok(()));
        assert_eq!(
            ensure_stage_open(&active, &stages[1], &stages),
            Err(StageClosed::Locked)
        );
        assert_eq!(
            ensure_stage_open(&cycle(CycleStatus::Inactive), &stages[0], &stages),
            Err(StageClosed::CycleInactive)
        );
    }

    #[test]
    fn test_predecessor_from_other_cycle_is_ignored() {
        let mut other = stage("x1", 1, CompositionStatus::Done);
        other.cycle_id = "c2".to_string();
        let stages = vec![other, stage("s2", 2, CompositionStatus::Pending)];
        assert!(is_stage_locked(&cycle(CycleStatus::Active), &stages[1], &stages));
    }

    #[test]
    fn test_resolve_active_stage_prefers_override() {
        let stages = vec![
            stage("s1", 1, CompositionStatus::InProgress),
            stage("s2", 2, CompositionStatus::Pending),
        ];
        assert_eq!(resolve_active_stage(&stages, Some("s2")).unwrap().id, "s2");
        // unknown override falls back to the status rule
        assert_eq!(resolve_active_stage(&stages, Some("zz")).unwrap().id, "s1");
    }

    #[test]
    fn test_resolve_active_stage_in_progress_before_pending() {
        let stages = vec![
            stage("s1", 1, CompositionStatus::Done),
            stage("s3", 3, CompositionStatus::InProgress),
            stage("s2", 2, CompositionStatus::Pending),
        ];
        assert_eq!(resolve_active_stage(&stages, None).unwrap().id, "s3");
    }

    #[test]
    fn test_resolve_active_stage_lowest_pending() {
        let stages = vec![
            stage("s3", 3, CompositionStatus::Pending),
            stage("s2", 2, CompositionStatus::Pending),
        ];
        assert_eq!(resolve_active_stage(&stages, None).unwrap().id, "s2");
    }

    #[test]
    fn test_resolve_active_stage_all_done() {
        let stages = vec![stage("s1", 1, CompositionStatus::Done)];
        assert!(resolve_active_stage(&stages, None).is_none());
    }

    #[test]
    fn test_publish_checks_in_order() {
        let active = cycle(CycleStatus::Active);
        let inactive = cycle(CycleStatus::Inactive);

        let basket = stage("s1", 1, CompositionStatus::Pending);
        assert_eq!(
            can_publish_direct_sale(&inactive, &basket),
            Err(PublishBlocked::NotDirectSale)
        );

        let mut direct = stage("s2", 2, CompositionStatus::Pending);
        direct.sale_type = SaleType::DirectSale;
        assert_eq!(
            can_publish_direct_sale(&inactive, &direct),
            Err(PublishBlocked::CycleInactive)
        );
        assert_eq!(
            can_publish_direct_sale(&active, &direct),
            Err(PublishBlocked::EmptyComposition)
        );

        direct.composition_status = CompositionStatus::InProgress;
        assert_eq!(can_publish_direct_sale(&active, &direct), Ok(()));
    }

    #[test]
    fn test_publish_check_reason_text() {
        let check = PublishCheck::from(Err(PublishBlocked::EmptyComposition));
        assert!(!check.can);
        assert_eq!(check.reason.as_deref(), Some("no items in composition"));
    }

    #[test]
    fn test_sale_type_parse() {
        assert_eq!(SaleType::parse("cesta"), Some(SaleType::Basket));
        assert_eq!(SaleType::parse("venda-direta"), Some(SaleType::DirectSale));
        assert_eq!(SaleType::parse("LOT"), Some(SaleType::Lot));
        assert_eq!(SaleType::parse("feira"), None);
    }

    #[test]
    fn test_stage_views_sorted_and_annotated() {
        let stages = vec![
            stage("s2", 2, CompositionStatus::Pending),
            stage("s1", 1, CompositionStatus::InProgress),
        ];
        let views = stage_views(&cycle(CycleStatus::Active), &stages);
        assert_eq!(views[0].stage.id, "s1");
        assert!(!views[0].locked);
        assert!(views[1].locked);
    }
}
