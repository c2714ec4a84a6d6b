//! Sales cycle models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::CycleId;

/// A time-boxed sales round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cycle {
    pub id: CycleId,
    pub name: String,
    pub offer_window_start: Option<DateTime<Utc>>,
    pub offer_window_end: Option<DateTime<Utc>>,
    pub status: CycleStatus,
}

impl Cycle {
    pub fn is_active(&self) -> bool {
        self.status == CycleStatus::Active
    }

    /// Whether suppliers may still submit offers at `now`
    pub fn accepts_offers_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        let started = self.offer_window_start.map_or(true, |start| now >= start);
        let not_ended = self.offer_window_end.map_or(true, |end| now <= end);
        started && not_ended
    }
}

/// Lifecycle of a cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Active,
    /// Ended at period end or closed by an admin
    #[serde(alias = "finished")]
    Inactive,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Active => "active",
            CycleStatus::Inactive => "inactive",
        }
    }

    pub fn from_active_flag(active: bool) -> Self {
        if active {
            CycleStatus::Active
        } else {
            CycleStatus::Inactive
        }
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleStatus::Active => write!(f, "Active"),
            CycleStatus::Inactive => write!(f, "Inactive"),
        }
    }
}
