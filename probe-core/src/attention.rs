//! Attention feed: which devices need an operator, and in what order.

use serde::Serialize;

use crate::model::AttentionDevice;
use crate::status::DeviceStatus;

/// Keep alert-worthy devices, most urgent first.
///
/// The sort is stable, so equal-rank devices keep their input order and
/// repeated renders of the same response do not shuffle.
pub fn select_and_order(devices: Vec<AttentionDevice>) -> Vec<AttentionDevice> {
    let mut selected: Vec<_> = devices
        .into_iter()
        .filter(|d| d.status.is_alert_worthy())
        .collect();
    selected.sort_by_key(|d| d.status.rank());
    selected
}

/// Per-category totals for the KPI tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttentionCounts {
    pub needs_water: usize,
    pub monitor: usize,
    pub offline: usize,
}

impl AttentionCounts {
    pub fn tally(statuses: impl IntoIterator<Item = DeviceStatus>) -> Self {
        let mut counts = Self::default();
        for s in statuses {
            match s {
                DeviceStatus::Red => counts.needs_water += 1,
                DeviceStatus::Amber => counts.monitor += 1,
                DeviceStatus::Stale | DeviceStatus::Offline | DeviceStatus::Gray => {
                    counts.offline += 1
                }
                DeviceStatus::Green | DeviceStatus::Blue | DeviceStatus::Unknown => {}
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.needs_water + self.monitor + self.offline
    }
}
