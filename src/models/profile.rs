use super::{DurationType, ItemKey, MissionOption, ShipId, ShipLevelSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Player profile, keyed internally by [`ItemKey`]/[`ShipId`]. See spec §6.4.
///
/// `shipLevels` and `missionOptions` are carried on the wire but are
/// re-derived by the planner from `launchCounts`-equivalent data whenever it
/// builds a candidate; callers should treat the fields here as the
/// as-fetched snapshot, not a source of truth the planner mutates in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub eid: String,
    pub inventory: BTreeMap<ItemKey, u32>,
    pub craft_counts: BTreeMap<ItemKey, u32>,
    pub epic_research_ftl_level: u32,
    pub epic_research_zerog_level: u32,
    pub ship_levels: BTreeMap<ShipId, ShipLevelSnapshot>,
    pub mission_options: Vec<MissionOption>,
}

impl PlayerProfile {
    pub fn launch_counts(&self) -> BTreeMap<ShipId, BTreeMap<DurationType, u32>> {
        self.ship_levels
            .iter()
            .map(|(ship, snap)| (*ship, snap.launches_by_duration.clone()))
            .collect()
    }

    pub fn inventory_of(&self, item: &ItemKey) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn craft_count_of(&self, item: &ItemKey) -> u32 {
        self.craft_counts.get(item).copied().unwrap_or(0)
    }
}
