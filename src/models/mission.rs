use super::{DurationType, ItemKey, ShipId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A concrete (ship, duration type) launch option derived from the current
/// ship-level snapshot plus research levels. See spec §3/§4.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionOption {
    pub ship: ShipId,
    pub mission_id: String,
    pub duration_type: DurationType,
    pub level: u32,
    pub duration_seconds: f64,
    pub capacity: f64,
}

/// Planner-internal: a mission option joined with loot data for a specific
/// target-family, carrying expected per-launch yields restricted to the
/// current closure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionAction {
    pub key: String,
    pub mission_id: String,
    pub ship: ShipId,
    pub duration_type: DurationType,
    pub duration_seconds: f64,
    pub target_afx_id: String,
    pub yields: BTreeMap<ItemKey, f64>,
}

impl MissionAction {
    pub fn make_key(mission_id: &str, target_afx_id: &str) -> String {
        format!("{mission_id}|{target_afx_id}")
    }

    pub fn yield_of(&self, item: &ItemKey) -> f64 {
        self.yields.get(item).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct MissionOptionFingerprint {
    pub ship: ShipId,
    pub mission_id: String,
    pub duration_type: DurationType,
    pub level: u32,
    pub duration_seconds_millis: i64,
    pub capacity_millis: i64,
}

/// Builds the fingerprint that the horizon search deduplicates progression
/// states by: two states yielding bit-identical mission options collapse to
/// whichever has the smaller prep cost (spec §4.6).
pub fn mission_options_fingerprint(options: &[MissionOption]) -> Vec<MissionOptionFingerprint> {
    let mut fp: Vec<MissionOptionFingerprint> = options
        .iter()
        .map(|o| MissionOptionFingerprint {
            ship: o.ship,
            mission_id: o.mission_id.clone(),
            duration_type: o.duration_type,
            level: o.level,
            duration_seconds_millis: (o.duration_seconds * 1000.0).round() as i64,
            capacity_millis: (o.capacity * 1000.0).round() as i64,
        })
        .collect();
    fp.sort();
    fp
}
