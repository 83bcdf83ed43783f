use super::ItemId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftLine {
    pub item_id: ItemId,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedYield {
    pub item_id: ItemId,
    pub expected_per_launch: f64,
    pub expected_total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionRow {
    pub mission_id: String,
    pub ship: String,
    pub duration_type: String,
    pub duration_seconds: f64,
    pub launches: u32,
    pub target_afx_id: String,
    pub top_expected_yields: Vec<ExpectedYield>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetBreakdown {
    pub requested: u32,
    pub from_inventory: u32,
    pub from_craft: u32,
    pub from_missions_expected: f64,
    pub shortfall: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedShipLevel {
    pub ship: String,
    pub level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    pub prep_hours: f64,
    pub prep_launches: u32,
    pub projected_ship_levels: Vec<ProjectedShipLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerResult {
    pub target_item_id: ItemId,
    pub quantity: u32,
    pub priority_time: f64,
    pub ge_cost: f64,
    pub total_slot_seconds: f64,
    pub expected_hours: f64,
    pub weighted_score: f64,
    pub crafts: Vec<CraftLine>,
    pub missions: Vec<MissionRow>,
    pub unmet_items: Vec<ItemId>,
    pub target_breakdown: TargetBreakdown,
    pub progression: Progression,
    pub notes: Vec<String>,
}
