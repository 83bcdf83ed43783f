use serde::{Deserialize, Serialize};

/// Wire format returned by the (out-of-scope) loot-table loader. See spec §6.3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootData {
    pub missions: Vec<LootMission>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootMission {
    pub mission_id: String,
    pub levels: Vec<LootLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootLevel {
    pub level: u32,
    pub targets: Vec<LootTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootTarget {
    pub total_drops: f64,
    pub target_afx_id: String,
    pub items: Vec<LootItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootItem {
    pub item_id: String,
    /// Per-tier drop counts; tier is fungible (spec Non-goals: no rarity
    /// modeling), so downstream code sums this array.
    pub counts: [f64; 4],
}

impl LootItem {
    pub fn total_count(&self) -> f64 {
        self.counts.iter().sum()
    }
}

impl LootMission {
    /// Picks the highest `levels[].level` that is `<= level`; falls back to
    /// the first record if none qualifies (spec §4.2).
    pub fn level_for(&self, level: u32) -> Option<&LootLevel> {
        self.levels
            .iter()
            .filter(|l| l.level <= level)
            .max_by_key(|l| l.level)
            .or_else(|| self.levels.first())
    }
}
