use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Fixed ship progression order. Ship `i` unlocks once ship `i-1`'s total
/// launches cross [`UNLOCK_THRESHOLDS`]; the first ship is always unlocked.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum ShipId {
    ChickenOne,
    ChickenNine,
    ChickenHeavy,
    Bcr,
    MilleniumChicken,
    CorellihenCorvette,
    Galeggtica,
    Chickfiant,
    Voyegger,
    Henerprise,
    Atreggies,
}

impl ShipId {
    pub fn order_index(&self) -> usize {
        ShipId::iter().position(|s| s == *self).unwrap()
    }

    pub fn predecessor(&self) -> Option<ShipId> {
        let idx = self.order_index();
        if idx == 0 {
            None
        } else {
            ShipId::iter().nth(idx - 1)
        }
    }

    /// Parses the game's wire-format ship identifier (`CHICKEN_NINE`, not
    /// this enum's Rust/serde spelling). Used by the replan operator, which
    /// receives launch deltas keyed by that external spelling and must
    /// silently ignore ships it doesn't recognize (spec §4.9).
    pub fn from_wire(s: &str) -> Option<ShipId> {
        use ShipId::*;
        Some(match s {
            "CHICKEN_ONE" => ChickenOne,
            "CHICKEN_NINE" => ChickenNine,
            "CHICKEN_HEAVY" => ChickenHeavy,
            "BCR" => Bcr,
            "MILLENIUM_CHICKEN" => MilleniumChicken,
            "CORELLIHEN_CORVETTE" => CorellihenCorvette,
            "GALEGGTICA" => Galeggtica,
            "CHICKFIANT" => Chickfiant,
            "VOYEGGER" => Voyegger,
            "HENERPRISE" => Henerprise,
            "ATREGGIES" => Atreggies,
            _ => return None,
        })
    }

    /// Inverse of [`ShipId::from_wire`]: the game's wire-format spelling for
    /// this ship. Used anywhere a message surfaces a ship identifier to a
    /// caller, e.g. prep-step reasons (spec §4.6/§8), so reported text uses
    /// the same spelling callers send us rather than this enum's `Display`
    /// (PascalCase, Rust/serde-only).
    pub fn to_wire(&self) -> &'static str {
        use ShipId::*;
        match self {
            ChickenOne => "CHICKEN_ONE",
            ChickenNine => "CHICKEN_NINE",
            ChickenHeavy => "CHICKEN_HEAVY",
            Bcr => "BCR",
            MilleniumChicken => "MILLENIUM_CHICKEN",
            CorellihenCorvette => "CORELLIHEN_CORVETTE",
            Galeggtica => "GALEGGTICA",
            Chickfiant => "CHICKFIANT",
            Voyegger => "VOYEGGER",
            Henerprise => "HENERPRISE",
            Atreggies => "ATREGGIES",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum DurationType {
    Tutorial,
    Short,
    Long,
    Epic,
}

impl DurationType {
    /// Weight applied when accumulating `launchPoints` from launch counts.
    pub fn weight(&self) -> f64 {
        match self {
            DurationType::Tutorial => 1.0,
            DurationType::Short => 1.0,
            DurationType::Long => 1.4,
            DurationType::Epic => 1.8,
        }
    }

    /// Parses the game's wire-format duration-type spelling (`SHORT`, not
    /// this enum's Rust/serde spelling). See [`ShipId::from_wire`].
    pub fn from_wire(s: &str) -> Option<DurationType> {
        use DurationType::*;
        Some(match s {
            "TUTORIAL" => Tutorial,
            "SHORT" => Short,
            "LONG" => Long,
            "EPIC" => Epic,
            _ => return None,
        })
    }
}

/// Static per-(ship, duration-type) mission template: the `missionId` it
/// spawns along with the base duration/capacity numbers before FTL/Zero-G
/// research and ship level are applied.
#[derive(Debug, Clone)]
pub struct MissionBase {
    pub mission_id: &'static str,
    pub base_duration_seconds: f64,
    pub base_capacity: f64,
    pub level_bump: f64,
}

/// Ships from this index (inclusive) onward in [`ShipId::order_index`] have
/// their mission duration reduced by the FTL research level.
pub const FTL_SEGMENT_START_INDEX: usize = 5; // CorellihenCorvette onward

lazy_static! {
    pub static ref UNLOCK_THRESHOLDS: BTreeMap<ShipId, u32> = {
        use ShipId::*;
        BTreeMap::from([
            (ChickenNine, 10),
            (ChickenHeavy, 30),
            (Bcr, 60),
            (MilleniumChicken, 120),
            (CorellihenCorvette, 200),
            (Galeggtica, 300),
            (Chickfiant, 450),
            (Voyegger, 650),
            (Henerprise, 900),
            (Atreggies, 1200),
        ])
    };

    pub static ref MAX_LEVEL: BTreeMap<ShipId, u32> = {
        use ShipId::*;
        BTreeMap::from([
            (ChickenOne, 5),
            (ChickenNine, 5),
            (ChickenHeavy, 6),
            (Bcr, 6),
            (MilleniumChicken, 7),
            (CorellihenCorvette, 7),
            (Galeggtica, 8),
            (Chickfiant, 8),
            (Voyegger, 9),
            (Henerprise, 9),
            (Atreggies, 10),
        ])
    };

    /// Per-level launch-point requirement to reach level `k+1` from `k`,
    /// indexed `0..maxLevel-1`. `level = largest k such that launchPoints
    /// >= sum(requirements[0..k])`.
    pub static ref LEVEL_REQUIREMENTS: BTreeMap<ShipId, Vec<f64>> = {
        use ShipId::*;
        BTreeMap::from([
            (ChickenOne, vec![5.0, 15.0, 40.0, 90.0, 180.0]),
            (ChickenNine, vec![8.0, 24.0, 60.0, 130.0, 260.0]),
            (ChickenHeavy, vec![12.0, 36.0, 90.0, 190.0, 380.0, 720.0]),
            (Bcr, vec![18.0, 54.0, 130.0, 270.0, 520.0, 960.0]),
            (MilleniumChicken, vec![25.0, 75.0, 180.0, 360.0, 680.0, 1240.0, 2200.0]),
            (CorellihenCorvette, vec![35.0, 105.0, 250.0, 490.0, 900.0, 1600.0, 2800.0]),
            (Galeggtica, vec![48.0, 144.0, 340.0, 650.0, 1180.0, 2050.0, 3500.0, 5800.0]),
            (Chickfiant, vec![65.0, 195.0, 455.0, 860.0, 1540.0, 2650.0, 4450.0, 7300.0]),
            (Voyegger, vec![88.0, 264.0, 610.0, 1140.0, 2020.0, 3440.0, 5700.0, 9300.0, 15000.0]),
            (Henerprise, vec![118.0, 354.0, 810.0, 1500.0, 2630.0, 4450.0, 7300.0, 11800.0, 18900.0]),
            (Atreggies, vec![160.0, 480.0, 1090.0, 2000.0, 3480.0, 5850.0, 9500.0, 15200.0, 24000.0, 37500.0]),
        ])
    };

    pub static ref SHIP_MISSIONS: BTreeMap<(ShipId, DurationType), MissionBase> = {
        use DurationType::*;
        use ShipId::*;
        BTreeMap::from([
            ((ChickenOne, Tutorial), MissionBase { mission_id: "chicken_one_tutorial", base_duration_seconds: 60.0, base_capacity: 1.0, level_bump: 0.0 }),
            ((ChickenOne, Short), MissionBase { mission_id: "chicken_one_short", base_duration_seconds: 1200.0, base_capacity: 2.0, level_bump: 0.4 }),
            ((ChickenOne, Long), MissionBase { mission_id: "chicken_one_long", base_duration_seconds: 14400.0, base_capacity: 4.0, level_bump: 0.8 }),
            ((ChickenNine, Short), MissionBase { mission_id: "chicken_nine_short", base_duration_seconds: 3600.0, base_capacity: 3.0, level_bump: 0.5 }),
            ((ChickenNine, Long), MissionBase { mission_id: "chicken_nine_long", base_duration_seconds: 28800.0, base_capacity: 6.0, level_bump: 1.0 }),
            ((ChickenHeavy, Long), MissionBase { mission_id: "chicken_heavy_long", base_duration_seconds: 43200.0, base_capacity: 8.0, level_bump: 1.2 }),
            ((ChickenHeavy, Epic), MissionBase { mission_id: "chicken_heavy_epic", base_duration_seconds: 172800.0, base_capacity: 16.0, level_bump: 2.0 }),
            ((Bcr, Long), MissionBase { mission_id: "bcr_long", base_duration_seconds: 57600.0, base_capacity: 10.0, level_bump: 1.4 }),
            ((Bcr, Epic), MissionBase { mission_id: "bcr_epic", base_duration_seconds: 259200.0, base_capacity: 20.0, level_bump: 2.4 }),
            ((MilleniumChicken, Long), MissionBase { mission_id: "millenium_chicken_long", base_duration_seconds: 86400.0, base_capacity: 14.0, level_bump: 1.8 }),
            ((MilleniumChicken, Epic), MissionBase { mission_id: "millenium_chicken_epic", base_duration_seconds: 345600.0, base_capacity: 26.0, level_bump: 3.0 }),
            ((CorellihenCorvette, Long), MissionBase { mission_id: "corellihen_corvette_long", base_duration_seconds: 138240.0, base_capacity: 18.0, level_bump: 2.2 }),
            ((CorellihenCorvette, Epic), MissionBase { mission_id: "corellihen_corvette_epic", base_duration_seconds: 432000.0, base_capacity: 32.0, level_bump: 3.6 }),
            ((Galeggtica, Epic), MissionBase { mission_id: "galeggtica_epic", base_duration_seconds: 518400.0, base_capacity: 40.0, level_bump: 4.2 }),
            ((Chickfiant, Epic), MissionBase { mission_id: "chickfiant_epic", base_duration_seconds: 604800.0, base_capacity: 48.0, level_bump: 4.8 }),
            ((Voyegger, Epic), MissionBase { mission_id: "voyegger_epic", base_duration_seconds: 691200.0, base_capacity: 56.0, level_bump: 5.4 }),
            ((Henerprise, Epic), MissionBase { mission_id: "henerprise_epic", base_duration_seconds: 777600.0, base_capacity: 64.0, level_bump: 6.0 }),
            ((Atreggies, Epic), MissionBase { mission_id: "atreggies_epic", base_duration_seconds: 864000.0, base_capacity: 72.0, level_bump: 6.6 }),
        ])
    };
}

/// Per-ship snapshot derived from lifetime launch counts. See spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipLevelSnapshot {
    pub unlocked: bool,
    pub launches: u32,
    pub launch_points: f64,
    pub level: u32,
    pub max_level: u32,
    pub launches_by_duration: BTreeMap<DurationType, u32>,
}

impl ShipLevelSnapshot {
    pub fn total_launches(launches_by_duration: &BTreeMap<DurationType, u32>) -> u32 {
        launches_by_duration.values().sum()
    }

    pub fn launch_points(launches_by_duration: &BTreeMap<DurationType, u32>) -> f64 {
        launches_by_duration
            .iter()
            .map(|(d, n)| *n as f64 * d.weight())
            .sum()
    }

    pub fn level_for_points(ship: ShipId, launch_points: f64, unlocked: bool) -> u32 {
        if !unlocked {
            return 0;
        }
        let max_level = *MAX_LEVEL.get(&ship).unwrap_or(&0);
        let requirements = LEVEL_REQUIREMENTS.get(&ship).cloned().unwrap_or_default();
        let mut cumulative = 0.0;
        let mut level = 0u32;
        for (k, req) in requirements.iter().enumerate() {
            if (k as u32) >= max_level {
                break;
            }
            cumulative += req;
            if launch_points >= cumulative {
                level = k as u32 + 1;
            } else {
                break;
            }
        }
        level.min(max_level)
    }
}

/// Computes every ship's level snapshot from lifetime launch counts, in
/// progression order so that unlock status can cascade ship-to-ship.
pub fn compute_ship_levels(
    launch_counts: &BTreeMap<ShipId, BTreeMap<DurationType, u32>>,
) -> BTreeMap<ShipId, ShipLevelSnapshot> {
    let mut out = BTreeMap::new();
    let mut prev_total_launches: Option<u32> = None;
    for (idx, ship) in ShipId::iter().enumerate() {
        let launches_by_duration = launch_counts.get(&ship).cloned().unwrap_or_default();
        let launches = ShipLevelSnapshot::total_launches(&launches_by_duration);
        let unlocked = if idx == 0 {
            true
        } else {
            let threshold = *UNLOCK_THRESHOLDS.get(&ship).unwrap_or(&0);
            prev_total_launches.unwrap_or(0) >= threshold
        };
        let launch_points = ShipLevelSnapshot::launch_points(&launches_by_duration);
        let level = ShipLevelSnapshot::level_for_points(ship, launch_points, unlocked);
        let max_level = *MAX_LEVEL.get(&ship).unwrap_or(&0);
        out.insert(
            ship,
            ShipLevelSnapshot {
                unlocked,
                launches,
                launch_points,
                level,
                max_level,
                launches_by_duration,
            },
        );
        prev_total_launches = Some(launches);
    }
    out
}
