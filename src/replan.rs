//! Incremental profile update from observed returns and mission-launch
//! deltas (spec §4.9), then re-derivation of the ship/mission fields that
//! depend on launch counts. Pure data transformation in the style of this
//! codebase's in-memory state-mutation helpers (`agent_controller`'s
//! ship/cargo update paths) — no I/O, no solver involvement.

use crate::models::{DurationType, ItemId, PlayerProfile, ShipId};
use crate::ship_model::derive_mission_options;
use log::info;

/// A single observed mission return: `quantity` of `item_id` added to
/// inventory. Nonneg, rounded to the nearest integer (spec §4.9).
pub struct ObservedReturn {
    pub item_id: ItemId,
    pub quantity: f64,
}

/// A launch-count delta for one (ship, duration type) pair, keyed by the
/// game's wire-format spellings — unknown ships/duration types are ignored
/// per spec, not rejected.
pub struct MissionLaunchDelta {
    pub ship: String,
    pub duration_type: String,
    pub launches: f64,
}

/// Applies `observed_returns` and `mission_launches` to a copy of
/// `profile`, then recomputes `shipLevels`/`missionOptions` from the
/// updated launch counts. Never mutates `profile` itself — the planner
/// only ever holds request-scoped, immutable-once-built data (spec §3).
pub fn apply_replan(
    profile: &PlayerProfile,
    observed_returns: &[ObservedReturn],
    mission_launches: &[MissionLaunchDelta],
) -> PlayerProfile {
    let mut next = profile.clone();

    for r in observed_returns {
        let qty = r.quantity.max(0.0).round() as u32;
        if qty == 0 {
            continue;
        }
        *next.inventory.entry(r.item_id.to_key()).or_insert(0) += qty;
    }

    let mut launch_counts = next.launch_counts();
    let mut ignored = 0usize;
    for d in mission_launches {
        let (Some(ship), Some(duration_type)) = (ShipId::from_wire(&d.ship), DurationType::from_wire(&d.duration_type)) else {
            ignored += 1;
            continue;
        };
        let launches = d.launches.max(0.0).round() as u32;
        if launches == 0 {
            continue;
        }
        *launch_counts.entry(ship).or_default().entry(duration_type).or_insert(0) += launches;
    }
    if ignored > 0 {
        info!("replan: ignored {ignored} mission-launch delta(s) with unrecognized ship/duration identifiers");
    }

    let (ship_levels, mission_options) = derive_mission_options(
        &launch_counts,
        next.epic_research_ftl_level,
        next.epic_research_zerog_level,
    );
    next.ship_levels = ship_levels;
    next.mission_options = mission_options;
    next
}
