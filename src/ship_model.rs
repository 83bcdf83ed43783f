use crate::models::{
    compute_ship_levels, DurationType, MissionOption, ShipId, ShipLevelSnapshot, FTL_SEGMENT_START_INDEX,
    SHIP_MISSIONS,
};
use std::collections::BTreeMap;

/// Derives the current mission-option set from ship levels and research
/// levels (spec §3/§4.2). Ships that are not unlocked contribute no options.
///
/// `TUTORIAL` is excluded: spec §3 restricts mission-option `durationType`
/// to `{SHORT, LONG, EPIC}` -- tutorial launches only feed
/// `launchesByDuration`/level-up accounting (see `horizon::duration_types_for`,
/// which still reads `SHIP_MISSIONS` directly and so retains it there).
pub fn mission_options_from_levels(
    ship_levels: &BTreeMap<ShipId, ShipLevelSnapshot>,
    ftl_level: u32,
    zerog_level: u32,
) -> Vec<MissionOption> {
    let mut options = Vec::new();
    for (ship, snapshot) in ship_levels {
        if !snapshot.unlocked {
            continue;
        }
        for ((s, duration_type), base) in SHIP_MISSIONS.iter() {
            if s != ship || *duration_type == DurationType::Tutorial {
                continue;
            }
            options.push(build_mission_option(
                *ship,
                *duration_type,
                snapshot.level,
                base,
                ftl_level,
                zerog_level,
            ));
        }
    }
    options.sort_by(|a, b| {
        a.ship
            .cmp(&b.ship)
            .then(a.duration_type.cmp(&b.duration_type))
    });
    options
}

fn build_mission_option(
    ship: ShipId,
    duration_type: DurationType,
    level: u32,
    base: &crate::models::MissionBase,
    ftl_level: u32,
    zerog_level: u32,
) -> MissionOption {
    let duration_seconds = if ship.order_index() >= FTL_SEGMENT_START_INDEX {
        (base.base_duration_seconds * (1.0 - 0.01 * ftl_level as f64))
            .round()
            .max(1.0)
    } else {
        base.base_duration_seconds
    };
    let capacity = (base.base_capacity + base.level_bump * level as f64) * (1.0 + 0.05 * zerog_level as f64);
    MissionOption {
        ship,
        mission_id: base.mission_id.to_string(),
        duration_type,
        level,
        duration_seconds,
        capacity: capacity.floor(),
    }
}

/// Computes the ship levels and derived mission options in one step, the
/// pairing the horizon search re-derives for every candidate state.
pub fn derive_mission_options(
    launch_counts: &BTreeMap<ShipId, BTreeMap<DurationType, u32>>,
    ftl_level: u32,
    zerog_level: u32,
) -> (BTreeMap<ShipId, ShipLevelSnapshot>, Vec<MissionOption>) {
    let ship_levels = compute_ship_levels(launch_counts);
    let options = mission_options_from_levels(&ship_levels, ftl_level, zerog_level);
    (ship_levels, options)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ftl_reduces_duration_for_segment_ships() {
        let mut launches = BTreeMap::new();
        // Bring ChickenOne up through the unlock chain so CorellihenCorvette unlocks.
        for ship in [
            ShipId::ChickenOne,
            ShipId::ChickenNine,
            ShipId::ChickenHeavy,
            ShipId::Bcr,
            ShipId::MilleniumChicken,
        ] {
            launches.insert(ship, BTreeMap::from([(DurationType::Short, 2000)]));
        }
        let (levels, options) = derive_mission_options(&launches, 0, 0);
        assert!(levels[&ShipId::CorellihenCorvette].unlocked);

        let (_, options_ftl) = derive_mission_options(&launches, 50, 0);
        let base_opt = options
            .iter()
            .find(|o| o.ship == ShipId::CorellihenCorvette && o.duration_type == DurationType::Long)
            .unwrap();
        let ftl_opt = options_ftl
            .iter()
            .find(|o| o.ship == ShipId::CorellihenCorvette && o.duration_type == DurationType::Long)
            .unwrap();
        assert!(ftl_opt.duration_seconds < base_opt.duration_seconds);
    }

    #[test]
    fn test_zerog_increases_capacity() {
        let launches = BTreeMap::new();
        let (_, options) = derive_mission_options(&launches, 0, 0);
        let (_, options_zerog) = derive_mission_options(&launches, 0, 40);
        let base_opt = options
            .iter()
            .find(|o| o.ship == ShipId::ChickenOne && o.duration_type == DurationType::Short)
            .unwrap();
        let zerog_opt = options_zerog
            .iter()
            .find(|o| o.ship == ShipId::ChickenOne && o.duration_type == DurationType::Short)
            .unwrap();
        assert!(zerog_opt.capacity > base_opt.capacity);
    }

    #[test]
    fn test_locked_ship_has_no_options() {
        let launches = BTreeMap::new();
        let (_, options) = derive_mission_options(&launches, 0, 0);
        assert!(!options.iter().any(|o| o.ship == ShipId::ChickenNine));
    }
}
