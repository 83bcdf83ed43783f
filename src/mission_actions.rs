use crate::models::{ItemKey, LootData, MissionAction, MissionOption};
use std::collections::{BTreeMap, BTreeSet};

/// Joins the current mission-option set with loot data to produce
/// mission actions restricted to the planning closure (spec §4.2).
///
/// Actions that would yield nothing in-closure are dropped.
pub fn build_mission_actions(
    options: &[MissionOption],
    loot: &LootData,
    closure: &BTreeSet<ItemKey>,
) -> Vec<MissionAction> {
    let loot_by_mission: BTreeMap<&str, &crate::models::LootMission> = loot
        .missions
        .iter()
        .map(|m| (m.mission_id.as_str(), m))
        .collect();

    let mut actions = Vec::new();
    for option in options {
        let Some(loot_mission) = loot_by_mission.get(option.mission_id.as_str()) else {
            continue;
        };
        let Some(level) = loot_mission.level_for(option.level) else {
            continue;
        };
        for target in &level.targets {
            if target.total_drops <= 0.0 {
                continue;
            }
            let mut yields = BTreeMap::new();
            for item in &target.items {
                let key = crate::models::ItemId::new(item.item_id.clone()).to_key();
                if !closure.contains(&key) {
                    continue;
                }
                let expected_count = item.total_count() / target.total_drops;
                let per_launch = expected_count * option.capacity;
                if per_launch > 0.0 {
                    yields.insert(key, per_launch);
                }
            }
            if yields.is_empty() {
                continue;
            }
            actions.push(MissionAction {
                key: MissionAction::make_key(&option.mission_id, &target.target_afx_id),
                mission_id: option.mission_id.clone(),
                ship: option.ship,
                duration_type: option.duration_type,
                duration_seconds: option.duration_seconds,
                target_afx_id: target.target_afx_id.clone(),
                yields,
            });
        }
    }
    actions
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::{DurationType, LootItem, LootLevel, LootMission, LootTarget, ShipId};

    fn option() -> MissionOption {
        MissionOption {
            ship: ShipId::ChickenOne,
            mission_id: "chicken_one_short".into(),
            duration_type: DurationType::Short,
            level: 0,
            duration_seconds: 1200.0,
            capacity: 1.0,
        }
    }

    fn loot() -> LootData {
        LootData {
            missions: vec![LootMission {
                mission_id: "chicken_one_short".into(),
                levels: vec![LootLevel {
                    level: 0,
                    targets: vec![LootTarget {
                        total_drops: 10.0,
                        target_afx_id: "rock_family".into(),
                        items: vec![LootItem {
                            item_id: "puzzle-cube-1".into(),
                            counts: [10.0, 0.0, 0.0, 0.0],
                        }],
                    }],
                }],
            }],
        }
    }

    #[test]
    fn test_yield_restricted_to_closure() {
        let closure: BTreeSet<ItemKey> = BTreeSet::from([ItemKey::new("puzzle_cube_1")]);
        let actions = build_mission_actions(&[option()], &loot(), &closure);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].yield_of(&ItemKey::new("puzzle_cube_1")), 1.0);
    }

    #[test]
    fn test_out_of_closure_item_is_dropped() {
        let closure: BTreeSet<ItemKey> = BTreeSet::from([ItemKey::new("other_item")]);
        let actions = build_mission_actions(&[option()], &loot(), &closure);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_zero_total_drops_is_skipped() {
        let mut l = loot();
        l.missions[0].levels[0].targets[0].total_drops = 0.0;
        let closure: BTreeSet<ItemKey> = BTreeSet::from([ItemKey::new("puzzle_cube_1")]);
        let actions = build_mission_actions(&[option()], &l, &closure);
        assert!(actions.is_empty());
    }
}
