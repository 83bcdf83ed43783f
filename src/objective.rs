use crate::cost::batch_cost;
use crate::models::{ItemKey, MissionAction, RecipeTable};
use std::collections::{BTreeMap, BTreeSet};

/// The normalization reference values used to bring GE cost and slot-time
/// onto comparable dimensionless scales (spec §4.4).
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveRefs {
    pub ge_ref: f64,
    pub time_ref: f64,
}

/// `G_ref`: an upper bound on any rational plan's GE cost, obtained by
/// pricing every closure item's craft upper bound from its current craft
/// count. Floored at `max(1, base cost of target)`.
pub fn ge_reference(
    recipes: &RecipeTable,
    closure: &BTreeSet<ItemKey>,
    craft_upper_bounds: &BTreeMap<ItemKey, u32>,
    craft_counts: &BTreeMap<ItemKey, u32>,
    target: &ItemKey,
) -> f64 {
    let mut total = 0.0;
    for item in closure {
        let Some(recipe) = recipes.get(item) else {
            continue;
        };
        let bound = craft_upper_bounds.get(item).copied().unwrap_or(0);
        let start = craft_counts.get(item).copied().unwrap_or(0);
        total += batch_cost(recipe.cost, start, bound);
    }
    let target_base_cost = recipes.get(target).map(|r| r.cost).unwrap_or(0.0);
    total.max(1.0).max(target_base_cost)
}

/// `T_ref`: the single-item time lower bound scaled by quantity, or the
/// fastest available action's per-launch time if nothing yields the target
/// directly (spec §4.4).
pub fn time_reference(actions: &[MissionAction], target: &ItemKey, quantity: u32) -> f64 {
    let direct: Vec<f64> = actions
        .iter()
        .filter_map(|a| {
            let y = a.yield_of(target);
            if y > 0.0 {
                Some(a.duration_seconds / (3.0 * y))
            } else {
                None
            }
        })
        .collect();

    if let Some(min_per_unit) = direct.into_iter().reduce(f64::min) {
        return (min_per_unit * quantity as f64).max(1e-9);
    }

    actions
        .iter()
        .map(|a| a.duration_seconds / 3.0)
        .reduce(f64::min)
        .unwrap_or(1.0)
        .max(1e-9)
}

/// Combines a GE cost and slot-seconds figure into the normalized,
/// dimensionless bi-objective value used to compare candidates in the
/// horizon search (spec §4.4/§4.6). `w_t` here is the raw `priorityTime`
/// (no `MIN_TIME_WEIGHT` floor — that floor only applies inside the MILP
/// objective assembly).
pub fn normalized_score(
    ge_cost: f64,
    slot_seconds: f64,
    priority_time: f64,
    refs: ObjectiveRefs,
) -> f64 {
    let w_t = priority_time.clamp(0.0, 1.0);
    let w_ge = 1.0 - w_t;
    w_ge * (ge_cost / refs.ge_ref) + w_t * (slot_seconds / refs.time_ref)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::{DurationType, Recipe, ShipId};

    #[test]
    fn test_ge_reference_floors_at_one() {
        let recipes = RecipeTable::new(BTreeMap::new());
        let closure = BTreeSet::new();
        let refs = ge_reference(
            &recipes,
            &closure,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &ItemKey::new("x"),
        );
        assert_eq!(refs, 1.0);
    }

    #[test]
    fn test_time_reference_uses_direct_yield() {
        let action = MissionAction {
            key: "m|t".into(),
            mission_id: "m".into(),
            ship: ShipId::ChickenOne,
            duration_type: DurationType::Short,
            duration_seconds: 1200.0,
            target_afx_id: "t".into(),
            yields: BTreeMap::from([(ItemKey::new("puzzle_cube_1"), 1.0)]),
        };
        let t_ref = time_reference(&[action], &ItemKey::new("puzzle_cube_1"), 2);
        // duration/(3*yield) * qty = 1200/3 * 2 = 800
        assert!((t_ref - 800.0).abs() < 1e-6);
    }

    #[test]
    fn test_time_reference_falls_back_to_fastest_action() {
        let action = MissionAction {
            key: "m|t".into(),
            mission_id: "m".into(),
            ship: ShipId::ChickenOne,
            duration_type: DurationType::Short,
            duration_seconds: 900.0,
            target_afx_id: "t".into(),
            yields: BTreeMap::from([(ItemKey::new("other"), 1.0)]),
        };
        let t_ref = time_reference(&[action], &ItemKey::new("puzzle_cube_1"), 5);
        assert!((t_ref - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_score_weights_by_priority_time() {
        let refs = ObjectiveRefs { ge_ref: 100.0, time_ref: 100.0 };
        let ge_only = normalized_score(50.0, 50.0, 0.0, refs);
        let time_only = normalized_score(50.0, 50.0, 1.0, refs);
        assert!((ge_only - 0.5).abs() < 1e-9);
        assert!((time_only - 0.5).abs() < 1e-9);
        let recipe = Recipe {
            ingredients: BTreeMap::new(),
            xp: 0.0,
            cost: 10.0,
        };
        assert_eq!(recipe.cost, 10.0);
    }
}
