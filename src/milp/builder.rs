use super::solver::MilpProblem;
use crate::config::MIN_TIME_WEIGHT;
use crate::cost::discount_step;
use crate::models::{ItemKey, MissionAction, RecipeTable};
use crate::objective::ObjectiveRefs;
use good_lp::{constraint, variable, Expression, ProblemVariables};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Variable-name bookkeeping needed to decode a solved [`MilpProblem`] back
/// into a plan, plus the per-item discount-slot layout the objective was
/// built from (spec §4.5/§9: "binary-indicator discount variables").
pub struct BuiltProblem {
    pub problem: MilpProblem,
    pub craft_var_names: BTreeMap<ItemKey, String>,
    pub mission_var_names: BTreeMap<String, String>,
    pub unmet_var_names: BTreeMap<ItemKey, String>,
    pub pre_slots: BTreeMap<ItemKey, u32>,
}

pub struct DecodedSolution {
    pub craft_counts: BTreeMap<ItemKey, u32>,
    pub mission_launches: BTreeMap<String, u32>,
    pub unmet: BTreeMap<ItemKey, f64>,
}

fn clamp_round(v: f64) -> u32 {
    v.max(0.0).round() as u32
}

pub fn decode_solution(
    craft_var_names: &BTreeMap<ItemKey, String>,
    mission_var_names: &BTreeMap<String, String>,
    unmet_var_names: &BTreeMap<ItemKey, String>,
    outcome: &super::solver::SolverOutcome,
) -> DecodedSolution {
    let craft_counts = craft_var_names
        .iter()
        .map(|(item, name)| (item.clone(), clamp_round(outcome.values.get(name).copied().unwrap_or(0.0))))
        .collect();
    let mission_launches = mission_var_names
        .iter()
        .map(|(key, name)| (key.clone(), clamp_round(outcome.values.get(name).copied().unwrap_or(0.0))))
        .collect();
    let unmet = unmet_var_names
        .iter()
        .filter_map(|(item, name)| {
            let v = outcome.values.get(name).copied().unwrap_or(0.0);
            if v > 1e-6 {
                Some((item.clone(), v))
            } else {
                None
            }
        })
        .collect();
    DecodedSolution {
        craft_counts,
        mission_launches,
        unmet,
    }
}

/// Builds the unified MILP for one candidate's mission-option set (spec §4.5).
///
/// `craft_upper_bounds`/`craft_counts`/`inventory` are all keyed by the
/// closure's item keys; items absent from `craft_upper_bounds` are treated
/// as farm-only (no craft variable is created for them).
#[allow(clippy::too_many_arguments)]
pub fn build_milp(
    recipes: &RecipeTable,
    closure: &BTreeSet<ItemKey>,
    craft_upper_bounds: &BTreeMap<ItemKey, u32>,
    craft_counts: &BTreeMap<ItemKey, u32>,
    inventory: &BTreeMap<ItemKey, u32>,
    actions: &[MissionAction],
    target: &ItemKey,
    quantity: u32,
    priority_time: f64,
    refs: ObjectiveRefs,
    time_limit_seconds: f64,
) -> BuiltProblem {
    let mut vars = ProblemVariables::new();

    // --- craft variables c[i], discount indicators y[i,k], tail t[i] ---
    let mut craft_var: HashMap<ItemKey, good_lp::Variable> = HashMap::new();
    let mut craft_var_names = BTreeMap::new();
    let mut discount_vars: HashMap<ItemKey, Vec<good_lp::Variable>> = HashMap::new();
    let mut tail_var: HashMap<ItemKey, good_lp::Variable> = HashMap::new();
    let mut pre_slots: BTreeMap<ItemKey, u32> = BTreeMap::new();
    let mut named: HashMap<String, good_lp::Variable> = HashMap::new();

    for item in closure {
        if !recipes.is_craftable(item) {
            continue;
        }
        let bound = craft_upper_bounds.get(item).copied().unwrap_or(0);
        let start = craft_counts.get(item).copied().unwrap_or(0);

        let name = format!("c_{}", item.0);
        let c = vars.add(variable().integer().min(0).max(bound as f64).name(&name));
        craft_var.insert(item.clone(), c);
        craft_var_names.insert(item.clone(), name.clone());
        named.insert(name, c);

        let slots = bound.min(300u32.saturating_sub(start));
        pre_slots.insert(item.clone(), slots);

        let mut ys = Vec::with_capacity(slots as usize);
        for k in 0..slots {
            let yname = format!("y_{}_{}", item.0, k);
            let y = vars.add(variable().binary().name(&yname));
            named.insert(yname, y);
            ys.push(y);
        }
        discount_vars.insert(item.clone(), ys);

        let tail_cap = bound.saturating_sub(slots);
        let tname = format!("t_{}", item.0);
        let t = vars.add(variable().integer().min(0).max(tail_cap as f64).name(&tname));
        tail_var.insert(item.clone(), t);
        named.insert(tname, t);
    }

    // --- mission launch variables m[a] ---
    let mut mission_var: HashMap<String, good_lp::Variable> = HashMap::new();
    let mut mission_var_names = BTreeMap::new();
    for action in actions {
        let name = format!("m_{}", sanitize(&action.key));
        let m = vars.add(variable().integer().min(0).name(&name));
        mission_var.insert(action.key.clone(), m);
        mission_var_names.insert(action.key.clone(), name.clone());
        named.insert(name, m);
    }

    // --- unmet-demand slack u[i] ---
    let mut unmet_var: HashMap<ItemKey, good_lp::Variable> = HashMap::new();
    let mut unmet_var_names = BTreeMap::new();
    for item in closure {
        let name = format!("u_{}", item.0);
        let u = vars.add(variable().min(0.0).name(&name));
        unmet_var.insert(item.clone(), u);
        unmet_var_names.insert(item.clone(), name.clone());
        named.insert(name, u);
    }

    // --- consumption table: for each ingredient, which craftable items consume it and at what rate ---
    let mut consumers: HashMap<ItemKey, Vec<(ItemKey, f64)>> = HashMap::new();
    for item in closure {
        if let Some(recipe) = recipes.get(item) {
            for (ingredient, mult) in &recipe.ingredients {
                consumers
                    .entry(ingredient.clone())
                    .or_default()
                    .push((item.clone(), *mult as f64));
            }
        }
    }

    // --- flow conservation constraints ---
    let mut constraints = Vec::new();
    for item in closure {
        let mut supply: Expression = 0.into();
        if let Some(&c) = craft_var.get(item) {
            supply += c;
        }
        for action in actions {
            let y = action.yield_of(item);
            if y > 0.0 {
                if let Some(&m) = mission_var.get(&action.key) {
                    supply += m * y;
                }
            }
        }
        supply += unmet_var[item];

        if let Some(consuming) = consumers.get(item) {
            for (consumer, mult) in consuming {
                if let Some(&c) = craft_var.get(consumer) {
                    supply -= c * *mult;
                }
            }
        }

        // The target's requested quantity is additional to whatever is
        // already in inventory (spec §8 Scenario 2: "quantity is additional
        // beyond current inventory"), so the target's own stock must not
        // offset its own demand. Non-target items still net against
        // inventory, since that inventory can supply ingredient consumption.
        let demand = if item == target { quantity as f64 } else { 0.0 };
        let inv = if item == target {
            0.0
        } else {
            inventory.get(item).copied().unwrap_or(0) as f64
        };
        constraints.push(constraint!(supply >= demand - inv));
    }

    // --- discount-slot linking constraints ---
    for item in closure {
        let Some(&c) = craft_var.get(item) else {
            continue;
        };
        let ys = &discount_vars[item];
        let t = tail_var[item];

        let sum_y: Expression = ys.iter().copied().sum();
        constraints.push(constraint!(c == sum_y + t));

        for w in ys.windows(2) {
            constraints.push(constraint!(w[0] >= w[1]));
        }

        if let Some(&last) = ys.last() {
            let tail_cap = (craft_upper_bounds.get(item).copied().unwrap_or(0)
                - pre_slots.get(item).copied().unwrap_or(0)) as f64;
            constraints.push(constraint!(t <= last * tail_cap));
        }
    }

    // --- objective ---
    let w_t = priority_time.clamp(0.0, 1.0).max(MIN_TIME_WEIGHT);
    let w_ge = (1.0 - priority_time.clamp(0.0, 1.0)).max(0.0);

    let mut max_coeff: f64 = 0.0;
    let mut craft_term: Expression = 0.into();
    for item in closure {
        let Some(recipe) = recipes.get(item) else {
            continue;
        };
        let start = craft_counts.get(item).copied().unwrap_or(0);
        let ys = &discount_vars[item];
        for (k, &y) in ys.iter().enumerate() {
            let unit_cost = discount_step(recipe.cost, start + k as u32);
            let coeff = w_ge / refs.ge_ref * unit_cost;
            max_coeff = max_coeff.max(coeff.abs());
            craft_term += y * coeff;
        }
        let slots = pre_slots.get(item).copied().unwrap_or(0);
        let tail_unit_cost = discount_step(recipe.cost, start + slots);
        let t = tail_var[item];
        let coeff = w_ge / refs.ge_ref * tail_unit_cost;
        max_coeff = max_coeff.max(coeff.abs());
        craft_term += t * coeff;
    }

    let mut time_term: Expression = 0.into();
    for action in actions {
        let Some(&m) = mission_var.get(&action.key) else {
            continue;
        };
        let coeff = w_t / refs.time_ref * (action.duration_seconds / 3.0);
        max_coeff = max_coeff.max(coeff.abs());
        time_term += m * coeff;
    }

    let big = (1e6 * max_coeff).max(1e6);
    let mut penalty_term: Expression = 0.into();
    for item in closure {
        penalty_term += unmet_var[item] * big;
    }

    let objective = craft_term + time_term + penalty_term;

    BuiltProblem {
        problem: MilpProblem {
            vars,
            objective,
            constraints,
            named,
            time_limit_seconds,
        },
        craft_var_names,
        mission_var_names,
        unmet_var_names,
        pre_slots,
    }
}

/// good_lp variable names must be valid identifiers in some backends; mission
/// action keys contain `|`, so sanitize before using them in a name.
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::milp::solver::{MilpSolver, ScriptedSolver, SolveStatus};
    use crate::models::{DurationType, Recipe, ShipId};
    use std::collections::HashMap as StdHashMap;

    fn closure_with_target() -> (RecipeTable, BTreeSet<ItemKey>, ItemKey) {
        let target = ItemKey::new("puzzle_cube_1");
        let recipes = RecipeTable::new(BTreeMap::new());
        let closure = BTreeSet::from([target.clone()]);
        (recipes, closure, target)
    }

    #[test]
    fn test_single_mission_covers_target_scenario() {
        let (recipes, closure, target) = closure_with_target();
        let action = MissionAction {
            key: "m|t".into(),
            mission_id: "m".into(),
            ship: ShipId::ChickenOne,
            duration_type: DurationType::Short,
            duration_seconds: 1200.0,
            target_afx_id: "t".into(),
            yields: BTreeMap::from([(target.clone(), 1.0)]),
        };
        let refs = ObjectiveRefs { ge_ref: 1.0, time_ref: 800.0 };
        let built = build_milp(
            &recipes,
            &closure,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            &[action.clone()],
            &target,
            2,
            0.5,
            refs,
            5.0,
        );

        let mission_var_name = built.mission_var_names[&action.key].clone();
        let values = StdHashMap::from([(mission_var_name, 2.0)]);
        let solver = ScriptedSolver { values, status: SolveStatus::Optimal };
        let BuiltProblem { problem, craft_var_names, mission_var_names, unmet_var_names, .. } = built;
        let outcome = solver.solve(problem).unwrap();
        let decoded = decode_solution(&craft_var_names, &mission_var_names, &unmet_var_names, &outcome);
        assert_eq!(decoded.mission_launches[&action.key], 2);
        assert!(decoded.unmet.is_empty());
    }

    #[test]
    fn test_craftable_item_gets_discount_slots() {
        let target = ItemKey::new("gear_1");
        let mut recipes_map = BTreeMap::new();
        recipes_map.insert(
            target.clone(),
            Recipe { ingredients: BTreeMap::new(), xp: 0.0, cost: 1000.0 },
        );
        let recipes = RecipeTable::new(recipes_map);
        let closure = BTreeSet::from([target.clone()]);
        let mut upper_bounds = BTreeMap::new();
        upper_bounds.insert(target.clone(), 5);

        let refs = ObjectiveRefs { ge_ref: 1000.0, time_ref: 1.0 };
        let built = build_milp(
            &recipes,
            &closure,
            &upper_bounds,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &[],
            &target,
            3,
            0.0,
            refs,
            5.0,
        );
        assert_eq!(built.pre_slots[&target], 5);
        assert_eq!(built.craft_var_names.len(), 1);
    }
}
