//! Greedy heuristic fallback (spec §4.8), triggered when the MILP pathway
//! fails for every horizon-search candidate. Never throws — worst case it
//! reports unmet demand and explains itself in `notes`, matching this
//! codebase's branch-and-fallback style for unreliable external decisions
//! (`agent_controller`'s ship-purchase flow: try the preferred path, fall
//! back to a simpler decision, always return *something*).

use crate::config::{CONFIG, EPSILON, TIME_MULT};
use crate::cost::{batch_cost, discount_step};
use crate::models::{ItemKey, MissionAction, RecipeTable};
use crate::objective::ObjectiveRefs;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

pub struct FallbackOutcome {
    pub craft_counts: BTreeMap<ItemKey, u32>,
    pub mission_launches: BTreeMap<String, u32>,
    pub unmet: BTreeMap<ItemKey, f64>,
    pub notes: Vec<String>,
}

/// The per-unit time cost of the fastest action yielding `item`, or
/// infinity if nothing does (forces the craft branch whenever craftable,
/// and otherwise leaves the demand permanently unmet).
fn best_time_per_unit(item: &ItemKey, actions: &[MissionAction]) -> f64 {
    actions
        .iter()
        .filter_map(|a| {
            let y = a.yield_of(item);
            if y > 0.0 {
                Some(a.duration_seconds / (3.0 * y))
            } else {
                None
            }
        })
        .reduce(f64::min)
        .unwrap_or(f64::INFINITY)
}

#[allow(clippy::too_many_arguments)]
fn fulfill(
    item: &ItemKey,
    qty: f64,
    recipes: &RecipeTable,
    inventory: &mut BTreeMap<ItemKey, f64>,
    craft_counts: &mut BTreeMap<ItemKey, u32>,
    craft_plan: &mut BTreeMap<ItemKey, u32>,
    mission_demand: &mut BTreeMap<ItemKey, f64>,
    actions: &[MissionAction],
    w_ge: f64,
    w_t: f64,
    refs: ObjectiveRefs,
    depth: usize,
) {
    if qty <= EPSILON {
        return;
    }
    if depth >= CONFIG.fulfill_depth_cap {
        warn!("fulfill() hit depth cap {} at item {item}, treating remainder as farm demand", CONFIG.fulfill_depth_cap);
        *mission_demand.entry(item.clone()).or_insert(0.0) += qty;
        return;
    }

    let avail = inventory.get(item).copied().unwrap_or(0.0);
    let from_inventory = avail.min(qty);
    *inventory.entry(item.clone()).or_insert(0.0) -= from_inventory;
    let remaining = qty - from_inventory;
    if remaining <= EPSILON {
        return;
    }

    if let Some(recipe) = recipes.get(item) {
        let start = craft_counts.get(item).copied().unwrap_or(0);
        let craft_score = w_ge * discount_step(recipe.cost, start) / refs.ge_ref;
        let farm_score = w_t * best_time_per_unit(item, actions) * TIME_MULT / refs.time_ref;
        if craft_score <= farm_score {
            let count = remaining.ceil() as u32;
            *craft_plan.entry(item.clone()).or_insert(0) += count;
            *craft_counts.entry(item.clone()).or_insert(0) += count;
            for (ingredient, mult) in &recipe.ingredients {
                fulfill(
                    ingredient,
                    count as f64 * *mult as f64,
                    recipes,
                    inventory,
                    craft_counts,
                    craft_plan,
                    mission_demand,
                    actions,
                    w_ge,
                    w_t,
                    refs,
                    depth + 1,
                );
            }
            return;
        }
    }

    *mission_demand.entry(item.clone()).or_insert(0.0) += remaining;
}

fn greedy_pack(
    actions: &[MissionAction],
    mission_demand: &BTreeMap<ItemKey, f64>,
) -> (BTreeMap<String, u32>, BTreeMap<ItemKey, f64>, u32) {
    let mut residual = mission_demand.clone();
    let mut launches: BTreeMap<String, u32> = BTreeMap::new();
    let mut iterations = 0u32;

    while residual.values().any(|v| *v > EPSILON) && iterations < CONFIG.max_greedy_iterations as u32 {
        iterations += 1;
        let mut best: Option<(&MissionAction, f64)> = None;
        for action in actions {
            let coverage: f64 = action
                .yields
                .iter()
                .map(|(item, y)| y.min(residual.get(item).copied().unwrap_or(0.0)))
                .sum();
            if coverage <= EPSILON || action.duration_seconds <= 0.0 {
                continue;
            }
            let score = coverage / action.duration_seconds;
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((action, score));
            }
        }
        let Some((action, _)) = best else {
            break;
        };
        *launches.entry(action.key.clone()).or_insert(0) += 1;
        for (item, y) in &action.yields {
            if let Some(r) = residual.get_mut(item) {
                *r = (*r - y).max(0.0);
            }
        }
    }

    (launches, residual, iterations)
}

/// Runs the full fallback pathway (spec §4.8): recursive craft-vs-farm
/// decomposition of the target, then greedy mission packing over whatever
/// demand the decomposition left farm-side.
#[allow(clippy::too_many_arguments)]
pub fn run_fallback(
    recipes: &RecipeTable,
    closure: &BTreeSet<ItemKey>,
    inventory: &BTreeMap<ItemKey, u32>,
    craft_counts: &BTreeMap<ItemKey, u32>,
    actions: &[MissionAction],
    target: &ItemKey,
    quantity: u32,
    priority_time: f64,
    refs: ObjectiveRefs,
    solver_errors: &[String],
) -> FallbackOutcome {
    let w_t = priority_time.clamp(0.0, 1.0);
    let w_ge = 1.0 - w_t;

    let mut inventory_f: BTreeMap<ItemKey, f64> = closure
        .iter()
        .map(|i| (i.clone(), inventory.get(i).copied().unwrap_or(0) as f64))
        .collect();
    let mut running_craft_counts = craft_counts.clone();
    let mut craft_plan: BTreeMap<ItemKey, u32> = BTreeMap::new();
    let mut mission_demand: BTreeMap<ItemKey, f64> = BTreeMap::new();

    fulfill(
        target,
        quantity as f64,
        recipes,
        &mut inventory_f,
        &mut running_craft_counts,
        &mut craft_plan,
        &mut mission_demand,
        actions,
        w_ge,
        w_t,
        refs,
        0,
    );

    let (mission_launches, unmet, iterations) = greedy_pack(actions, &mission_demand);

    let mut notes = vec![format!(
        "heuristic fallback triggered: MILP pathway failed for every horizon-search candidate ({} error(s))",
        solver_errors.len()
    )];
    for e in solver_errors {
        notes.push(format!("candidate solver error: {e}"));
    }
    notes.push(format!(
        "recursive craft/farm decomposition planned {} distinct craftable item(s)",
        craft_plan.len()
    ));
    notes.push(format!(
        "greedy mission packing ran {iterations} iteration(s) over {} distinct action(s)",
        mission_launches.len()
    ));
    if !unmet.is_empty() {
        let unmet_names: Vec<String> = unmet.keys().map(|k| k.to_id().0).collect();
        notes.push(format!("residual unmet demand after fallback: {}", unmet_names.join(", ")));
    }
    debug!(
        "fallback: {} crafts, {} mission launches, {} unmet items",
        craft_plan.values().sum::<u32>(),
        mission_launches.values().sum::<u32>(),
        unmet.len()
    );

    FallbackOutcome {
        craft_counts: craft_plan,
        mission_launches,
        unmet,
        notes,
    }
}

/// GE cost of a fallback craft plan, for reuse by both the fallback path
/// and the final plan-result assembly (spec testable property: `geCost =
/// Σ batchCost(base_i, startCraft_i, crafts_i.count)` exactly).
pub fn fallback_ge_cost(recipes: &RecipeTable, start_craft_counts: &BTreeMap<ItemKey, u32>, craft_plan: &BTreeMap<ItemKey, u32>) -> f64 {
    craft_plan
        .iter()
        .map(|(item, count)| {
            let base = recipes.get(item).map(|r| r.cost).unwrap_or(0.0);
            let start = start_craft_counts.get(item).copied().unwrap_or(0);
            batch_cost(base, start, *count)
        })
        .sum()
}
