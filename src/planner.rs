//! Public entrypoints (spec §6.1/§6.2): resolve inputs, run the
//! horizon/MILP pathway with a heuristic fallback, assemble the reported
//! `PlannerResult`, and optionally stream progress over a channel. Mirrors
//! this codebase's top-level `run` functions that wire a bunch of
//! collaborator modules together behind one or two public calls.

use crate::closure::{compute_closure, craft_upper_bounds};
use crate::config::{CONFIG, TIME_MULT};
use crate::error::{PlannerError, PlannerResult};
use crate::fallback::{fallback_ge_cost, run_fallback};
use crate::horizon::run_horizon_search;
use crate::loot_cache::LOOT_CACHE;
use crate::milp::{HighsSolver, MilpSolver};
use crate::mission_actions::build_mission_actions;
use crate::models::{
    CraftLine, ExpectedYield, ItemId, LootData, MissionRow, PlannerResult as PlanResult,
    PlayerProfile, Progression, ProjectedShipLevel, RecipeTable, TargetBreakdown, DEFAULT_RECIPE_TABLE,
};
use crate::objective::{self, ObjectiveRefs};
use crate::progress::{Phase, PlanMessage, ProgressReporter};
use tokio::sync::mpsc;

/// Per-request overrides for the resources the planner would otherwise
/// fetch/construct on its own (spec §6.3: "callers may supply their own
/// loot data or recipe table").
pub struct PlanOptions<'a> {
    pub fast_mode: bool,
    pub loot_data: Option<&'a LootData>,
    pub solver: Option<&'a dyn MilpSolver>,
    pub recipes: Option<&'a RecipeTable>,
}

impl Default for PlanOptions<'_> {
    fn default() -> Self {
        PlanOptions {
            fast_mode: false,
            loot_data: None,
            solver: None,
            recipes: None,
        }
    }
}

/// Splits a target's fulfilled `quantity` across craft/mission/inventory in
/// the fixed reporting priority craft -> missions -> inventory (spec §9 open
/// question, DESIGN.md "targetBreakdown priority order"). Each component is
/// capped by the remainder left after the components ahead of it in the
/// priority order, so the four returned numbers always sum to `quantity`
/// exactly (spec §8: `Q = fromInventory + fromCraft + fromMissionsExpected +
/// shortfall`). This is pure reporting math over the already-solved plan; it
/// never feeds back into the MILP or fallback objective.
fn allocate_target_breakdown(
    quantity: u32,
    craft_count: u32,
    mission_yield: f64,
    inventory_count: u32,
) -> (u32, f64, u32, f64) {
    let mut remaining = quantity as f64;

    let from_craft = craft_count.min(quantity);
    remaining -= from_craft as f64;

    let from_missions_expected = mission_yield.max(0.0).min(remaining.max(0.0));
    remaining -= from_missions_expected;

    let from_inventory = inventory_count.min(remaining.max(0.0).floor() as u32);
    remaining -= from_inventory as f64;

    let shortfall = remaining.max(0.0);
    (from_craft, from_missions_expected, from_inventory, shortfall)
}

/// Builds the final report from a winning horizon-search candidate.
#[allow(clippy::too_many_arguments)]
fn build_result_from_horizon(
    profile: &PlayerProfile,
    target: &ItemId,
    quantity: u32,
    priority_time: f64,
    candidate: crate::horizon::SolvedCandidate,
) -> PlanResult {
    let crafts: Vec<CraftLine> = candidate
        .decoded
        .craft_counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(item, count)| CraftLine { item_id: item.to_id(), count: *count })
        .collect();

    let missions: Vec<MissionRow> = candidate
        .actions
        .iter()
        .filter_map(|action| {
            let launches = candidate.decoded.mission_launches.get(&action.key).copied().unwrap_or(0);
            if launches == 0 {
                return None;
            }
            let mut top_expected_yields: Vec<ExpectedYield> = action
                .yields
                .iter()
                .map(|(item, per_launch)| ExpectedYield {
                    item_id: item.to_id(),
                    expected_per_launch: *per_launch,
                    expected_total: *per_launch * launches as f64,
                })
                .collect();
            top_expected_yields.sort_by(|a, b| b.expected_total.partial_cmp(&a.expected_total).unwrap());
            top_expected_yields.truncate(5);
            Some(MissionRow {
                mission_id: action.mission_id.clone(),
                ship: action.ship.to_wire().to_string(),
                duration_type: action.duration_type.to_string(),
                duration_seconds: action.duration_seconds,
                launches,
                target_afx_id: action.target_afx_id.clone(),
                top_expected_yields,
            })
        })
        .collect();

    let unmet_items: Vec<ItemId> = candidate.decoded.unmet.keys().map(|k| k.to_id()).collect();

    let target_key = target.to_key();
    let craft_count = candidate
        .decoded
        .craft_counts
        .get(&target_key)
        .copied()
        .unwrap_or(0);
    let mission_yield: f64 = candidate
        .actions
        .iter()
        .map(|a| {
            let launches = candidate.decoded.mission_launches.get(&a.key).copied().unwrap_or(0);
            a.yield_of(&target_key) * launches as f64
        })
        .sum();
    let inventory_count = profile.inventory_of(&target_key);
    let (from_craft, from_missions_expected, from_inventory, shortfall) =
        allocate_target_breakdown(quantity, craft_count, mission_yield, inventory_count);

    let total_slot_seconds = candidate.prep_slot_seconds + candidate.farm_slot_seconds;
    let expected_hours = total_slot_seconds / 3.0 / 3600.0;

    let prep_hours = candidate.prep_slot_seconds / 3600.0;
    let prep_launches = candidate.prep_steps.iter().map(|s| s.launches).sum();
    let projected_ship_levels = candidate
        .ship_levels
        .iter()
        .map(|(ship, snap)| ProjectedShipLevel { ship: ship.to_wire().to_string(), level: snap.level })
        .collect();

    let mut notes = vec![format!(
        "horizon search selected a candidate with {} prep launch(es) across {} step(s)",
        prep_launches,
        candidate.prep_steps.len()
    )];
    if !candidate.prep_steps.is_empty() {
        for step in &candidate.prep_steps {
            notes.push(format!(
                "{}: {} x{} ({})",
                step.reason,
                step.ship.to_wire(),
                step.launches,
                step.duration_type
            ));
        }
    }

    PlanResult {
        target_item_id: target.clone(),
        quantity,
        priority_time,
        ge_cost: candidate.ge_cost,
        total_slot_seconds,
        expected_hours,
        weighted_score: candidate.score,
        crafts,
        missions,
        unmet_items,
        target_breakdown: TargetBreakdown {
            requested: quantity,
            from_inventory,
            from_craft,
            from_missions_expected,
            shortfall,
        },
        progression: Progression {
            prep_hours,
            prep_launches,
            projected_ship_levels,
        },
        notes,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_result_from_fallback(
    profile: &PlayerProfile,
    target: &ItemId,
    quantity: u32,
    priority_time: f64,
    outcome: crate::fallback::FallbackOutcome,
    recipes: &RecipeTable,
    actions: &[crate::models::MissionAction],
    refs: ObjectiveRefs,
) -> PlanResult {
    let ge_cost = fallback_ge_cost(recipes, &profile.craft_counts, &outcome.craft_counts);
    let farm_slot_seconds: f64 = actions
        .iter()
        .map(|a| outcome.mission_launches.get(&a.key).copied().unwrap_or(0) as f64 * a.duration_seconds)
        .sum();
    let time_component = farm_slot_seconds / 3.0 * TIME_MULT;
    let score = objective::normalized_score(ge_cost, time_component, priority_time, refs);

    let crafts: Vec<CraftLine> = outcome
        .craft_counts
        .iter()
        .map(|(item, count)| CraftLine { item_id: item.to_id(), count: *count })
        .collect();

    let missions: Vec<MissionRow> = actions
        .iter()
        .filter_map(|action| {
            let launches = outcome.mission_launches.get(&action.key).copied().unwrap_or(0);
            if launches == 0 {
                return None;
            }
            let mut top_expected_yields: Vec<ExpectedYield> = action
                .yields
                .iter()
                .map(|(item, per_launch)| ExpectedYield {
                    item_id: item.to_id(),
                    expected_per_launch: *per_launch,
                    expected_total: *per_launch * launches as f64,
                })
                .collect();
            top_expected_yields.sort_by(|a, b| b.expected_total.partial_cmp(&a.expected_total).unwrap());
            top_expected_yields.truncate(5);
            Some(MissionRow {
                mission_id: action.mission_id.clone(),
                ship: action.ship.to_wire().to_string(),
                duration_type: action.duration_type.to_string(),
                duration_seconds: action.duration_seconds,
                launches,
                target_afx_id: action.target_afx_id.clone(),
                top_expected_yields,
            })
        })
        .collect();

    let unmet_items: Vec<ItemId> = outcome.unmet.keys().map(|k| k.to_id()).collect();

    let target_key = target.to_key();
    let craft_count = outcome.craft_counts.get(&target_key).copied().unwrap_or(0);
    let mission_yield: f64 = actions
        .iter()
        .map(|a| outcome.mission_launches.get(&a.key).copied().unwrap_or(0) as f64 * a.yield_of(&target_key))
        .sum();
    let inventory_count = profile.inventory_of(&target_key);
    let (from_craft, from_missions_expected, from_inventory, shortfall) =
        allocate_target_breakdown(quantity, craft_count, mission_yield, inventory_count);

    PlanResult {
        target_item_id: target.clone(),
        quantity,
        priority_time,
        ge_cost,
        total_slot_seconds: farm_slot_seconds,
        expected_hours: farm_slot_seconds / 3.0 / 3600.0,
        weighted_score: score,
        crafts,
        missions,
        unmet_items,
        target_breakdown: TargetBreakdown {
            requested: quantity,
            from_inventory,
            from_craft,
            from_missions_expected,
            shortfall,
        },
        progression: Progression {
            prep_hours: 0.0,
            prep_launches: 0,
            projected_ship_levels: profile
                .ship_levels
                .iter()
                .map(|(ship, snap)| ProjectedShipLevel { ship: ship.to_wire().to_string(), level: snap.level })
                .collect(),
        },
        notes: outcome.notes,
    }
}

/// Spec §4.7: a zero-missions, zero-crafts result with unmet demand and no
/// action anywhere able to yield the missing items is not a valid plan.
fn check_mission_coverage(result: &PlanResult, actions: &[crate::models::MissionAction]) -> PlannerResult<()> {
    if result.unmet_items.is_empty() {
        return Ok(());
    }
    if !result.crafts.is_empty() || !result.missions.is_empty() {
        return Ok(());
    }
    let uncoverable: Vec<String> = result
        .unmet_items
        .iter()
        .filter(|id| {
            let key = id.to_key();
            !actions.iter().any(|a| a.yield_of(&key) > 0.0)
        })
        .map(|id| id.0.clone())
        .collect();
    if !uncoverable.is_empty() {
        return Err(PlannerError::MissionCoverage(uncoverable));
    }
    Ok(())
}

async fn run_plan(
    profile: &PlayerProfile,
    target_item_id: &ItemId,
    quantity: u32,
    priority_time: f64,
    options: &PlanOptions<'_>,
    reporter: &ProgressReporter,
) -> PlannerResult<PlanResult> {
    let quantity = quantity.max(1);
    let priority_time = priority_time.clamp(0.0, 1.0);

    reporter.emit(Phase::Init, "resolving recipes and loot data", None, None).await;
    let recipes = options.recipes.unwrap_or(&DEFAULT_RECIPE_TABLE);
    let target_key = target_item_id.to_key();
    let closure = compute_closure(recipes, &target_key);
    let bounds = craft_upper_bounds(recipes, &target_key, quantity);

    let owned_loot;
    let loot: &LootData = match options.loot_data {
        Some(l) => l,
        None => {
            owned_loot = LOOT_CACHE.get().await?;
            &owned_loot
        }
    };

    let owned_solver;
    let solver: &dyn MilpSolver = match options.solver {
        Some(s) => s,
        None => {
            owned_solver = HighsSolver;
            &owned_solver
        }
    };

    reporter.emit(Phase::Candidates, "enumerating horizon-search candidates", None, None).await;
    let horizon_result = run_horizon_search(
        profile,
        recipes,
        &closure,
        &bounds,
        loot,
        &target_key,
        quantity,
        priority_time,
        options.fast_mode,
        solver,
        reporter,
    )
    .await;

    let (result, actions) = match horizon_result {
        Ok(candidate) => {
            reporter
                .emit(Phase::Refinement, "selected MILP candidate, assembling plan", None, None)
                .await;
            let actions = candidate.actions.clone();
            let result = build_result_from_horizon(profile, target_item_id, quantity, priority_time, candidate);
            (result, actions)
        }
        Err(solver_errors) => {
            reporter
                .emit(Phase::Fallback, "MILP pathway failed for every candidate, running heuristic fallback", None, None)
                .await;
            let (_, mission_options) = crate::ship_model::derive_mission_options(
                &profile.launch_counts(),
                profile.epic_research_ftl_level,
                profile.epic_research_zerog_level,
            );
            let actions = build_mission_actions(&mission_options, loot, &closure);
            let ge_ref = objective::ge_reference(recipes, &closure, &bounds, &profile.craft_counts, &target_key);
            let time_ref = objective::time_reference(&actions, &target_key, quantity);
            let refs = ObjectiveRefs { ge_ref, time_ref };
            let outcome = run_fallback(
                recipes,
                &closure,
                &profile.inventory,
                &profile.craft_counts,
                &actions,
                &target_key,
                quantity,
                priority_time,
                refs,
                &solver_errors,
            );
            let result = build_result_from_fallback(profile, target_item_id, quantity, priority_time, outcome, recipes, &actions, refs);
            (result, actions)
        }
    };

    reporter.emit(Phase::Finalize, "plan complete", None, None).await;
    check_mission_coverage(&result, &actions)?;
    Ok(result)
}

/// Non-streaming entrypoint (spec §6.1): runs to completion and returns the
/// final result or error.
pub async fn plan_for_target(
    profile: &PlayerProfile,
    target_item_id: &ItemId,
    quantity: u32,
    priority_time: f64,
    options: PlanOptions<'_>,
) -> PlannerResult<PlanResult> {
    let reporter = ProgressReporter::null();
    run_plan(profile, target_item_id, quantity, priority_time, &options, &reporter).await
}

/// Streaming entrypoint (spec §6.2): spawns the plan as a background task
/// and returns immediately with the message channel and a cancel handle.
/// `profile`/`options` are cloned/resolved eagerly since the spawned task
/// must be `'static`.
pub fn plan_for_target_streaming(
    profile: PlayerProfile,
    target_item_id: ItemId,
    quantity: u32,
    priority_time: f64,
    fast_mode: bool,
) -> (mpsc::Receiver<PlanMessage>, crate::progress::CancelHandle) {
    let (tx, rx) = mpsc::channel(32);
    let (reporter, handle) = ProgressReporter::new(tx);

    tokio::spawn(async move {
        let options = PlanOptions { fast_mode, ..PlanOptions::default() };
        let outcome = run_plan(&profile, &target_item_id, quantity, priority_time, &options, &reporter).await;
        reporter.finish(outcome).await;
    });

    (rx, handle)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::milp::DecodedSolution;
    use crate::models::{compute_ship_levels, DurationType, LootItem, LootLevel, LootMission, LootTarget, MissionAction, ShipId};
    use std::collections::BTreeMap;

    fn profile_with_inventory(item: &str, count: u32) -> PlayerProfile {
        let mut inventory = BTreeMap::new();
        inventory.insert(crate::models::ItemKey::new(item), count);
        PlayerProfile {
            eid: "p1".into(),
            inventory,
            craft_counts: BTreeMap::new(),
            epic_research_ftl_level: 0,
            epic_research_zerog_level: 0,
            ship_levels: compute_ship_levels(&BTreeMap::new()),
            mission_options: Vec::new(),
        }
    }

    fn loot_with_direct_yield() -> LootData {
        LootData {
            missions: vec![LootMission {
                mission_id: "chicken_one_short".into(),
                levels: vec![LootLevel {
                    level: 0,
                    targets: vec![LootTarget {
                        total_drops: 1.0,
                        target_afx_id: "rock".into(),
                        items: vec![LootItem { item_id: "puzzle-cube-1".into(), counts: [1.0, 0.0, 0.0, 0.0] }],
                    }],
                }],
            }],
        }
    }

    /// A `SolvedCandidate` carrying exactly one mission action launched
    /// `launches` times and nothing else, for exercising
    /// `build_result_from_horizon`'s reporting math directly.
    fn solved_candidate_with_single_mission(action: MissionAction, launches: u32) -> crate::horizon::SolvedCandidate {
        let mut mission_launches = BTreeMap::new();
        mission_launches.insert(action.key.clone(), launches);
        let farm_slot_seconds = launches as f64 * action.duration_seconds;
        crate::horizon::SolvedCandidate {
            ship_levels: compute_ship_levels(&BTreeMap::new()),
            mission_options: Vec::new(),
            actions: vec![action],
            prep_steps: Vec::new(),
            prep_slot_seconds: 0.0,
            decoded: DecodedSolution {
                craft_counts: BTreeMap::new(),
                mission_launches,
                unmet: BTreeMap::new(),
            },
            ge_cost: 0.0,
            farm_slot_seconds,
            time_ref: 1.0,
            score: 0.0,
        }
    }

    /// Spec §8 Scenario 3: a 138,240s Corellihen Corvette long mission
    /// launched twice makes `totalSlotSeconds = 276_480` (unambiguous, spec
    /// §3/§8). The scenario's prose also claims `expectedHours ≈ 38.4`, but
    /// that number is `276_480 / (2 * 3600)` -- dividing by the 2 launches
    /// instead of the 3 concurrent mission slots the spec's own formula
    /// (`expectedHours = totalSlotSeconds / (3 * 3600)`, restated in both §3
    /// and §8's Invariants) calls for. This codebase implements that formula
    /// consistently everywhere else, so this test asserts the
    /// formula-consistent value (~25.667h) rather than encoding the
    /// narrative's apparent division slip.
    #[tokio::test]
    async fn test_scenario_three_makespan_uses_three_concurrent_slots() {
        let profile = profile_with_inventory("other_item", 0);
        let action = MissionAction {
            key: "corellihen_corvette_long|rock".into(),
            mission_id: "corellihen_corvette_long".into(),
            ship: ShipId::CorellihenCorvette,
            duration_type: DurationType::Long,
            duration_seconds: 138_240.0,
            target_afx_id: "rock".into(),
            yields: BTreeMap::from([(crate::models::ItemKey::new("puzzle_cube_1"), 1.0)]),
        };
        let candidate = solved_candidate_with_single_mission(action, 2);

        let result = build_result_from_horizon(&profile, &ItemId::new("puzzle-cube-1"), 2, 0.5, candidate);

        assert_eq!(result.total_slot_seconds, 276_480.0);
        let expected_hours = 276_480.0 / (3.0 * 3600.0);
        assert!((result.expected_hours - expected_hours).abs() < 1e-9);
        assert!((result.expected_hours - 25.666_667).abs() < 1e-3);
    }

    /// Spec §8 Scenario 2: the requested quantity is additional to whatever
    /// is already in inventory, so existing stock of the *target* does not
    /// offset the new demand -- the plan must still farm `quantity` more.
    #[tokio::test]
    async fn test_quantity_is_additional_to_existing_target_inventory() {
        let profile = profile_with_inventory("puzzle_cube_1", 5);
        let recipes = RecipeTable::new(BTreeMap::new());
        let loot = loot_with_direct_yield();
        let options = PlanOptions {
            fast_mode: true,
            loot_data: Some(&loot),
            solver: None,
            recipes: Some(&recipes),
        };
        let result = plan_for_target(&profile, &ItemId::new("puzzle-cube-1"), 3, 0.5, options)
            .await
            .unwrap();
        assert_eq!(result.target_breakdown.from_inventory, 0);
        assert_eq!(result.target_breakdown.from_missions_expected, 3.0);
        assert_eq!(result.target_breakdown.shortfall, 0.0);
    }

    #[tokio::test]
    async fn test_mission_coverage_error_when_nothing_can_yield_target() {
        let profile = profile_with_inventory("unrelated", 0);
        let recipes = RecipeTable::new(BTreeMap::new());
        let loot = LootData { missions: vec![] };
        let options = PlanOptions {
            fast_mode: true,
            loot_data: Some(&loot),
            solver: None,
            recipes: Some(&recipes),
        };
        let err = plan_for_target(&profile, &ItemId::new("puzzle-cube-1"), 3, 0.5, options)
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::MissionCoverage(_)));
    }

    #[tokio::test]
    async fn test_streaming_entrypoint_emits_progress_then_terminal_message() {
        let profile = profile_with_inventory("puzzle_cube_1", 5);
        let (mut rx, _handle) = plan_for_target_streaming(profile, ItemId::new("puzzle-cube-1"), 1, 0.5, true);
        let mut saw_progress = false;
        let mut saw_terminal = false;
        while let Some(msg) = rx.recv().await {
            match msg {
                PlanMessage::Progress { .. } => saw_progress = true,
                PlanMessage::Result { .. } | PlanMessage::Error { .. } => saw_terminal = true,
            }
        }
        assert!(saw_progress);
        assert!(saw_terminal);
    }

    #[tokio::test]
    async fn test_cancelled_stream_produces_no_terminal_message() {
        let profile = profile_with_inventory("puzzle_cube_1", 5);
        let (mut rx, handle) = plan_for_target_streaming(profile, ItemId::new("puzzle-cube-1"), 1, 0.5, true);
        handle.cancel();
        let mut got_any = false;
        while rx.recv().await.is_some() {
            got_any = true;
        }
        // cancellation may race with an in-flight emit; what matters is the
        // channel still closes without the reporter panicking.
        let _ = got_any;
    }
}
