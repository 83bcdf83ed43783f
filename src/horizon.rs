//! Bounded beam search over ship-progression states (spec §4.6). Enumerates
//! alternative mission-option sets reachable via a few "prep" launches,
//! re-solves the unified MILP per survivor, and selects the plan with the
//! smallest normalized objective value. This is a finite-state exploration
//! in the same overall shape as this codebase's top-level planner entry
//! (`logistics_planner::plan::run_planner`: build candidates, solve, decode)
//! but walking ship-progression states instead of VRP job assignments.

use crate::config::{CONFIG, TIME_MULT};
use crate::cost::batch_cost;
use crate::milp::{build_milp, decode_solution, DecodedSolution, MilpSolver};
use crate::mission_actions::build_mission_actions;
use crate::models::{
    mission_options_fingerprint, DurationType, ItemKey, LootData, MissionAction, MissionBase,
    MissionOption, MissionOptionFingerprint, PlayerProfile, RecipeTable, ShipId, ShipLevelSnapshot,
    SHIP_MISSIONS, UNLOCK_THRESHOLDS,
};
use crate::objective::{self, ObjectiveRefs};
use crate::ship_model::derive_mission_options;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use strum::IntoEnumIterator;

#[derive(Debug, Clone)]
pub struct PrepStepRecord {
    pub ship: ShipId,
    pub duration_type: DurationType,
    pub launches: u32,
    pub duration_seconds: f64,
    pub reason: String,
}

#[derive(Debug, Clone)]
struct ProgressionState {
    launch_counts: BTreeMap<ShipId, BTreeMap<DurationType, u32>>,
    prep_steps: Vec<PrepStepRecord>,
    prep_slot_seconds: f64,
}

/// A fully solved horizon-search candidate: the winning (or attempted)
/// progression state plus the plan decoded from its MILP solution.
pub struct SolvedCandidate {
    pub ship_levels: BTreeMap<ShipId, ShipLevelSnapshot>,
    pub mission_options: Vec<MissionOption>,
    pub actions: Vec<MissionAction>,
    pub prep_steps: Vec<PrepStepRecord>,
    pub prep_slot_seconds: f64,
    pub decoded: DecodedSolution,
    pub ge_cost: f64,
    pub farm_slot_seconds: f64,
    pub time_ref: f64,
    pub score: f64,
}

fn duration_types_for(ship: ShipId) -> Vec<DurationType> {
    SHIP_MISSIONS
        .keys()
        .filter(|(s, _)| *s == ship)
        .map(|(_, dt)| *dt)
        .collect()
}

fn find_level_up(
    ship: ShipId,
    dt: DurationType,
    launch_counts: &BTreeMap<ShipId, BTreeMap<DurationType, u32>>,
    ship_levels: &BTreeMap<ShipId, ShipLevelSnapshot>,
) -> Option<u32> {
    let snap = ship_levels.get(&ship)?;
    if !snap.unlocked || snap.level >= snap.max_level {
        return None;
    }
    let current = launch_counts.get(&ship).cloned().unwrap_or_default();
    let target_level = snap.level + 1;
    for l in 1..=CONFIG.level_up_search_limit as u32 {
        let mut trial = current.clone();
        *trial.entry(dt).or_insert(0) += l;
        let points = ShipLevelSnapshot::launch_points(&trial);
        let new_level = ShipLevelSnapshot::level_for_points(ship, points, true);
        if new_level == target_level {
            return Some(l);
        }
        if new_level > target_level {
            return None;
        }
    }
    None
}

fn find_unlock(ship: ShipId, ship_levels: &BTreeMap<ShipId, ShipLevelSnapshot>) -> Option<(ShipId, u32)> {
    let snap = ship_levels.get(&ship)?;
    if snap.unlocked {
        return None;
    }
    let pred = ship.predecessor()?;
    let pred_snap = ship_levels.get(&pred)?;
    if !pred_snap.unlocked {
        return None;
    }
    let threshold = *UNLOCK_THRESHOLDS.get(&ship)?;
    let deficit = threshold.saturating_sub(pred_snap.launches);
    if deficit == 0 {
        return None;
    }
    Some((pred, deficit))
}

fn mission_base_duration(
    ship: ShipId,
    dt: DurationType,
    mission_options: &[MissionOption],
) -> f64 {
    mission_options
        .iter()
        .find(|o| o.ship == ship && o.duration_type == dt)
        .map(|o| o.duration_seconds)
        .unwrap_or_else(|| {
            SHIP_MISSIONS
                .get(&(ship, dt))
                .map(|b: &MissionBase| b.base_duration_seconds)
                .unwrap_or(0.0)
        })
}

fn enumerate_successors(
    state: &ProgressionState,
    ftl_level: u32,
    zerog_level: u32,
) -> Vec<ProgressionState> {
    let (ship_levels, mission_options) = derive_mission_options(&state.launch_counts, ftl_level, zerog_level);
    let mut out = Vec::new();

    for ship in ShipId::iter() {
        for dt in duration_types_for(ship) {
            if let Some(l) = find_level_up(ship, dt, &state.launch_counts, &ship_levels) {
                let duration_seconds = mission_base_duration(ship, dt, &mission_options);
                let mut launch_counts = state.launch_counts.clone();
                *launch_counts.entry(ship).or_default().entry(dt).or_insert(0) += l;
                let mut prep_steps = state.prep_steps.clone();
                prep_steps.push(PrepStepRecord {
                    ship,
                    duration_type: dt,
                    launches: l,
                    duration_seconds,
                    reason: format!("Level up {}", ship.to_wire()),
                });
                out.push(ProgressionState {
                    launch_counts,
                    prep_steps,
                    prep_slot_seconds: state.prep_slot_seconds + l as f64 * duration_seconds,
                });
            }
        }

        if let Some((pred, deficit)) = find_unlock(ship, &ship_levels) {
            for dt in duration_types_for(pred) {
                let duration_seconds = mission_base_duration(pred, dt, &mission_options);
                let mut launch_counts = state.launch_counts.clone();
                *launch_counts.entry(pred).or_default().entry(dt).or_insert(0) += deficit;
                let mut prep_steps = state.prep_steps.clone();
                prep_steps.push(PrepStepRecord {
                    ship: pred,
                    duration_type: dt,
                    launches: deficit,
                    duration_seconds,
                    reason: format!("Unlock {}", ship.to_wire()),
                });
                out.push(ProgressionState {
                    launch_counts,
                    prep_steps,
                    prep_slot_seconds: state.prep_slot_seconds + deficit as f64 * duration_seconds,
                });
            }
        }
    }
    out
}

fn fingerprint(lc: &BTreeMap<ShipId, BTreeMap<DurationType, u32>>) -> Vec<(ShipId, DurationType, u32)> {
    lc.iter()
        .flat_map(|(s, m)| m.iter().map(move |(d, c)| (*s, *d, *c)))
        .collect()
}

/// Runs the beam search (spec §4.6) and returns every candidate progression
/// state still alive after dedup/fast-mode truncation, sorted ascending by
/// `prepSlotSeconds` (so the zero-prep candidate is always first).
fn enumerate_candidates(
    profile: &PlayerProfile,
    fast_mode: bool,
) -> Vec<ProgressionState> {
    let ftl = profile.epic_research_ftl_level;
    let zerog = profile.epic_research_zerog_level;

    let initial = ProgressionState {
        launch_counts: profile.launch_counts(),
        prep_steps: Vec::new(),
        prep_slot_seconds: 0.0,
    };

    let mut visited: HashSet<BTreeMap<ShipId, BTreeMap<DurationType, u32>>> = HashSet::new();
    visited.insert(initial.launch_counts.clone());
    let mut all_candidates = vec![initial.clone()];
    let mut frontier = vec![initial];

    for _depth in 0..CONFIG.max_depth {
        let mut raw: Vec<ProgressionState> = Vec::new();
        for state in &frontier {
            raw.extend(enumerate_successors(state, ftl, zerog));
        }

        let mut dedup: BTreeMap<Vec<(ShipId, DurationType, u32)>, ProgressionState> = BTreeMap::new();
        for succ in raw {
            if visited.contains(&succ.launch_counts) {
                continue;
            }
            let fp = fingerprint(&succ.launch_counts);
            dedup
                .entry(fp)
                .and_modify(|existing| {
                    if succ.prep_slot_seconds < existing.prep_slot_seconds {
                        *existing = succ.clone();
                    }
                })
                .or_insert(succ);
        }

        let mut successors: Vec<ProgressionState> = dedup.into_values().collect();
        successors.sort_by(|a, b| a.prep_slot_seconds.partial_cmp(&b.prep_slot_seconds).unwrap());
        successors.truncate(CONFIG.beam_width);

        for s in &successors {
            visited.insert(s.launch_counts.clone());
        }
        all_candidates.extend(successors.iter().cloned());
        frontier = successors;
    }

    // Dedup by mission-option fingerprint: keep the cheapest-prep candidate
    // per distinct derived mission-option set (spec §4.6).
    let mut by_fp: BTreeMap<Vec<MissionOptionFingerprint>, ProgressionState> = BTreeMap::new();
    for state in all_candidates {
        let (_, options) = derive_mission_options(&state.launch_counts, ftl, zerog);
        let fp = mission_options_fingerprint(&options);
        by_fp
            .entry(fp)
            .and_modify(|existing| {
                if state.prep_slot_seconds < existing.prep_slot_seconds {
                    *existing = state.clone();
                }
            })
            .or_insert(state);
    }

    let mut deduped: Vec<ProgressionState> = by_fp.into_values().collect();
    deduped.sort_by(|a, b| a.prep_slot_seconds.partial_cmp(&b.prep_slot_seconds).unwrap());

    if fast_mode && deduped.len() > CONFIG.fast_mode_max_candidates {
        debug!(
            "fast mode: truncating {} deduped candidates to {}",
            deduped.len(),
            CONFIG.fast_mode_max_candidates
        );
        deduped.truncate(CONFIG.fast_mode_max_candidates);
    }

    deduped
}

/// Runs the beam search and per-candidate MILP solve loop (spec §4.6). This
/// is the one place the async planner yields at each of the spec's "each
/// MILP solve" suspension points (spec §5): every iteration emits a
/// `Phase::Candidate` progress message before solving, and checks
/// `reporter.is_cancelled()` so a client disconnect stops the search between
/// candidates instead of only after the full beam finishes.
#[allow(clippy::too_many_arguments)]
pub async fn run_horizon_search(
    profile: &PlayerProfile,
    recipes: &RecipeTable,
    closure: &BTreeSet<ItemKey>,
    craft_upper_bounds: &BTreeMap<ItemKey, u32>,
    loot: &LootData,
    target: &ItemKey,
    quantity: u32,
    priority_time: f64,
    fast_mode: bool,
    solver: &dyn MilpSolver,
    reporter: &crate::progress::ProgressReporter,
) -> Result<SolvedCandidate, Vec<String>> {
    let ge_ref = objective::ge_reference(recipes, closure, craft_upper_bounds, &profile.craft_counts, target);

    // T_ref is computed once from the profile's current (zero-prep) mission
    // options and reused for every candidate (spec §4.6: `total_score`
    // passes a single `T_ref`). Recomputing it per candidate would give
    // later, better-equipped candidates a different denominator than the
    // one the pruning lower bound and `best` were compared under, making
    // cross-candidate selection inconsistent.
    let (_, initial_mission_options) = derive_mission_options(
        &profile.launch_counts(),
        profile.epic_research_ftl_level,
        profile.epic_research_zerog_level,
    );
    let initial_actions = build_mission_actions(&initial_mission_options, loot, closure);
    let time_ref = objective::time_reference(&initial_actions, target, quantity);
    let refs = ObjectiveRefs { ge_ref, time_ref };

    let candidates = enumerate_candidates(profile, fast_mode);
    let total = candidates.len();

    let w_t = priority_time.clamp(0.0, 1.0);
    let mut best: Option<SolvedCandidate> = None;
    let mut errors: Vec<String> = Vec::new();

    for (idx, state) in candidates.into_iter().enumerate() {
        if reporter.is_cancelled() {
            debug!("horizon: cancellation observed, stopping candidate search at {}/{total}", idx + 1);
            break;
        }
        reporter
            .emit(
                crate::progress::Phase::Candidate,
                format!("solving candidate {}/{total}", idx + 1),
                Some((idx + 1) as u32),
                Some(total as u32),
            )
            .await;

        let (ship_levels, mission_options) = derive_mission_options(
            &state.launch_counts,
            profile.epic_research_ftl_level,
            profile.epic_research_zerog_level,
        );
        let actions = build_mission_actions(&mission_options, loot, closure);

        let lower_bound = w_t * (state.prep_slot_seconds / 3.0 * TIME_MULT) / refs.time_ref;
        if let Some(b) = &best {
            if b.score <= lower_bound + 1e-9 {
                debug!(
                    "horizon: pruning candidate {} (lower bound {lower_bound:.6} >= best {:.6})",
                    idx + 1,
                    b.score
                );
                continue;
            }
        }

        let built = build_milp(
            recipes,
            closure,
            craft_upper_bounds,
            &profile.craft_counts,
            &profile.inventory,
            &actions,
            target,
            quantity,
            priority_time,
            refs,
            CONFIG.solver_time_limit_seconds,
        );

        match solver.solve(built.problem) {
            Ok(outcome) => {
                let decoded = decode_solution(
                    &built.craft_var_names,
                    &built.mission_var_names,
                    &built.unmet_var_names,
                    &outcome,
                );
                let ge_cost = decoded
                    .craft_counts
                    .iter()
                    .map(|(item, count)| {
                        let base = recipes.get(item).map(|r| r.cost).unwrap_or(0.0);
                        let start = profile.craft_count_of(item);
                        batch_cost(base, start, *count)
                    })
                    .sum::<f64>();
                let farm_slot_seconds: f64 = actions
                    .iter()
                    .map(|a| decoded.mission_launches.get(&a.key).copied().unwrap_or(0) as f64 * a.duration_seconds)
                    .sum();
                let time_component = (state.prep_slot_seconds + farm_slot_seconds) / 3.0 * TIME_MULT;
                let score = objective::normalized_score(ge_cost, time_component, priority_time, refs);

                let replace = match &best {
                    None => true,
                    Some(b) => score < b.score - 1e-9 || ((score - b.score).abs() <= 1e-9 && farm_slot_seconds < b.farm_slot_seconds),
                };
                if replace {
                    debug!(
                        "horizon: candidate {} is new best (score={score:.6}, runner-up={:?})",
                        idx + 1,
                        best.as_ref().map(|b| b.score)
                    );
                    best = Some(SolvedCandidate {
                        ship_levels,
                        mission_options,
                        actions,
                        prep_steps: state.prep_steps,
                        prep_slot_seconds: state.prep_slot_seconds,
                        decoded,
                        ge_cost,
                        farm_slot_seconds,
                        time_ref: refs.time_ref,
                        score,
                    });
                }
            }
            Err(e) => {
                errors.push(format!("candidate {}: {e}", idx + 1));
            }
        }
    }

    best.ok_or(errors)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::milp::{ScriptedSolver, SolveStatus};
    use crate::models::{compute_ship_levels, LootLevel, LootMission, LootTarget, LootItem};
    use crate::progress::ProgressReporter;
    use std::collections::HashMap;

    fn profile_with_chicken_one_short(launches: u32) -> PlayerProfile {
        let mut lc = BTreeMap::new();
        lc.insert(ShipId::ChickenOne, BTreeMap::from([(DurationType::Short, launches)]));
        PlayerProfile {
            eid: "p1".into(),
            inventory: BTreeMap::new(),
            craft_counts: BTreeMap::new(),
            epic_research_ftl_level: 0,
            epic_research_zerog_level: 0,
            ship_levels: compute_ship_levels(&lc),
            mission_options: Vec::new(),
        }
    }

    #[test]
    fn test_zero_prep_candidate_always_present() {
        let profile = profile_with_chicken_one_short(3);
        let candidates = enumerate_candidates(&profile, false);
        assert!(candidates.iter().any(|c| c.prep_slot_seconds == 0.0));
    }

    #[test]
    fn test_fast_mode_truncates_candidate_count() {
        let profile = profile_with_chicken_one_short(0);
        let normal = enumerate_candidates(&profile, false);
        let fast = enumerate_candidates(&profile, true);
        assert!(fast.len() <= CONFIG.fast_mode_max_candidates);
        assert!(fast.len() <= normal.len());
    }

    fn single_mission_loot() -> LootData {
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

    #[tokio::test]
    async fn test_single_mission_scenario_solves_via_scripted_solver() {
        pretty_env_logger::formatted_timed_builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init()
            .ok();

        let profile = profile_with_chicken_one_short(0);
        let recipes = RecipeTable::new(BTreeMap::new());
        let target = ItemKey::new("puzzle_cube_1");
        let closure = BTreeSet::from([target.clone()]);
        let loot = single_mission_loot();

        // Scripted solver: pretend the optimum launches the chicken_one
        // short mission action exactly twice, matching demand of 2.
        let values: HashMap<String, f64> = HashMap::new();
        let solver = ScriptedSolver { values, status: SolveStatus::Optimal };
        let reporter = ProgressReporter::null();

        let result = run_horizon_search(
            &profile,
            &recipes,
            &closure,
            &BTreeMap::new(),
            &loot,
            &target,
            2,
            0.5,
            false,
            &solver,
            &reporter,
        )
        .await;
        // Scripted solver returns all zeros, so this yields unmet demand
        // rather than a covering plan -- we're only checking that the
        // candidate pipeline actually runs the solver and decodes a result.
        assert!(result.is_ok());
    }

    /// Spec §8 Scenario 1: a single mission action yielding 1/launch, demand
    /// 2, should decode to exactly 2 launches and no unmet demand.
    #[tokio::test]
    async fn test_scenario_one_single_mission_covers_demand() {
        let profile = profile_with_chicken_one_short(0);
        let recipes = RecipeTable::new(BTreeMap::new());
        let target = ItemKey::new("puzzle_cube_1");
        let closure = BTreeSet::from([target.clone()]);
        let loot = single_mission_loot();
        let action_key = MissionAction::make_key("chicken_one_short", "rock");

        let values: HashMap<String, f64> = HashMap::from([(format!("m_{}", action_key.replace('|', "_")), 2.0)]);
        let solver = ScriptedSolver { values, status: SolveStatus::Optimal };
        let reporter = ProgressReporter::null();

        let candidate = run_horizon_search(
            &profile,
            &recipes,
            &closure,
            &BTreeMap::new(),
            &loot,
            &target,
            2,
            0.5,
            false,
            &solver,
            &reporter,
        )
        .await
        .expect("scripted solver covers demand");

        assert_eq!(candidate.decoded.mission_launches.get(&action_key).copied(), Some(2));
        assert!(candidate.decoded.unmet.is_empty());
        assert_eq!(candidate.prep_slot_seconds, 0.0);
    }

    /// Spec §8 Scenario 5: unlocking a ship records a reason string that
    /// names the unlocked ship in the game's wire-format spelling
    /// (`CHICKEN_NINE`), not this enum's `Display`.
    #[test]
    fn test_scenario_five_unlock_reason_uses_wire_format() {
        let profile = profile_with_chicken_one_short(3);
        let candidates = enumerate_candidates(&profile, false);
        let found = candidates.iter().any(|c| {
            c.prep_steps
                .iter()
                .any(|step| step.reason.contains("Unlock CHICKEN_NINE"))
        });
        assert!(found, "expected some candidate to unlock CHICKEN_NINE");
    }

    /// Spec §8 Scenario 6: running fast mode must never report a lower
    /// (better) weighted score than a full search over the same inputs.
    #[tokio::test]
    async fn test_scenario_six_fast_mode_score_not_better_than_normal() {
        let profile = profile_with_chicken_one_short(0);
        let recipes = RecipeTable::new(BTreeMap::new());
        let target = ItemKey::new("puzzle_cube_1");
        let closure = BTreeSet::from([target.clone()]);
        let loot = single_mission_loot();
        let values: HashMap<String, f64> = HashMap::new();

        let normal_solver = ScriptedSolver { values: values.clone(), status: SolveStatus::Optimal };
        let normal_reporter = ProgressReporter::null();
        let normal = run_horizon_search(
            &profile,
            &recipes,
            &closure,
            &BTreeMap::new(),
            &loot,
            &target,
            2,
            0.5,
            false,
            &normal_solver,
            &normal_reporter,
        )
        .await
        .expect("normal search solves");

        let fast_solver = ScriptedSolver { values, status: SolveStatus::Optimal };
        let fast_reporter = ProgressReporter::null();
        let fast = run_horizon_search(
            &profile,
            &recipes,
            &closure,
            &BTreeMap::new(),
            &loot,
            &target,
            2,
            0.5,
            true,
            &fast_solver,
            &fast_reporter,
        )
        .await
        .expect("fast search solves");

        assert!(fast.score >= normal.score - 1e-9);
    }
}
