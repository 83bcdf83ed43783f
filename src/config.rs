use lazy_static::lazy_static;

pub struct Config {
    pub beam_width: usize,
    pub max_depth: usize,
    pub fast_mode_max_candidates: usize,
    pub solver_time_limit_seconds: f64,
    pub max_greedy_iterations: usize,
    pub fulfill_depth_cap: usize,
    pub level_up_search_limit: u64,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

lazy_static! {
    pub static ref CONFIG: Config = Config {
        beam_width: env_or("PLANNER_BEAM_WIDTH", 6),
        max_depth: env_or("PLANNER_MAX_DEPTH", 2),
        fast_mode_max_candidates: env_or("PLANNER_FAST_MODE_MAX_CANDIDATES", 8),
        solver_time_limit_seconds: env_or("PLANNER_SOLVER_TIME_LIMIT_SECONDS", 5.0),
        max_greedy_iterations: env_or("PLANNER_MAX_GREEDY_ITERATIONS", 3000),
        fulfill_depth_cap: env_or("PLANNER_FULFILL_DEPTH_CAP", 30),
        level_up_search_limit: env_or("PLANNER_LEVEL_UP_SEARCH_LIMIT", 600),
    };
}

pub const MIN_TIME_WEIGHT: f64 = 1e-5;

/// Reserved multiplier on slot-time in the objective and horizon-search
/// pruning bound (spec §4.5/§4.6 `timeMult`). The spec carries this factor
/// through both formulas without defining a source for it; until a
/// gameplay-level time multiplier (e.g. a consumable time-warp item) is
/// in scope it is fixed at 1.0.
pub const TIME_MULT: f64 = 1.0;

/// Numerical tolerance used when comparing floating-point demand/slack
/// quantities against zero (unmet-demand checks, greedy-packing residuals).
pub const EPSILON: f64 = 1e-6;
