use thiserror::Error;

/// Errors surfaced by the planner's public entrypoints.
///
/// `SolverFailed` is intentionally not constructible outside this crate's
/// solver/horizon modules: it drives the internal fallback decision and is
/// never returned from [`crate::planner::plan_for_target`].
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("no mission or recipe path covers {0:?}")]
    MissionCoverage(Vec<String>),

    #[error("loot data unavailable or malformed: {0}")]
    LootData(String),

    #[error("planning failed: {0}")]
    Planning(String),

    #[error("solver failed for candidate: {status:?} ({reason})")]
    SolverFailed { status: String, reason: String },
}

pub type PlannerResult<T> = Result<T, PlannerError>;
