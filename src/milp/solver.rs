use crate::error::{PlannerError, PlannerResult};
use good_lp::solvers::highs::highs;
use good_lp::{Constraint, Expression, ProblemVariables, Solution, SolverModel, Variable};
use std::collections::HashMap;

/// A fully assembled MILP, independent of which backend solves it.
pub struct MilpProblem {
    pub vars: ProblemVariables,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
    /// Named decision variables the caller wants back out of the solution,
    /// keyed by the variable name assigned when it was created.
    pub named: HashMap<String, Variable>,
    pub time_limit_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Other(String),
}

pub struct SolverOutcome {
    pub status: SolveStatus,
    pub values: HashMap<String, f64>,
}

/// The MILP solver seam (spec §9): the default implementation delegates to
/// HiGHS via `good_lp`; tests inject a scripted mock instead.
pub trait MilpSolver: Send + Sync {
    fn solve(&self, problem: MilpProblem) -> PlannerResult<SolverOutcome>;
}

pub struct HighsSolver;

impl MilpSolver for HighsSolver {
    fn solve(&self, problem: MilpProblem) -> PlannerResult<SolverOutcome> {
        let MilpProblem {
            vars,
            objective,
            constraints,
            named,
            time_limit_seconds,
        } = problem;

        let mut model = vars
            .minimise(objective)
            .using(highs)
            .set_time_limit(time_limit_seconds);
        for constraint in constraints {
            model = model.with(constraint);
        }

        match model.solve() {
            Ok(solution) => {
                let values = named
                    .iter()
                    .map(|(name, var)| (name.clone(), solution.value(*var)))
                    .collect();
                Ok(SolverOutcome {
                    status: SolveStatus::Optimal,
                    values,
                })
            }
            Err(e) => Err(PlannerError::SolverFailed {
                status: format!("{e:?}"),
                reason: e.to_string(),
            }),
        }
    }
}

/// Test-only solver that returns a scripted set of variable values,
/// regardless of the problem it is handed. Lets `horizon`/`planner` tests
/// exercise the decode path without invoking HiGHS.
#[cfg(test)]
pub struct ScriptedSolver {
    pub values: HashMap<String, f64>,
    pub status: SolveStatus,
}

#[cfg(test)]
impl MilpSolver for ScriptedSolver {
    fn solve(&self, problem: MilpProblem) -> PlannerResult<SolverOutcome> {
        if self.status != SolveStatus::Optimal {
            return Err(PlannerError::SolverFailed {
                status: format!("{:?}", self.status),
                reason: "scripted failure".to_string(),
            });
        }
        let values = problem
            .named
            .iter()
            .map(|(name, _)| (name.clone(), self.values.get(name).copied().unwrap_or(0.0)))
            .collect();
        Ok(SolverOutcome {
            status: SolveStatus::Optimal,
            values,
        })
    }
}
