//! Module for representing the solved state of a model
//!
//! Solving the optimization problem is done elsewhere, a [`Solution`] only carries the
//! results so that fluxes can be drawn.

use indexmap::IndexMap;
use thiserror::Error;

/// Struct representing the solution to an optimization problem
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    /// The status of the optimization problem, representing if the optimization was
    /// completed successfully
    pub status: OptimizationStatus,
    /// Optimized value of the objective
    ///
    /// Some(f64) if the optimization was completed successfully, None otherwise
    pub objective_value: Option<f64>,
    /// Flux through each reaction at the optimum, keyed by reaction id
    pub fluxes: IndexMap<String, f64>,
}

impl Solution {
    /// Create an optimal solution from reaction fluxes
    pub fn optimal(fluxes: IndexMap<String, f64>) -> Self {
        Solution {
            status: OptimizationStatus::Optimal,
            objective_value: None,
            fluxes,
        }
    }

    /// Create a solution for a problem which could not be solved
    pub fn failed(status: OptimizationStatus) -> Self {
        Solution {
            status,
            objective_value: None,
            fluxes: IndexMap::new(),
        }
    }

    /// Flux through a reaction
    ///
    /// Fails if the problem was not solved to optimality, if the reaction is not part of
    /// the solution, or if the stored value is not finite.
    pub fn flux(&self, reaction_id: &str) -> Result<f64, FluxError> {
        match self.status {
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal => {}
            status => return Err(FluxError::NotOptimal(status)),
        }
        match self.fluxes.get(reaction_id) {
            Some(flux) if flux.is_finite() => Ok(*flux),
            Some(_) => Err(FluxError::NonFinite(reaction_id.to_string())),
            None => Err(FluxError::MissingReaction(reaction_id.to_string())),
        }
    }
}

/// Status of an optimization problem
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OptimizationStatus {
    /// Problem has not yet attempted to be optimized
    Unoptimized,
    /// Problem has been optimized
    Optimal,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
    /// An approximate solution has been found
    AlmostOptimal,
    /// A numerical error occurred during solving
    NumericalError,
    /// The solver hit the maximum allowed iterations, or max time, or made insufficient progress
    SolverHalted,
}

/// Reasons a reaction flux can't be determined
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluxError {
    #[error("The model has not been solved")]
    Unsolved,
    #[error("The model solution is not optimal ({0:?})")]
    NotOptimal(OptimizationStatus),
    #[error("No flux is available for {0}")]
    MissingReaction(String),
    #[error("The flux for {0} is not a finite number")]
    NonFinite(String),
}
