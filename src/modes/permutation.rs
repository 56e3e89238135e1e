//! Resolution of mode orderings between mesh vertices.

use crate::{
    interpolation::fip,
    num::{approx_block_eq, ModeScalar},
};
use ndarray::{Array2, ArrayView2};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Substitute for non-finite entries in a cost matrix.
const LARGE_COST: fip = 1e300;

/// Relative tolerance within which the identity assignment counts as optimal.
const IDENTITY_TIE_TOLERANCE: fip = 1e-12;

/// Strategy for detecting approximately equal modes at a vertex.
///
/// Pairs of modes are visited in order of increasing index offset, so
/// neighbouring modes, which are the most likely to be degenerate, are
/// checked first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum EqualModeSearch {
    /// Compare all pairs of modes.
    #[default]
    AllPairs,
    /// Compare only pairs whose indices differ by at most the given offset.
    WithinOffset(usize),
}

impl EqualModeSearch {
    /// Whether any two of the `branches` modes stored contiguously in `modes`,
    /// each spanning `span` elements, are approximately equal.
    pub fn any_equal<T: ModeScalar>(self, modes: &[T], branches: usize, span: usize) -> bool {
        debug_assert_eq!(modes.len(), branches * span);
        let max_offset = match self {
            Self::AllPairs => branches.saturating_sub(1),
            Self::WithinOffset(max_offset) => max_offset.min(branches.saturating_sub(1)),
        };
        let block = |mode: usize| &modes[mode * span..(mode + 1) * span];
        (1..=max_offset).any(|offset| {
            (0..branches - offset).any(|mode| approx_block_eq(block(mode), block(mode + offset)))
        })
    }
}

/// Solver for the linear assignment problem on square cost matrices.
///
/// Implements the Hungarian method as successive shortest augmenting paths
/// with row and column potentials, in `O(n^3)` time. The buffers are kept
/// between solves so that a solver can be reused without allocating.
#[derive(Clone, Debug, Default)]
pub struct AssignmentSolver {
    row_potentials: Vec<fip>,
    column_potentials: Vec<fip>,
    column_owners: Vec<usize>,
    path: Vec<usize>,
    min_slack: Vec<fip>,
    visited: Vec<bool>,
    assignment: Vec<usize>,
}

impl AssignmentSolver {
    /// Creates a new solver without any allocated buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the assignment of rows to columns minimizing the total cost.
    ///
    /// # Returns
    ///
    /// A slice where entry `i` is the column assigned to row `i`.
    ///
    /// # Panics
    ///
    /// If the cost matrix is not square.
    pub fn solve(&mut self, costs: ArrayView2<fip>) -> &[usize] {
        let n = costs.nrows();
        assert_eq!(n, costs.ncols(), "Cost matrix must be square");

        self.reset(n);
        let cost = |row: usize, column: usize| finite_cost(costs[[row - 1, column - 1]]);

        // Index 0 is a virtual column that holds the row being inserted.
        for row in 1..=n {
            self.column_owners[0] = row;
            self.min_slack.iter_mut().for_each(|slack| *slack = fip::INFINITY);
            self.visited.iter_mut().for_each(|visited| *visited = false);

            let mut current_column = 0;
            loop {
                self.visited[current_column] = true;
                let current_row = self.column_owners[current_column];
                let mut delta = fip::INFINITY;
                let mut next_column = 0;

                for column in 1..=n {
                    if self.visited[column] {
                        continue;
                    }
                    let slack = cost(current_row, column)
                        - self.row_potentials[current_row]
                        - self.column_potentials[column];
                    if slack < self.min_slack[column] {
                        self.min_slack[column] = slack;
                        self.path[column] = current_column;
                    }
                    if self.min_slack[column] < delta {
                        delta = self.min_slack[column];
                        next_column = column;
                    }
                }

                for column in 0..=n {
                    if self.visited[column] {
                        self.row_potentials[self.column_owners[column]] += delta;
                        self.column_potentials[column] -= delta;
                    } else {
                        self.min_slack[column] -= delta;
                    }
                }

                current_column = next_column;
                if self.column_owners[current_column] == 0 {
                    break;
                }
            }

            while current_column != 0 {
                let previous_column = self.path[current_column];
                self.column_owners[current_column] = self.column_owners[previous_column];
                current_column = previous_column;
            }
        }

        for column in 1..=n {
            self.assignment[self.column_owners[column] - 1] = column - 1;
        }
        &self.assignment
    }

    fn reset(&mut self, n: usize) {
        self.row_potentials.clear();
        self.row_potentials.resize(n + 1, 0.0);
        self.column_potentials.clear();
        self.column_potentials.resize(n + 1, 0.0);
        self.column_owners.clear();
        self.column_owners.resize(n + 1, 0);
        self.path.clear();
        self.path.resize(n + 1, 0);
        self.min_slack.resize(n + 1, fip::INFINITY);
        self.visited.resize(n + 1, false);
        self.assignment.clear();
        self.assignment.resize(n, 0);
    }
}

fn finite_cost(cost: fip) -> fip {
    if cost.is_finite() {
        cost
    } else {
        LARGE_COST
    }
}

/// Computes the assignment of rows to columns of a square cost matrix with
/// the minimal total cost.
///
/// Entry `i` of the result is the column assigned to row `i`.
pub fn minimum_cost_assignment(costs: ArrayView2<fip>) -> Vec<usize> {
    AssignmentSolver::new().solve(costs).to_vec()
}

/// Computes the total cost of assigning row `i` to column `assignment[i]`.
pub fn assignment_cost(costs: ArrayView2<fip>, assignment: &[usize]) -> fip {
    assignment
        .iter()
        .enumerate()
        .map(|(row, &column)| costs[[row, column]])
        .sum()
}

/// Writes the permutation minimizing the total cost into `permutation`.
///
/// The identity is kept whenever its cost is not larger than the optimum,
/// so that modes are only reordered when doing so actually lowers the cost.
pub fn optimal_permutation_into(
    costs: ArrayView2<fip>,
    solver: &mut AssignmentSolver,
    permutation: &mut Vec<usize>,
) {
    let n = costs.nrows();
    permutation.clear();
    permutation.extend(0..n);

    let identity_cost: fip = costs.diag().iter().map(|&cost| finite_cost(cost)).sum();
    let assignment = solver.solve(costs);
    let optimal_cost: fip = assignment
        .iter()
        .enumerate()
        .map(|(row, &column)| finite_cost(costs[[row, column]]))
        .sum();

    if identity_cost - optimal_cost > IDENTITY_TIE_TOLERANCE * identity_cost.abs().max(1.0) {
        permutation.copy_from_slice(assignment);
    }
}

/// Computes the permutation minimizing the total cost, preferring the identity on ties.
pub fn optimal_permutation(costs: ArrayView2<fip>) -> Vec<usize> {
    let mut permutation = Vec::with_capacity(costs.nrows());
    optimal_permutation_into(costs, &mut AssignmentSolver::new(), &mut permutation);
    permutation
}

/// Scratch buffers used while resolving permutations for a single query.
///
/// Each worker thread owns one workspace for the duration of its items.
#[derive(Clone, Debug)]
pub struct QueryWorkspace {
    pub(crate) costs: Array2<fip>,
    pub(crate) solver: AssignmentSolver,
    pub(crate) permutation: Vec<usize>,
}

impl QueryWorkspace {
    /// Creates a new workspace for data with the given number of modes per point.
    pub fn new(branches: usize) -> Self {
        Self {
            costs: Array2::zeros((branches, branches)),
            solver: AssignmentSolver::new(),
            permutation: (0..branches).collect(),
        }
    }

    /// Number of modes the workspace is sized for.
    pub fn branches(&self) -> usize {
        self.costs.nrows()
    }

    /// Permutation resolved most recently with this workspace.
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }
}
