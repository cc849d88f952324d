//! A dense primal simplex solver for the min-register LP.
//!
//! Small and deliberately boring: Big-M handling of `≥`/`=` rows, Bland's
//! rule for cycling-free pivot selection, and a dense `Vec`-of-rows tableau.
//! The LPs this crate builds have a few hundred rows at most, so asymptotics
//! are irrelevant next to predictability.

use reclock_common::{InternalError, ReclockResult};

const EPS: f64 = 1e-9;

/// Comparison sense of a constraint row.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConstraintKind {
    /// `coefficients · x ≤ rhs`
    LessEq,
    /// `coefficients · x ≥ rhs`
    GreaterEq,
    /// `coefficients · x = rhs`
    Equal,
}

/// One constraint row. The right-hand side must be non-negative; callers
/// sign-flip rows as needed before handing them over.
#[derive(Clone, Debug)]
pub struct Constraint {
    /// Structural-variable coefficients, one per LP variable.
    pub coefficients: Vec<f64>,
    /// Comparison sense.
    pub kind: ConstraintKind,
    /// Non-negative right-hand side.
    pub rhs: f64,
}

/// A minimization LP over non-negative variables.
#[derive(Clone, Debug, Default)]
pub struct LinearProgram {
    /// Objective coefficients to minimize.
    pub minimize: Vec<f64>,
    /// Constraint rows.
    pub constraints: Vec<Constraint>,
}

/// Result of a simplex run.
#[derive(Clone, Debug, PartialEq)]
pub enum SimplexOutcome {
    /// An optimal vertex was found.
    Optimal {
        /// Values of the structural variables.
        values: Vec<f64>,
        /// Objective value at the optimum.
        objective: f64,
    },
    /// The constraint set admits no solution.
    Infeasible,
    /// The objective decreases without bound.
    Unbounded,
}

/// Solves the LP. Returns an [`InternalError`] only for malformed input
/// (negative right-hand side, ragged rows) or a pivot budget overrun, never
/// for an infeasible or unbounded program.
pub fn solve(lp: &LinearProgram) -> ReclockResult<SimplexOutcome> {
    let n = lp.minimize.len();
    let m = lp.constraints.len();
    for row in &lp.constraints {
        if row.coefficients.len() != n {
            return Err(InternalError::new(format!(
                "constraint row has {} coefficients, expected {n}",
                row.coefficients.len()
            )));
        }
        if row.rhs < 0.0 {
            return Err(InternalError::new(format!(
                "tableau requires non-negative right-hand sides, got {}",
                row.rhs
            )));
        }
    }

    // Column layout: structural | slack/surplus | artificial | rhs.
    let mut aux_count = 0;
    let mut artificial_count = 0;
    for row in &lp.constraints {
        match row.kind {
            ConstraintKind::LessEq => aux_count += 1,
            ConstraintKind::GreaterEq => {
                aux_count += 1;
                artificial_count += 1;
            }
            ConstraintKind::Equal => artificial_count += 1,
        }
    }
    let columns = n + aux_count + artificial_count;
    let artificial_base = n + aux_count;

    let max_cost = lp.minimize.iter().fold(0.0f64, |a, &c| a.max(c.abs()));
    let big_m = 1e6 * (1.0 + max_cost);

    let mut cost = vec![0.0; columns];
    cost[..n].copy_from_slice(&lp.minimize);
    for c in &mut cost[artificial_base..] {
        *c = big_m;
    }

    let mut tableau = vec![vec![0.0; columns + 1]; m];
    let mut basis = vec![0usize; m];
    let mut next_aux = n;
    let mut next_artificial = artificial_base;
    for (i, row) in lp.constraints.iter().enumerate() {
        tableau[i][..n].copy_from_slice(&row.coefficients);
        tableau[i][columns] = row.rhs;
        match row.kind {
            ConstraintKind::LessEq => {
                tableau[i][next_aux] = 1.0;
                basis[i] = next_aux;
                next_aux += 1;
            }
            ConstraintKind::GreaterEq => {
                tableau[i][next_aux] = -1.0;
                next_aux += 1;
                tableau[i][next_artificial] = 1.0;
                basis[i] = next_artificial;
                next_artificial += 1;
            }
            ConstraintKind::Equal => {
                tableau[i][next_artificial] = 1.0;
                basis[i] = next_artificial;
                next_artificial += 1;
            }
        }
    }

    // Generous: Bland's rule already rules out cycling, the budget only
    // guards against a logic slip turning into a hang.
    let budget = 64 * (m + columns + 1) * (m + 1);
    for _ in 0..budget {
        // Bland: entering column is the lowest-index one with a negative
        // reduced cost.
        let mut entering = None;
        for j in 0..columns {
            if basis.contains(&j) {
                continue;
            }
            let mut reduced = cost[j];
            for i in 0..m {
                reduced -= cost[basis[i]] * tableau[i][j];
            }
            if reduced < -EPS {
                entering = Some(j);
                break;
            }
        }
        let Some(pivot_col) = entering else {
            // Optimal. A basic artificial with a non-zero value means the
            // original constraints were never satisfied.
            for i in 0..m {
                if basis[i] >= artificial_base && tableau[i][columns] > 1e-6 {
                    return Ok(SimplexOutcome::Infeasible);
                }
            }
            let mut values = vec![0.0; n];
            for i in 0..m {
                if basis[i] < n {
                    values[basis[i]] = tableau[i][columns];
                }
            }
            let objective = values
                .iter()
                .zip(&lp.minimize)
                .map(|(x, c)| x * c)
                .sum();
            return Ok(SimplexOutcome::Optimal { values, objective });
        };

        // Ratio test; Bland tie-break on the smallest leaving basis index.
        let mut pivot_row: Option<usize> = None;
        let mut best_ratio = f64::INFINITY;
        for i in 0..m {
            if tableau[i][pivot_col] <= EPS {
                continue;
            }
            let ratio = tableau[i][columns] / tableau[i][pivot_col];
            let better = match pivot_row {
                None => true,
                Some(r) => {
                    ratio < best_ratio - EPS
                        || ((ratio - best_ratio).abs() <= EPS && basis[i] < basis[r])
                }
            };
            if better {
                best_ratio = best_ratio.min(ratio);
                pivot_row = Some(i);
            }
        }
        let Some(pivot_row) = pivot_row else {
            return Ok(SimplexOutcome::Unbounded);
        };

        let pivot = tableau[pivot_row][pivot_col];
        for v in &mut tableau[pivot_row] {
            *v /= pivot;
        }
        for i in 0..m {
            if i == pivot_row {
                continue;
            }
            let factor = tableau[i][pivot_col];
            if factor.abs() > EPS {
                for j in 0..=columns {
                    tableau[i][j] -= factor * tableau[pivot_row][j];
                }
            }
        }
        basis[pivot_row] = pivot_col;
    }
    Err(InternalError::new("simplex pivot budget exhausted"))
}
