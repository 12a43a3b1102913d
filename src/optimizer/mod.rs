//! Assignment Engine
//!
//! Compiles a request into a 0/1 integer program over order-channel pairs,
//! drives HiGHS under the request's wall-clock budget, and recovers the
//! assignment. When the solver yields nothing usable the engine degrades to
//! a deterministic greedy pass instead of failing.

pub mod normalize;

use std::collections::HashMap;
use std::time::Instant;

use highs::{HighsModelStatus, RowProblem, Sense};
use tracing::{debug, warn};

use crate::model::{OptimizeRequest, OptimizeResponse, SolveStatus};
use self::normalize::{NormalizedRequest, SCORE_SCALE};

/// One binary decision variable: order `i` served by channel `j`.
struct PairVar {
    order: usize,
    channel: usize,
    col: highs::Col,
}

/// What the solve step produced, before response shaping.
enum SolveOutcome {
    Solved {
        /// Channel index chosen for each order, in order index position.
        assignment: Vec<usize>,
        status: SolveStatus,
        solver_status: String,
    },
    /// Infeasible, unbounded, unknown, or a time limit with no usable
    /// incumbent.
    NoSolution {
        solver_status: String,
        reason: String,
    },
}

/// Solve one request end to end. Pure: every call owns its own model and
/// solver instance.
pub fn solve(request: &OptimizeRequest) -> OptimizeResponse {
    let start = Instant::now();
    let norm = NormalizedRequest::build(request);

    match run_solver(&norm) {
        SolveOutcome::Solved {
            assignment,
            status,
            solver_status,
        } => shape_solved(&norm, &assignment, status, &solver_status, start),
        SolveOutcome::NoSolution {
            solver_status,
            reason,
        } => fallback(&norm, &solver_status, &reason, start),
    }
}

/// Build the integer program and run HiGHS under the wall-clock cap.
///
/// Constraints: one channel per order, channel load bounded by remaining
/// capacity. Infeasible pairs never get a variable, so reachability and
/// deadline violations are pruned before the solver sees them.
fn run_solver(norm: &NormalizedRequest<'_>) -> SolveOutcome {
    let mut problem = RowProblem::default();

    let mut vars: Vec<PairVar> = Vec::new();
    for i in 0..norm.order_count() {
        for j in 0..norm.channel_count() {
            if norm.feasible[i][j] {
                vars.push(PairVar {
                    order: i,
                    channel: j,
                    col: problem.add_integer_column(norm.score[i][j] as f64, 0..=1),
                });
            }
        }
    }

    // Assignment rows. An order with no feasible channel contributes an
    // empty row with bounds [1, 1], which reads back as infeasible.
    for i in 0..norm.order_count() {
        let coefs: Vec<(highs::Col, f64)> = vars
            .iter()
            .filter(|v| v.order == i)
            .map(|v| (v.col, 1.0))
            .collect();
        problem.add_row(1.0..=1.0, coefs);
    }

    // Capacity rows.
    for j in 0..norm.channel_count() {
        let coefs: Vec<(highs::Col, f64)> = vars
            .iter()
            .filter(|v| v.channel == j)
            .map(|v| (v.col, 1.0))
            .collect();
        if !coefs.is_empty() {
            let available = f64::from(norm.channels[j].available_capacity());
            problem.add_row(..=available, coefs);
        }
    }

    let mut model = problem.optimise(Sense::Minimise);
    model.set_option("output_flag", false);
    // Single-threaded keeps tie-breaking deterministic across runs.
    model.set_option("threads", 1);
    model.set_option("time_limit", norm.timeout_seconds);

    let solved = model.solve();
    let status = solved.status();
    let solver_status = format!("{status:?}");
    debug!(solver_status = %solver_status, variables = vars.len(), "solver returned");

    if status == HighsModelStatus::Optimal {
        let solution = solved.get_solution();
        match extract_assignment(&vars, solution.columns(), norm.order_count()) {
            Some(assignment) => SolveOutcome::Solved {
                assignment,
                status: SolveStatus::Optimal,
                solver_status,
            },
            None => SolveOutcome::NoSolution {
                solver_status,
                reason: "optimal status without a readable assignment".to_string(),
            },
        }
    } else if solver_status.contains("TimeLimit") {
        // The time-limit variant is spelled differently across solver
        // crate majors (TimeLimit vs ReachedTimeLimit); detect it from
        // the rendered status rather than naming one spelling.
        let solution = solved.get_solution();
        match extract_assignment(&vars, solution.columns(), norm.order_count()) {
            Some(assignment) => SolveOutcome::Solved {
                assignment,
                status: SolveStatus::Feasible,
                solver_status,
            },
            None => SolveOutcome::NoSolution {
                solver_status,
                reason: "time limit reached before a feasible assignment was found"
                    .to_string(),
            },
        }
    } else {
        let reason = format!("solver returned {solver_status}");
        SolveOutcome::NoSolution {
            solver_status,
            reason,
        }
    }
}

/// Read the chosen channel per order out of the column values. Returns
/// `None` unless every order has exactly one set variable.
fn extract_assignment(
    vars: &[PairVar],
    values: &[f64],
    order_count: usize,
) -> Option<Vec<usize>> {
    if values.len() < vars.len() {
        return None;
    }

    let mut assignment: Vec<Option<usize>> = vec![None; order_count];
    for (var, &value) in vars.iter().zip(values) {
        if value > 0.5 {
            if assignment[var.order].is_some() {
                return None;
            }
            assignment[var.order] = Some(var.channel);
        }
    }

    assignment.into_iter().collect()
}

fn shape_solved(
    norm: &NormalizedRequest<'_>,
    assignment: &[usize],
    status: SolveStatus,
    solver_status: &str,
    start: Instant,
) -> OptimizeResponse {
    let mut assignments = HashMap::with_capacity(assignment.len());
    let mut total = 0i64;
    for (i, &j) in assignment.iter().enumerate() {
        assignments.insert(norm.orders[i].id.clone(), norm.channels[j].id.clone());
        total += norm.score[i][j];
    }

    OptimizeResponse {
        assignments,
        total_score: total as f64 / SCORE_SCALE,
        solve_time_ms: start.elapsed().as_millis() as u64,
        status,
        metadata: base_metadata(norm, solver_status),
    }
}

/// Greedy degraded-mode assignment: orders in input order, each to the
/// first channel with spare running load. Reachability and deadlines are
/// deliberately not checked here; a full request still gets an answer.
fn fallback(
    norm: &NormalizedRequest<'_>,
    solver_status: &str,
    reason: &str,
    start: Instant,
) -> OptimizeResponse {
    warn!(%reason, "no usable solver assignment, degrading to greedy fallback");

    let mut loads: Vec<u32> = norm.channels.iter().map(|c| c.current_load).collect();
    let mut assignments = HashMap::with_capacity(norm.order_count());
    for order in norm.orders {
        let slot = loads
            .iter()
            .zip(norm.channels)
            .position(|(&load, channel)| load < channel.capacity)
            // Every channel is full: overload the first one rather than
            // drop the order.
            .unwrap_or(0);
        loads[slot] += 1;
        assignments.insert(order.id.clone(), norm.channels[slot].id.clone());
    }

    let mut metadata = base_metadata(norm, solver_status);
    metadata.insert(
        "fallback_reason".to_string(),
        serde_json::Value::String(reason.to_string()),
    );

    OptimizeResponse {
        assignments,
        total_score: 0.0,
        solve_time_ms: start.elapsed().as_millis() as u64,
        status: SolveStatus::Fallback,
        metadata,
    }
}

fn base_metadata(
    norm: &NormalizedRequest<'_>,
    solver_status: &str,
) -> HashMap<String, serde_json::Value> {
    let mut metadata = HashMap::new();
    metadata.insert(
        "solver_status".to_string(),
        serde_json::Value::String(solver_status.to_string()),
    );
    metadata.insert("order_count".to_string(), norm.order_count().into());
    metadata.insert("channel_count".to_string(), norm.channel_count().into());
    metadata
}
