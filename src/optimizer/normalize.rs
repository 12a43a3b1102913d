//! Request Normalization
//!
//! Canonical integer-indexed view of a request, with the precomputed
//! order-by-channel matrices the model builder and fallback consume.

use rayon::prelude::*;

use crate::geo;
use crate::model::{Channel, OptimizeRequest, Order, Weights};

/// Scale applied to the weighted score before it reaches the solver, so the
/// objective stays integral.
pub const SCORE_SCALE: f64 = 100.0;

/// Normalized request: borrowed orders and channels plus derived pairwise
/// quantities, all indexed `[order][channel]`.
pub struct NormalizedRequest<'a> {
    pub orders: &'a [Order],
    pub channels: &'a [Channel],
    pub weights: Weights,
    pub timeout_seconds: f64,
    /// Route distance in kilometres.
    pub dist: Vec<Vec<f64>>,
    /// Estimated delivery time in minutes.
    pub eta: Vec<Vec<f64>>,
    /// Integer-scaled assignment cost.
    pub score: Vec<Vec<i64>>,
    /// Reachability and deadline both satisfied.
    pub feasible: Vec<Vec<bool>>,
}

struct PairRow {
    dist: Vec<f64>,
    eta: Vec<f64>,
    score: Vec<i64>,
    feasible: Vec<bool>,
}

impl<'a> NormalizedRequest<'a> {
    /// Materialize the derived matrices for a validated request. Rows are
    /// independent, so they are computed in parallel.
    pub fn build(request: &'a OptimizeRequest) -> Self {
        let weights = request.weights;

        let rows: Vec<PairRow> = request
            .orders
            .par_iter()
            .map(|order| {
                let count = request.channels.len();
                let mut row = PairRow {
                    dist: Vec::with_capacity(count),
                    eta: Vec::with_capacity(count),
                    score: Vec::with_capacity(count),
                    feasible: Vec::with_capacity(count),
                };

                for channel in &request.channels {
                    let dist = geo::route_distance_km(
                        &channel.location,
                        &order.pickup_location,
                        &order.delivery_location,
                    );
                    let eta = geo::delivery_eta_minutes(channel.prep_time_minutes, dist);
                    row.score.push(assignment_score(order, channel, eta, &weights));
                    row.feasible.push(
                        dist <= channel.max_distance && eta <= f64::from(order.max_delivery_time),
                    );
                    row.dist.push(dist);
                    row.eta.push(eta);
                }

                row
            })
            .collect();

        let mut dist = Vec::with_capacity(rows.len());
        let mut eta = Vec::with_capacity(rows.len());
        let mut score = Vec::with_capacity(rows.len());
        let mut feasible = Vec::with_capacity(rows.len());
        for row in rows {
            dist.push(row.dist);
            eta.push(row.eta);
            score.push(row.score);
            feasible.push(row.feasible);
        }

        NormalizedRequest {
            orders: &request.orders,
            channels: &request.channels,
            weights,
            timeout_seconds: request.timeout_seconds,
            dist,
            eta,
            score,
            feasible,
        }
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Integer-scaled weighted cost of assigning `order` to `channel`.
///
/// The priority factor `(11 - priority) / 10` is kept exactly as the
/// historical service computes it: priority 1 keeps its full cost while
/// priority 10 shrinks to a tenth, so higher-numbered orders are cheaper
/// to place anywhere.
pub fn assignment_score(order: &Order, channel: &Channel, eta_minutes: f64, weights: &Weights) -> i64 {
    let quality_penalty = f64::from(100u8.saturating_sub(channel.quality_score));
    let raw = weights.delivery_time * eta_minutes
        + weights.cost * channel.cost_per_order
        + weights.quality * quality_penalty;
    let priority_factor = f64::from(11 - i32::from(order.priority)) / 10.0;

    (raw * priority_factor * SCORE_SCALE).round() as i64
}
