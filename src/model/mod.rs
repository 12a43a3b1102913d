//! Request & Response Model
//!
//! Strongly typed view of the optimization API: orders, channels, objective
//! weights, and the assignment response. String-keyed JSON exists only at
//! this boundary; the engine consumes these records.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Smallest solver budget a request may ask for, in seconds.
pub const MIN_TIMEOUT_SECONDS: f64 = 0.01;
/// Largest solver budget a request may ask for, in seconds.
pub const MAX_TIMEOUT_SECONDS: f64 = 10.0;

const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    fn in_range(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A single pickup-to-delivery task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub pickup_location: GeoPoint,
    pub delivery_location: GeoPoint,
    /// 1..=10, higher numbers are documented as more urgent.
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Hard deadline in minutes from dispatch.
    #[serde(default = "default_max_delivery_time")]
    pub max_delivery_time: u32,
    /// Parcel weight in kilograms.
    #[serde(default = "default_order_weight")]
    pub weight: f64,
    /// Opaque tags, preserved but never interpreted by the engine.
    #[serde(default)]
    pub special_requirements: Vec<String>,
}

/// A fulfillment channel: kitchen, depot, or vehicle with finite capacity
/// and a home location deliveries originate from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub capacity: u32,
    #[serde(default)]
    pub current_load: u32,
    #[serde(default)]
    pub cost_per_order: f64,
    /// 0..=100, higher is better.
    #[serde(default = "default_quality_score")]
    pub quality_score: u8,
    #[serde(default = "default_prep_time_minutes")]
    pub prep_time_minutes: u32,
    pub location: GeoPoint,
    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: String,
    /// Reachability radius in kilometres.
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
}

impl Channel {
    /// Slots left before the capacity constraint saturates.
    pub fn available_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.current_load)
    }
}

/// Objective weights over delivery time, monetary cost, and quality
/// penalty. Must sum to 1.0 within tolerance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Weights {
    pub delivery_time: f64,
    pub cost: f64,
    pub quality: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            delivery_time: 0.5,
            cost: 0.3,
            quality: 0.2,
        }
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.delivery_time + self.cost + self.quality
    }
}

/// One optimization request: a batch of orders against a set of candidate
/// channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub orders: Vec<Order>,
    pub channels: Vec<Channel>,
    /// Free-form constraint hints, preserved but not interpreted.
    #[serde(default)]
    pub constraints: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub weights: Weights,
    /// Hard wall-clock budget for the solver.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
}

/// Outcome of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Fallback,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "OPTIMAL"),
            SolveStatus::Feasible => write!(f, "FEASIBLE"),
            SolveStatus::Fallback => write!(f, "FALLBACK"),
        }
    }
}

/// The assignment produced for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    /// Order id to channel id, covering every order exactly once.
    pub assignments: HashMap<String, String>,
    pub total_score: f64,
    pub solve_time_ms: u64,
    pub status: SolveStatus,
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_priority() -> u8 {
    1
}

fn default_max_delivery_time() -> u32 {
    60
}

fn default_order_weight() -> f64 {
    1.0
}

fn default_quality_score() -> u8 {
    100
}

fn default_prep_time_minutes() -> u32 {
    30
}

fn default_vehicle_type() -> String {
    "standard".to_string()
}

fn default_max_distance() -> f64 {
    50.0
}

fn default_timeout_seconds() -> f64 {
    0.1
}

/// A request the service refuses to optimize. Surfaced as 422 before the
/// engine runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("orders must not be empty")]
    EmptyOrders,
    #[error("channels must not be empty")]
    EmptyChannels,
    #[error("duplicate order id '{0}'")]
    DuplicateOrderId(String),
    #[error("duplicate channel id '{0}'")]
    DuplicateChannelId(String),
    #[error("order '{id}': {detail}")]
    InvalidOrder { id: String, detail: &'static str },
    #[error("channel '{id}': {detail}")]
    InvalidChannel { id: String, detail: &'static str },
    #[error("weights must be non-negative finite numbers")]
    InvalidWeights,
    #[error("weights must sum to 1.0, got {0:.3}")]
    WeightSum(f64),
    #[error("timeout_seconds must be between {0} and {1}")]
    TimeoutRange(f64, f64),
}

impl OptimizeRequest {
    /// Full request validation. The engine assumes anything that passes
    /// here is well-formed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.orders.is_empty() {
            return Err(ValidationError::EmptyOrders);
        }
        if self.channels.is_empty() {
            return Err(ValidationError::EmptyChannels);
        }

        let mut order_ids = HashSet::new();
        for order in &self.orders {
            validate_order(order)?;
            if !order_ids.insert(order.id.as_str()) {
                return Err(ValidationError::DuplicateOrderId(order.id.clone()));
            }
        }

        let mut channel_ids = HashSet::new();
        for channel in &self.channels {
            validate_channel(channel)?;
            if !channel_ids.insert(channel.id.as_str()) {
                return Err(ValidationError::DuplicateChannelId(channel.id.clone()));
            }
        }

        validate_weights(&self.weights)?;

        if !self.timeout_seconds.is_finite()
            || !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&self.timeout_seconds)
        {
            return Err(ValidationError::TimeoutRange(
                MIN_TIMEOUT_SECONDS,
                MAX_TIMEOUT_SECONDS,
            ));
        }

        Ok(())
    }
}

fn validate_order(order: &Order) -> Result<(), ValidationError> {
    let invalid = |detail| ValidationError::InvalidOrder {
        id: order.id.clone(),
        detail,
    };

    if order.id.is_empty() {
        return Err(invalid("id must not be empty"));
    }
    if !order.pickup_location.in_range() {
        return Err(invalid("pickup_location out of range"));
    }
    if !order.delivery_location.in_range() {
        return Err(invalid("delivery_location out of range"));
    }
    if !(1..=10).contains(&order.priority) {
        return Err(invalid("priority must be between 1 and 10"));
    }
    if order.max_delivery_time == 0 {
        return Err(invalid("max_delivery_time must be positive"));
    }
    if !order.weight.is_finite() || order.weight <= 0.0 {
        return Err(invalid("weight must be positive"));
    }
    Ok(())
}

fn validate_channel(channel: &Channel) -> Result<(), ValidationError> {
    let invalid = |detail| ValidationError::InvalidChannel {
        id: channel.id.clone(),
        detail,
    };

    if channel.id.is_empty() {
        return Err(invalid("id must not be empty"));
    }
    if !channel.location.in_range() {
        return Err(invalid("location out of range"));
    }
    if channel.capacity == 0 {
        return Err(invalid("capacity must be positive"));
    }
    if channel.current_load > channel.capacity {
        return Err(invalid("current_load exceeds capacity"));
    }
    if !channel.cost_per_order.is_finite() || channel.cost_per_order < 0.0 {
        return Err(invalid("cost_per_order must be non-negative"));
    }
    if channel.quality_score > 100 {
        return Err(invalid("quality_score must be at most 100"));
    }
    if channel.prep_time_minutes == 0 {
        return Err(invalid("prep_time_minutes must be positive"));
    }
    if !channel.max_distance.is_finite() || channel.max_distance <= 0.0 {
        return Err(invalid("max_distance must be positive"));
    }
    Ok(())
}

fn validate_weights(weights: &Weights) -> Result<(), ValidationError> {
    let components = [weights.delivery_time, weights.cost, weights.quality];
    if components.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ValidationError::InvalidWeights);
    }

    let sum = weights.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ValidationError::WeightSum(sum));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_request() -> OptimizeRequest {
        serde_json::from_value(json!({
            "orders": [{
                "id": "order_1",
                "pickup_location": {"lat": 40.7128, "lng": -74.0060},
                "delivery_location": {"lat": 40.7589, "lng": -73.9851}
            }],
            "channels": [{
                "id": "channel_1",
                "capacity": 10,
                "location": {"lat": 40.7128, "lng": -74.0060}
            }]
        }))
        .expect("base request parses")
    }

    #[test]
    fn test_order_defaults() {
        let request = base_request();
        let order = &request.orders[0];
        assert_eq!(order.priority, 1);
        assert_eq!(order.max_delivery_time, 60);
        assert_eq!(order.weight, 1.0);
        assert!(order.special_requirements.is_empty());
    }

    #[test]
    fn test_channel_defaults() {
        let request = base_request();
        let channel = &request.channels[0];
        assert_eq!(channel.current_load, 0);
        assert_eq!(channel.cost_per_order, 0.0);
        assert_eq!(channel.quality_score, 100);
        assert_eq!(channel.prep_time_minutes, 30);
        assert_eq!(channel.vehicle_type, "standard");
        assert_eq!(channel.max_distance, 50.0);
    }

    #[test]
    fn test_request_defaults() {
        let request = base_request();
        assert_eq!(request.timeout_seconds, 0.1);
        assert_eq!(request.weights.delivery_time, 0.5);
        assert_eq!(request.weights.cost, 0.3);
        assert_eq!(request.weights.quality, 0.2);
        assert!(request.constraints.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(SolveStatus::Optimal).unwrap(),
            json!("OPTIMAL")
        );
        assert_eq!(
            serde_json::to_value(SolveStatus::Fallback).unwrap(),
            json!("FALLBACK")
        );
    }

    #[test]
    fn test_rejects_empty_orders() {
        let mut request = base_request();
        request.orders.clear();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::EmptyOrders)
        ));
    }

    #[test]
    fn test_rejects_empty_channels() {
        let mut request = base_request();
        request.channels.clear();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::EmptyChannels)
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut request = base_request();
        request.orders.push(request.orders[0].clone());
        assert!(matches!(
            request.validate(),
            Err(ValidationError::DuplicateOrderId(_))
        ));

        let mut request = base_request();
        request.channels.push(request.channels[0].clone());
        assert!(matches!(
            request.validate(),
            Err(ValidationError::DuplicateChannelId(_))
        ));
    }

    #[test]
    fn test_rejects_weight_sum_violation() {
        let mut request = base_request();
        request.weights = Weights {
            delivery_time: 0.5,
            cost: 0.3,
            quality: 0.1,
        };
        assert!(matches!(
            request.validate(),
            Err(ValidationError::WeightSum(_))
        ));
    }

    #[test]
    fn test_accepts_weight_sum_within_tolerance() {
        let mut request = base_request();
        request.weights = Weights {
            delivery_time: 0.5,
            cost: 0.3,
            quality: 0.195,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let mut request = base_request();
        request.orders[0].pickup_location.lat = 91.0;
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidOrder { .. })
        ));

        let mut request = base_request();
        request.channels[0].location.lng = f64::NAN;
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidChannel { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_priority() {
        let mut request = base_request();
        request.orders[0].priority = 11;
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn test_rejects_overloaded_channel() {
        let mut request = base_request();
        request.channels[0].capacity = 2;
        request.channels[0].current_load = 3;
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidChannel { .. })
        ));
    }

    #[test]
    fn test_rejects_timeout_out_of_bounds() {
        let mut request = base_request();
        request.timeout_seconds = 0.001;
        assert!(matches!(
            request.validate(),
            Err(ValidationError::TimeoutRange(..))
        ));

        request.timeout_seconds = 30.0;
        assert!(matches!(
            request.validate(),
            Err(ValidationError::TimeoutRange(..))
        ));
    }

    #[test]
    fn test_available_capacity_saturates() {
        let request = base_request();
        let mut channel = request.channels[0].clone();
        channel.capacity = 5;
        channel.current_load = 2;
        assert_eq!(channel.available_capacity(), 3);
        channel.current_load = 5;
        assert_eq!(channel.available_capacity(), 0);
    }
}
