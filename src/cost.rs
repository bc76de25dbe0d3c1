//! Distance and urgency model shared by every allocator.

use std::cmp::Ordering;

use crate::model::{Location, Patient, Urgency};

/// Grid units are scaled by this factor to get kilometres.
pub const DISTANCE_SCALE: f64 = 10.0;

/// Reward per urgency weight unit in the branch-and-bound cost.
pub const URGENCY_REWARD: f64 = 10.0;

/// Scaled Euclidean distance between two grid locations.
pub fn distance(a: Location, b: Location) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt() * DISTANCE_SCALE
}

/// critical -> 3, urgent -> 2, stable -> 1
pub fn urgency_weight(urgency: Urgency) -> u32 {
    match urgency {
        Urgency::Critical => 3,
        Urgency::Urgent => 2,
        Urgency::Stable => 1,
    }
}

/// Cost of sending a patient of the given urgency over `distance`.
/// Urgency is a reward, so the result can be negative.
pub fn assignment_cost(distance: f64, urgency: Urgency) -> f64 {
    distance - f64::from(urgency_weight(urgency)) * URGENCY_REWARD
}

/// Orders by urgency, most urgent first.
pub fn by_urgency_desc(a: &Patient, b: &Patient) -> Ordering {
    urgency_weight(b.urgency).cmp(&urgency_weight(a.urgency))
}

/// Patient indices sorted most urgent first. The sort is stable, so equally
/// urgent patients keep their collection order.
pub fn urgency_order(patients: &[Patient]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..patients.len()).collect();
    order.sort_by(|&a, &b| by_urgency_desc(&patients[a], &patients[b]));
    order
}
