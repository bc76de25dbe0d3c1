use serde::Serialize;

use crate::branch_and_bound::SearchStats;
use crate::builder::Instance;
use crate::config::Algorithm;
use crate::model::AssignmentRecord;

const ASSIGNMENT_WEIGHT: f64 = 0.4;
const DISTANCE_WEIGHT: f64 = 0.3;
const UTILIZATION_WEIGHT: f64 = 0.3;

/// Average distance (km) at which the distance score bottoms out at zero.
const DISTANCE_HORIZON_KM: f64 = 50.0;

/// Outcome of one allocator run, as handed to display and export.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunMetrics {
    #[serde(serialize_with = "algorithm_name")]
    pub algorithm: Algorithm,
    pub execution_time_ms: f64,
    pub patients_assigned: usize,
    pub total_patients: usize,
    pub avg_distance_km: f64,
    pub utilization_percent: f64,
    pub efficiency_score: u32,
    pub assignments: Vec<AssignmentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_and_bound: Option<SearchStats>,
}

fn algorithm_name<S: serde::Serializer>(algorithm: &Algorithm, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(algorithm.name())
}

/// Aggregate statistics over the instance's current assignment state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub assigned: usize,
    pub total_patients: usize,
    pub avg_distance_km: f64,
    pub utilization_percent: f64,
    pub efficiency_score: u32,
}

/// Degenerate inputs (no patients, no hospitals, nobody assigned) report
/// zero averages instead of NaN.
pub fn summarize(instance: &Instance) -> Summary {
    let total_patients = instance.patients.len();
    let distances: Vec<f64> = instance
        .patients
        .iter()
        .filter(|p| p.is_assigned())
        .map(|p| p.travel_distance)
        .collect();
    let assigned = distances.len();

    let avg_distance_km = mean(&distances);
    let occupancy: Vec<f64> = instance.hospitals.iter().map(|h| h.occupancy_percent()).collect();
    let utilization_percent = mean(&occupancy);

    Summary {
        assigned,
        total_patients,
        avg_distance_km,
        utilization_percent,
        efficiency_score: efficiency_score(assigned, total_patients, avg_distance_km, utilization_percent),
    }
}

pub fn efficiency_score(assigned: usize, total_patients: usize, avg_distance_km: f64, utilization_percent: f64) -> u32 {
    let assignment_rate = if total_patients == 0 {
        0.0
    } else {
        assigned as f64 / total_patients as f64
    };
    let distance_score = (1.0 - avg_distance_km / DISTANCE_HORIZON_KM).max(0.0);
    let utilization_score = utilization_percent / 100.0;

    let blended = ASSIGNMENT_WEIGHT * assignment_rate
        + DISTANCE_WEIGHT * distance_score
        + UTILIZATION_WEIGHT * utilization_score;
    (blended * 100.0).round() as u32
}

pub fn aggregate(
    algorithm: Algorithm,
    instance: &Instance,
    assignments: Vec<AssignmentRecord>,
    execution_time_ms: f64,
    branch_and_bound: Option<SearchStats>,
) -> RunMetrics {
    let summary = summarize(instance);
    RunMetrics {
        algorithm,
        execution_time_ms,
        patients_assigned: summary.assigned,
        total_patients: summary.total_patients,
        avg_distance_km: summary.avg_distance_km,
        utilization_percent: summary.utilization_percent,
        efficiency_score: summary.efficiency_score,
        assignments,
        branch_and_bound,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
