//! Per-hospital 0/1 knapsack over urgency value.
//!
//! Patients are split by required specialization. Within a specialization
//! each hospital, in listed order, picks from the patients still unassigned
//! the subset that maximizes total urgency weight under its capacity, with
//! the smaller total travel distance winning ties. Beds and doctors are not
//! handed out here.

use std::cmp::Ordering;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::builder::Instance;
use crate::cost::{distance, urgency_weight};
use crate::model::{AssignmentRecord, Hospital, Location, Patient, Specialization};

/// A patient as the dp sees it: one bed unit, `value` urgency, `distance` km.
#[derive(Debug, Clone, Copy)]
struct Item {
    patient_idx: usize,
    value: u32,
    distance: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    value: u32,
    distance: f64,
}

pub fn allocate(instance: &mut Instance) -> Vec<AssignmentRecord> {
    let Instance {
        hospitals,
        patients,
        ..
    } = instance;

    let mut assignments = Vec::new();

    let specializations: Vec<Specialization> = patients
        .iter()
        .map(|p| p.required_specialization)
        .unique()
        .collect();

    for specialization in specializations {
        let hospital_indices: Vec<usize> = hospitals
            .iter()
            .positions(|h| h.specialization == specialization)
            .collect();
        if hospital_indices.is_empty() {
            debug!(%specialization, "no hospital offers this specialization");
            continue;
        }

        let locations: Vec<Location> = hospital_indices
            .iter()
            .map(|&idx| hospitals[idx].location)
            .collect();
        let mut group: Vec<usize> = patients
            .iter()
            .positions(|p| p.required_specialization == specialization)
            .collect();
        group.sort_by(|&a, &b| process_order(&patients[a], &patients[b], &locations));

        for &hospital_idx in &hospital_indices {
            let hospital = &mut hospitals[hospital_idx];
            let items: Vec<Item> = group
                .iter()
                .filter(|&&idx| !patients[idx].is_assigned())
                .map(|&idx| Item {
                    patient_idx: idx,
                    value: urgency_weight(patients[idx].urgency),
                    distance: distance(patients[idx].location, hospital.location),
                })
                .collect();
            if items.is_empty() {
                continue;
            }

            let capacity = hospital.remaining_capacity() as usize;
            let picked = best_selection(&items, capacity);
            assert!(
                picked.len() <= capacity,
                "knapsack picked {} patients for {} free beds",
                picked.len(),
                capacity
            );
            debug!(
                hospital = hospital.id,
                %specialization,
                candidates = items.len(),
                capacity,
                picked = picked.len(),
                "knapsack selection"
            );

            for item in picked.iter().map(|&i| items[i]) {
                admit(hospital, &mut patients[item.patient_idx], item.distance, &mut assignments);
            }
        }
    }

    assignments
}

/// Urgency descending, then distance to the nearest hospital of the group.
fn process_order(a: &Patient, b: &Patient, locations: &[Location]) -> Ordering {
    urgency_weight(b.urgency)
        .cmp(&urgency_weight(a.urgency))
        .then_with(|| nearest(a, locations).total_cmp(&nearest(b, locations)))
}

fn nearest(patient: &Patient, locations: &[Location]) -> f64 {
    locations
        .iter()
        .map(|&loc| distance(patient.location, loc))
        .fold(f64::INFINITY, f64::min)
}

fn admit(
    hospital: &mut Hospital,
    patient: &mut Patient,
    distance: f64,
    assignments: &mut Vec<AssignmentRecord>,
) {
    hospital.admit();
    patient.assigned_hospital = Some(hospital.id);
    patient.travel_distance = distance;
    trace!(patient = patient.id, hospital = hospital.id, distance, "knapsack assignment");
    assignments.push(AssignmentRecord {
        patient_id: patient.id,
        hospital_id: hospital.id,
        distance,
        bed_number: None,
        doctor_id: None,
    });
}

/// Solve the 0/1 knapsack where every item weighs one unit.
///
/// `dp[w]` is the best (value, distance) using at most `w` units. The result
/// is read from the top slot and returned as item positions, ascending.
fn best_selection(items: &[Item], capacity: usize) -> Vec<usize> {
    if capacity == 0 {
        return Vec::new();
    }

    let mut dp = vec![Slot::default(); capacity + 1];
    // take[i][w]: item i improved dp[w] when it was considered
    let mut take = vec![vec![false; capacity + 1]; items.len()];

    for (i, item) in items.iter().enumerate() {
        for w in (1..=capacity).rev() {
            let value = dp[w - 1].value + item.value;
            let distance = dp[w - 1].distance + item.distance;
            if value > dp[w].value || (value == dp[w].value && distance < dp[w].distance) {
                dp[w] = Slot { value, distance };
                take[i][w] = true;
            }
        }
    }

    let mut picked = Vec::new();
    let mut w = capacity;
    for i in (0..items.len()).rev() {
        if w == 0 {
            break;
        }
        if take[i][w] {
            picked.push(i);
            w -= 1;
        }
    }
    picked.reverse();
    picked
}
