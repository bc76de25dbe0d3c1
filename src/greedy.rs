//! Nearest compatible hospital, most urgent patients first.

use std::collections::HashMap;

use tracing::trace;

use crate::builder::Instance;
use crate::cost::{distance, urgency_order};
use crate::model::{AssignmentRecord, Doctor, DoctorId, Hospital};

/// Assign each patient, most urgent first, to the nearest hospital with the
/// right specialization and room left. Also hands out the lowest free bed
/// and the first doctor with spare capacity.
///
/// Distance ties go to the hospital listed first. A hospital that fills up
/// is dropped from the candidate pool; there is no backtracking.
pub fn allocate(instance: &mut Instance) -> Vec<AssignmentRecord> {
    let Instance {
        hospitals,
        patients,
        doctors,
    } = instance;

    let doctor_positions: HashMap<DoctorId, usize> =
        doctors.iter().enumerate().map(|(idx, d)| (d.id, idx)).collect();

    let mut open_hospitals: Vec<usize> = (0..hospitals.len()).collect();
    let mut assignments = Vec::new();

    for patient_idx in urgency_order(patients) {
        let patient = &mut patients[patient_idx];

        let mut best: Option<(usize, f64)> = None;
        for (slot, &hospital_idx) in open_hospitals.iter().enumerate() {
            let hospital = &hospitals[hospital_idx];
            if !hospital.has_room() || hospital.specialization != patient.required_specialization {
                continue;
            }
            let d = distance(patient.location, hospital.location);
            if best.map_or(true, |(_, best_distance)| d < best_distance) {
                best = Some((slot, d));
            }
        }

        let Some((slot, best_distance)) = best else {
            trace!(patient = patient.id, "no compatible hospital with room");
            continue;
        };

        let hospital = &mut hospitals[open_hospitals[slot]];
        hospital.admit();
        patient.assigned_hospital = Some(hospital.id);
        patient.travel_distance = best_distance;
        patient.bed_number = hospital.take_bed();
        patient.assigned_doctor = take_first_free_doctor(hospital, doctors, &doctor_positions);

        trace!(
            patient = patient.id,
            hospital = hospital.id,
            distance = best_distance,
            bed = ?patient.bed_number,
            doctor = ?patient.assigned_doctor,
            "greedy assignment"
        );

        assignments.push(AssignmentRecord {
            patient_id: patient.id,
            hospital_id: hospital.id,
            distance: best_distance,
            bed_number: patient.bed_number,
            doctor_id: patient.assigned_doctor,
        });

        if !hospital.has_room() {
            open_hospitals.remove(slot);
        }
    }

    assignments
}

fn take_first_free_doctor(
    hospital: &Hospital,
    doctors: &mut [Doctor],
    positions: &HashMap<DoctorId, usize>,
) -> Option<DoctorId> {
    let idx = hospital
        .doctors
        .iter()
        .filter_map(|id| positions.get(id).copied())
        .find(|&idx| doctors[idx].has_room())?;
    doctors[idx].take_patient();
    Some(doctors[idx].id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Patient, Specialization, Urgency};

    fn cardiology_patient(id: u32, urgency: Urgency, x: f64, y: f64) -> Patient {
        Patient::new(id, "Prudhvi", "Angina", Specialization::Cardiology, urgency, Location::new(x, y))
    }

    fn doctor(id: u32, hospital_id: u32, max_patients: u32) -> Doctor {
        Doctor {
            id,
            name: "Dr. Lokesh".into(),
            specialization: Specialization::Cardiology,
            hospital_id,
            experience: 5,
            current_patients: 0,
            max_patients,
        }
    }

    #[test]
    fn check_single_hospital_scenario() {
        let hospital = Hospital::new(0, "Apollo Hospitals", 2, Specialization::Cardiology, Location::new(0.0, 0.0));
        let patients = vec![
            cardiology_patient(0, Urgency::Critical, 1.0, 0.0),
            cardiology_patient(1, Urgency::Stable, 2.0, 0.0),
            cardiology_patient(2, Urgency::Urgent, 0.0, 1.0),
        ];
        let mut instance = Instance::new(vec![hospital], patients, vec![]);

        let assignments = allocate(&mut instance);

        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].patient_id, 0);
        assert_eq!(assignments[1].patient_id, 2);
        assert!((assignments[0].distance - 10.0).abs() < 1e-9);
        assert!((assignments[1].distance - 10.0).abs() < 1e-9);
        assert_eq!(instance.patients[0].bed_number, Some(1));
        assert_eq!(instance.patients[2].bed_number, Some(2));
        assert!(!instance.patients[1].is_assigned());
        assert_eq!(instance.hospitals[0].current_patients, 2);
        assert!((instance.hospitals[0].utilization - 100.0).abs() < 1e-9);
    }

    #[test]
    fn check_nearest_hospital_wins_and_ties_go_first() {
        let hospitals = vec![
            Hospital::new(0, "Far", 5, Specialization::Cardiology, Location::new(90.0, 90.0)),
            Hospital::new(1, "Left", 5, Specialization::Cardiology, Location::new(0.0, 10.0)),
            Hospital::new(2, "Right", 5, Specialization::Cardiology, Location::new(20.0, 10.0)),
        ];
        let patients = vec![cardiology_patient(0, Urgency::Stable, 10.0, 10.0)];
        let mut instance = Instance::new(hospitals, patients, vec![]);

        let assignments = allocate(&mut instance);
        assert_eq!(assignments[0].hospital_id, 1);
    }

    #[test]
    fn check_full_hospital_spills_to_next_nearest() {
        let hospitals = vec![
            Hospital::new(0, "Near", 1, Specialization::Cardiology, Location::new(0.0, 0.0)),
            Hospital::new(1, "Far", 1, Specialization::Cardiology, Location::new(50.0, 0.0)),
        ];
        let patients = vec![
            cardiology_patient(0, Urgency::Stable, 1.0, 0.0),
            cardiology_patient(1, Urgency::Critical, 2.0, 0.0),
        ];
        let mut instance = Instance::new(hospitals, patients, vec![]);

        allocate(&mut instance);

        assert_eq!(instance.patients[1].assigned_hospital, Some(0));
        assert_eq!(instance.patients[0].assigned_hospital, Some(1));
    }

    #[test]
    fn check_doctors_fill_in_list_order() {
        let mut hospital = Hospital::new(0, "Apollo Hospitals", 5, Specialization::Cardiology, Location::new(0.0, 0.0));
        hospital.doctors = vec![7, 3];
        let patients = (0..4)
            .map(|id| cardiology_patient(id, Urgency::Urgent, 1.0, 1.0))
            .collect();
        let doctors = vec![doctor(3, 0, 1), doctor(7, 0, 2)];
        let mut instance = Instance::new(vec![hospital], patients, doctors);

        allocate(&mut instance);

        let assigned: Vec<Option<u32>> = instance.patients.iter().map(|p| p.assigned_doctor).collect();
        assert_eq!(assigned, vec![Some(7), Some(7), Some(3), None]);
        assert_eq!(instance.doctors[0].current_patients, 1);
        assert_eq!(instance.doctors[1].current_patients, 2);
        // capacity counts patients, not doctors
        assert!(instance.patients[3].is_assigned());
    }

    #[test]
    fn check_exhausted_bed_pool_still_assigns() {
        let mut hospital = Hospital::new(0, "Apollo Hospitals", 3, Specialization::Cardiology, Location::new(0.0, 0.0));
        hospital.available_beds.clear();
        let patients = vec![cardiology_patient(0, Urgency::Critical, 1.0, 0.0)];
        let mut instance = Instance::new(vec![hospital], patients, vec![]);

        let assignments = allocate(&mut instance);

        assert_eq!(assignments.len(), 1);
        assert_eq!(instance.patients[0].bed_number, None);
        assert_eq!(instance.hospitals[0].current_patients, 1);
    }

    #[test]
    fn check_unmatched_specialization_stays_unassigned() {
        let hospital = Hospital::new(0, "Apollo Hospitals", 3, Specialization::Cardiology, Location::new(0.0, 0.0));
        let patient = Patient::new(0, "Madhu", "Stroke", Specialization::Neurology, Urgency::Critical, Location::new(0.0, 0.0));
        let mut instance = Instance::new(vec![hospital], vec![patient], vec![]);

        assert!(allocate(&mut instance).is_empty());
        assert!(!instance.patients[0].is_assigned());
        assert_eq!(instance.hospitals[0].current_patients, 0);
    }
}
