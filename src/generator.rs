//! Random sample instances for demos and tests.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::builder::Instance;
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::model::{Doctor, Hospital, Location, Patient, Specialization, Urgency};

const HOSPITAL_NAMES: [&str; 20] = [
    "Apollo Hospitals",
    "Fortis Healthcare",
    "Max Healthcare",
    "Manipal Hospitals",
    "Narayana Health",
    "AIIMS Delhi",
    "Tata Memorial Hospital",
    "KIMS Hospital",
    "City General Hospital",
    "Metropolitan Medical Center",
    "Regional Health Center",
    "University Hospital",
    "Community Medical Center",
    "Central Hospital",
    "St. Mary's Hospital",
    "Memorial Medical Center",
    "Valley General Hospital",
    "Riverside Medical Center",
    "Sunset Hospital",
    "Oakwood Medical Center",
];

const DOCTOR_NAMES: [&str; 15] = [
    "Dr. Nikhitha",
    "Dr. Deekshitha",
    "Dr. Srinivas",
    "Dr. Dhana",
    "Dr. Prince",
    "Dr. Vijay",
    "Dr. Prasad",
    "Dr. Chandra",
    "Dr. Lokesh",
    "Dr. Nikhitha Reddy",
    "Dr. Srinivas Kumar",
    "Dr. Dhana Raj",
    "Dr. Prince Singh",
    "Dr. Prasad Rao",
    "Dr. Chandra Sekhar",
];

const PATIENT_NAMES: [&str; 14] = [
    "Ajay",
    "Teja",
    "Dileep",
    "Hari Krishna",
    "Rithwik",
    "Madhu",
    "Prudhvi",
    "Ajay Kumar",
    "Teja Reddy",
    "Dileep Sharma",
    "Hari Krishna Singh",
    "Rithwik Patel",
    "Madhu Gupta",
    "Prudhvi Verma",
];

/// Hospital capacities jitter by up to this much below and one less above.
const CAPACITY_JITTER: i64 = 5;

pub fn generate(config: &GeneratorConfig) -> Result<Instance> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mix = config.urgency_mix.normalized()?;

    let mut hospitals = Vec::with_capacity(config.hospital_count as usize);
    for i in 0..config.hospital_count {
        let specialization = Specialization::ALL[i as usize % Specialization::ALL.len()];
        let name = match HOSPITAL_NAMES.get(i as usize) {
            Some(name) => (*name).to_string(),
            None => fallback_hospital_name(i),
        };
        let jitter = rng.gen_range(-CAPACITY_JITTER..CAPACITY_JITTER);
        let capacity = (i64::from(config.hospital_capacity) + jitter).max(1) as u32;
        hospitals.push(Hospital::new(i, name, capacity, specialization, random_location(&mut rng)));
    }

    let mut doctors = Vec::new();
    let mut doctor_id = 0;
    for hospital in &mut hospitals {
        for _ in 0..config.doctors_per_hospital {
            let name = DOCTOR_NAMES.choose(&mut rng).copied().unwrap_or("Dr. Unknown");
            doctors.push(Doctor {
                id: doctor_id,
                name: name.to_string(),
                specialization: hospital.specialization,
                hospital_id: hospital.id,
                experience: rng.gen_range(1..=20),
                current_patients: 0,
                max_patients: rng.gen_range(3..=7),
            });
            hospital.doctors.push(doctor_id);
            doctor_id += 1;
        }
    }

    let mut patients = Vec::with_capacity(config.patient_count as usize);
    for i in 0..config.patient_count {
        let specialization = *Specialization::ALL
            .choose(&mut rng)
            .unwrap_or(&Specialization::Emergency);
        let ailment = specialization
            .ailments()
            .choose(&mut rng)
            .copied()
            .unwrap_or("General Checkup");
        let roll = rng.gen::<f64>() * 100.0;
        let urgency = if roll < f64::from(mix.critical) {
            Urgency::Critical
        } else if roll < f64::from(mix.critical + mix.urgent) {
            Urgency::Urgent
        } else {
            Urgency::Stable
        };
        let name = PATIENT_NAMES.choose(&mut rng).copied().unwrap_or("Anonymous");
        patients.push(Patient::new(
            i,
            name,
            ailment,
            specialization,
            urgency,
            random_location(&mut rng),
        ));
    }

    debug!(
        hospitals = hospitals.len(),
        doctors = doctors.len(),
        patients = patients.len(),
        "generated sample instance"
    );

    Ok(Instance::new(hospitals, patients, doctors))
}

/// Hospital A, Hospital B, ... then Hospital 26, Hospital 27, ...
fn fallback_hospital_name(index: u32) -> String {
    match char::from_u32(u32::from(b'A') + index) {
        Some(letter) if letter.is_ascii_uppercase() => format!("Hospital {letter}"),
        _ => format!("Hospital {index}"),
    }
}

fn random_location(rng: &mut StdRng) -> Location {
    Location::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UrgencyMix;

    fn seeded(seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            seed: Some(seed),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn check_generate_counts_and_links() {
        let instance = generate(&seeded(7)).unwrap();
        assert_eq!(instance.hospitals.len(), 5);
        assert_eq!(instance.doctors.len(), 15);
        assert_eq!(instance.patients.len(), 20);
        instance.validate().unwrap();

        for (i, hospital) in instance.hospitals.iter().enumerate() {
            assert_eq!(hospital.specialization, Specialization::ALL[i % 5]);
            assert!((5..=14).contains(&hospital.capacity));
            assert_eq!(hospital.available_beds.len() as u32, hospital.capacity);
            assert_eq!(hospital.doctors.len(), 3);
        }
        for doctor in &instance.doctors {
            assert!((3..=7).contains(&doctor.max_patients));
            assert!((1..=20).contains(&doctor.experience));
        }
        for patient in &instance.patients {
            assert!(patient
                .required_specialization
                .ailments()
                .contains(&patient.ailment.as_str()));
            assert!(!patient.is_assigned());
        }
    }

    #[test]
    fn check_seed_is_reproducible() {
        assert_eq!(generate(&seeded(99)).unwrap(), generate(&seeded(99)).unwrap());
    }

    #[test]
    fn check_urgency_mix_extremes() {
        let config = GeneratorConfig {
            urgency_mix: UrgencyMix {
                critical: 100,
                urgent: 0,
                stable: 0,
            },
            ..seeded(3)
        };
        let instance = generate(&config).unwrap();
        assert!(instance.patients.iter().all(|p| p.urgency == Urgency::Critical));
    }

    #[test]
    fn check_small_capacity_is_clamped() {
        let config = GeneratorConfig {
            hospital_capacity: 1,
            hospital_count: 25,
            ..seeded(11)
        };
        let instance = generate(&config).unwrap();
        assert!(instance.hospitals.iter().all(|h| h.capacity >= 1));
        assert_eq!(instance.hospitals[20].name, "Hospital U");
    }
}
