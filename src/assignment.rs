use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::branch_and_bound;
use crate::builder::Instance;
use crate::config::{Algorithm, EngineConfig};
use crate::error::{AllocError, Result};
use crate::greedy;
use crate::knapsack;
use crate::metrics::{self, RunMetrics};
use crate::model::{Doctor, DoctorId, HospitalId, Patient, PatientId};

/// Owns the three collections for the length of a session and runs the
/// allocators against them one at a time.
///
/// Every run starts from a full reset, so results from different
/// algorithms are independent and comparable.
pub struct Session {
    instance: Instance,
    config: EngineConfig,
    results: Vec<RunMetrics>,
}

impl Session {
    pub fn new(instance: Instance, config: EngineConfig) -> Result<Self> {
        instance.validate()?;
        let mut session = Self {
            instance,
            config,
            results: Vec::new(),
        };
        session.reset();
        Ok(session)
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn into_instance(self) -> Instance {
        self.instance
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn results(&self) -> &[RunMetrics] {
        &self.results
    }

    /// Put every patient, hospital and doctor back to unassigned.
    pub fn reset(&mut self) {
        for patient in &mut self.instance.patients {
            patient.reset();
        }
        for hospital in &mut self.instance.hospitals {
            hospital.reset();
        }
        for doctor in &mut self.instance.doctors {
            doctor.current_patients = 0;
        }
    }

    /// Reset, run one allocator, and record its metrics.
    pub fn run(&mut self, algorithm: Algorithm) -> &RunMetrics {
        debug!(%algorithm, "resetting before run");
        self.reset();

        let started = Instant::now();
        let (assignments, search_stats) = match algorithm {
            Algorithm::Greedy => (greedy::allocate(&mut self.instance), None),
            Algorithm::Knapsack => (knapsack::allocate(&mut self.instance), None),
            Algorithm::BranchBound => {
                let (assignments, stats) =
                    branch_and_bound::allocate(&mut self.instance, &self.config.branch_and_bound);
                (assignments, Some(stats))
            }
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.check_capacities();

        let run = metrics::aggregate(algorithm, &self.instance, assignments, elapsed_ms, search_stats);
        info!(
            %algorithm,
            assigned = run.patients_assigned,
            total = run.total_patients,
            avg_distance_km = run.avg_distance_km,
            efficiency = run.efficiency_score,
            elapsed_ms,
            "allocation run complete"
        );
        self.results.push(run);
        &self.results[self.results.len() - 1]
    }

    /// Run every configured algorithm in turn, replacing earlier results.
    /// The collections are left in the state of the last run.
    pub fn run_selected(&mut self) -> &[RunMetrics] {
        self.results.clear();
        let pacing = Duration::from_millis(self.config.pacing_ms);
        for (i, algorithm) in self.config.algorithm.algorithms().into_iter().enumerate() {
            if i > 0 && !pacing.is_zero() {
                thread::sleep(pacing);
            }
            self.run(algorithm);
        }
        &self.results
    }

    /// Give the patient the best free doctor of their specialization:
    /// highest experience, discounted by current load. A doctor the patient
    /// already had is released first.
    pub fn allocate_doctor(&mut self, patient_id: PatientId) -> Result<Option<DoctorId>> {
        let patient_idx = self
            .instance
            .patient_index(patient_id)
            .ok_or(AllocError::UnknownPatient(patient_id))?;
        let Instance {
            patients, doctors, ..
        } = &mut self.instance;
        let patient = &mut patients[patient_idx];

        if let Some(previous) = patient.assigned_doctor.take() {
            if let Some(doctor) = doctors.iter_mut().find(|d| d.id == previous) {
                doctor.release_patient();
            }
        }

        let mut best: Option<&mut Doctor> = None;
        for doctor in doctors.iter_mut() {
            if doctor.specialization != patient.required_specialization || !doctor.has_room() {
                continue;
            }
            let better = match &best {
                Some(current) => doctor.allocation_score() > current.allocation_score(),
                None => true,
            };
            if better {
                best = Some(doctor);
            }
        }

        let Some(doctor) = best else {
            debug!(patient = patient_id, "no doctor available");
            return Ok(None);
        };
        doctor.take_patient();
        patient.assigned_doctor = Some(doctor.id);
        Ok(Some(doctor.id))
    }

    /// Patients currently assigned to a hospital, in collection order.
    pub fn patients_at(&self, hospital_id: HospitalId) -> Vec<&Patient> {
        self.instance
            .patients
            .iter()
            .filter(|p| p.assigned_hospital == Some(hospital_id))
            .collect()
    }

    pub fn doctors_at(&self, hospital_id: HospitalId) -> Vec<&Doctor> {
        self.instance
            .doctors
            .iter()
            .filter(|d| d.hospital_id == hospital_id)
            .collect()
    }

    fn check_capacities(&self) {
        for hospital in &self.instance.hospitals {
            assert!(
                hospital.current_patients <= hospital.capacity,
                "hospital {} over capacity after allocation",
                hospital.id
            );
        }
        for doctor in &self.instance.doctors {
            assert!(
                doctor.current_patients <= doctor.max_patients,
                "doctor {} over capacity after allocation",
                doctor.id
            );
        }
    }
}
