use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AllocError, Result};
use crate::model::{Doctor, Hospital, Patient};

/// Grid bounds every location must fall within.
const GRID_MIN: f64 = 0.0;
const GRID_MAX: f64 = 100.0;

/// The three collections an allocation session works on.
///
/// Collection order is significant: allocators break ties by it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Instance {
    pub hospitals: Vec<Hospital>,
    pub patients: Vec<Patient>,
    pub doctors: Vec<Doctor>,
}

impl Instance {
    pub fn new(hospitals: Vec<Hospital>, patients: Vec<Patient>, doctors: Vec<Doctor>) -> Self {
        let mut instance = Self {
            hospitals,
            patients,
            doctors,
        };
        instance.link_doctors();
        instance
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let mut instance: Instance = serde_json::from_str(data)?;
        instance.link_doctors();
        instance.fill_empty_bed_pools();
        Ok(instance)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| AllocError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| AllocError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn hospital_index(&self, id: u32) -> Option<usize> {
        self.hospitals.iter().position(|h| h.id == id)
    }

    pub fn patient_index(&self, id: u32) -> Option<usize> {
        self.patients.iter().position(|p| p.id == id)
    }

    /// Append every doctor to its hospital's roster unless already listed.
    /// Hand-written instances often only carry `hospitalId` on the doctor.
    fn link_doctors(&mut self) {
        for doctor in &self.doctors {
            if let Some(idx) = self.hospital_index(doctor.hospital_id) {
                let hospital = &mut self.hospitals[idx];
                if !hospital.doctors.contains(&doctor.id) {
                    hospital.doctors.push(doctor.id);
                }
            }
        }
    }

    /// Instances written without bed bookkeeping start with every bed free.
    fn fill_empty_bed_pools(&mut self) {
        for hospital in &mut self.hospitals {
            if hospital.available_beds.is_empty() && hospital.occupied_beds.is_empty() {
                hospital.available_beds = (1..=hospital.capacity).collect();
            }
        }
    }

    /// Check the input contract the allocators rely on.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(AllocError::InvalidInstance(msg));

        let mut seen = HashSet::new();
        for hospital in &self.hospitals {
            if !seen.insert(hospital.id) {
                return invalid(format!("duplicate hospital id {}", hospital.id));
            }
            if hospital.capacity == 0 {
                return invalid(format!("hospital {} has zero capacity", hospital.id));
            }
            if hospital.current_patients > hospital.capacity {
                return invalid(format!(
                    "hospital {} holds {} patients but has capacity {}",
                    hospital.id, hospital.current_patients, hospital.capacity
                ));
            }
            if !on_grid(hospital.location.x, hospital.location.y) {
                return invalid(format!("hospital {} lies outside the grid", hospital.id));
            }
        }

        seen.clear();
        for patient in &self.patients {
            if !seen.insert(patient.id) {
                return invalid(format!("duplicate patient id {}", patient.id));
            }
            if !on_grid(patient.location.x, patient.location.y) {
                return invalid(format!("patient {} lies outside the grid", patient.id));
            }
        }

        seen.clear();
        for doctor in &self.doctors {
            if !seen.insert(doctor.id) {
                return invalid(format!("duplicate doctor id {}", doctor.id));
            }
            if doctor.max_patients == 0 {
                return invalid(format!("doctor {} accepts no patients", doctor.id));
            }
            let Some(hospital) = self
                .hospital_index(doctor.hospital_id)
                .map(|idx| &self.hospitals[idx])
            else {
                return invalid(format!(
                    "doctor {} works at unknown hospital {}",
                    doctor.id, doctor.hospital_id
                ));
            };
            if hospital.specialization != doctor.specialization {
                return invalid(format!(
                    "doctor {} ({}) does not match hospital {} ({})",
                    doctor.id, doctor.specialization, hospital.id, hospital.specialization
                ));
            }
        }

        for hospital in &self.hospitals {
            for doctor_id in &hospital.doctors {
                match self.doctors.iter().find(|d| d.id == *doctor_id) {
                    Some(doctor) if doctor.hospital_id == hospital.id => {}
                    _ => {
                        return invalid(format!(
                            "hospital {} lists doctor {} it does not employ",
                            hospital.id, doctor_id
                        ))
                    }
                }
            }
        }

        Ok(())
    }
}

fn on_grid(x: f64, y: f64) -> bool {
    (GRID_MIN..=GRID_MAX).contains(&x) && (GRID_MIN..=GRID_MAX).contains(&y)
}
