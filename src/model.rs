use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type HospitalId = u32;
pub type PatientId = u32;
pub type DoctorId = u32;

/// Occupancy ratio (in percent) from which a hospital counts as filling up.
const FILLING_THRESHOLD: f64 = 70.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Specialization {
    Cardiology,
    Neurology,
    Orthopedics,
    Emergency,
    Pediatrics,
}

impl Specialization {
    /// All specializations, in the order hospitals are dealt them at generation.
    pub const ALL: [Specialization; 5] = [
        Specialization::Cardiology,
        Specialization::Neurology,
        Specialization::Orthopedics,
        Specialization::Emergency,
        Specialization::Pediatrics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Specialization::Cardiology => "cardiology",
            Specialization::Neurology => "neurology",
            Specialization::Orthopedics => "orthopedics",
            Specialization::Emergency => "emergency",
            Specialization::Pediatrics => "pediatrics",
        }
    }

    /// Equipment a hospital of this specialization is stocked with.
    pub fn equipment(self) -> &'static [&'static str] {
        match self {
            Specialization::Cardiology => &["ECG Machine", "Defibrillator", "Cardiac Monitor"],
            Specialization::Neurology => &["MRI Scanner", "EEG Machine", "Neurological Tools"],
            Specialization::Orthopedics => {
                &["X-Ray Machine", "Surgical Tools", "Rehabilitation Equipment"]
            }
            Specialization::Emergency => &["Trauma Kit", "Ventilator", "Emergency Drugs"],
            Specialization::Pediatrics => {
                &["Pediatric Monitor", "Child-Sized Equipment", "Play Area"]
            }
        }
    }

    pub fn ailments(self) -> &'static [&'static str] {
        match self {
            Specialization::Cardiology => &[
                "Heart Attack",
                "Arrhythmia",
                "Chest Pain",
                "Heart Failure",
                "Angina",
                "Cardiomyopathy",
            ],
            Specialization::Neurology => &[
                "Stroke",
                "Seizure",
                "Headache",
                "Memory Loss",
                "Epilepsy",
                "Migraine",
            ],
            Specialization::Orthopedics => &[
                "Broken Bone",
                "Joint Pain",
                "Spinal Injury",
                "Fracture",
                "Arthritis",
                "Torn Ligament",
            ],
            Specialization::Emergency => &[
                "Trauma",
                "Accident",
                "Poisoning",
                "Severe Bleeding",
                "Burn Injury",
                "Cardiac Arrest",
            ],
            Specialization::Pediatrics => &[
                "Fever",
                "Cough",
                "Growth Issues",
                "Childhood Illness",
                "Asthma",
                "Allergic Reaction",
            ],
        }
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Patient urgency. Declaration order is the priority order: critical first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    Urgent,
    Stable,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Critical => "critical",
            Urgency::Urgent => "urgent",
            Urgency::Stable => "stable",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedStatus {
    Available,
    Filling,
    Full,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    pub capacity: u32,
    pub specialization: Specialization,
    pub location: Location,
    #[serde(default)]
    pub current_patients: u32,
    /// Employed doctors, in the order allocators consider them.
    #[serde(default)]
    pub doctors: Vec<DoctorId>,
    /// Occupancy in percent, refreshed on every admission.
    #[serde(default)]
    pub utilization: f64,
    #[serde(default)]
    pub occupied_beds: Vec<u32>,
    #[serde(default)]
    pub available_beds: BTreeSet<u32>,
}

impl Hospital {
    pub fn new(
        id: HospitalId,
        name: impl Into<String>,
        capacity: u32,
        specialization: Specialization,
        location: Location,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            capacity,
            specialization,
            location,
            current_patients: 0,
            doctors: Vec::new(),
            utilization: 0.0,
            occupied_beds: Vec::new(),
            available_beds: (1..=capacity).collect(),
        }
    }

    pub fn has_room(&self) -> bool {
        self.current_patients < self.capacity
    }

    pub fn remaining_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.current_patients)
    }

    pub fn occupancy_percent(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.current_patients) / f64::from(self.capacity) * 100.0
    }

    pub fn bed_status(&self) -> BedStatus {
        let occupancy = self.occupancy_percent();
        if occupancy >= 100.0 {
            BedStatus::Full
        } else if occupancy >= FILLING_THRESHOLD {
            BedStatus::Filling
        } else {
            BedStatus::Available
        }
    }

    /// Count one more patient against capacity.
    ///
    /// # Panics
    ///
    /// Panics if the hospital is already full; allocators must check
    /// [`Hospital::has_room`] first.
    pub fn admit(&mut self) {
        assert!(
            self.has_room(),
            "hospital {} admitted past its capacity of {}",
            self.id,
            self.capacity
        );
        self.current_patients += 1;
        self.utilization = self.occupancy_percent();
    }

    /// Pop the lowest-numbered free bed, if the pool has one.
    pub fn take_bed(&mut self) -> Option<u32> {
        let bed = self.available_beds.pop_first()?;
        self.occupied_beds.push(bed);
        Some(bed)
    }

    pub fn reset(&mut self) {
        self.current_patients = 0;
        self.utilization = 0.0;
        self.occupied_beds.clear();
        self.available_beds = (1..=self.capacity).collect();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub ailment: String,
    pub required_specialization: Specialization,
    pub urgency: Urgency,
    pub location: Location,
    #[serde(default)]
    pub assigned_hospital: Option<HospitalId>,
    #[serde(default)]
    pub assigned_doctor: Option<DoctorId>,
    #[serde(default)]
    pub bed_number: Option<u32>,
    /// Only meaningful while `assigned_hospital` is set.
    #[serde(default)]
    pub travel_distance: f64,
}

impl Patient {
    pub fn new(
        id: PatientId,
        name: impl Into<String>,
        ailment: impl Into<String>,
        required_specialization: Specialization,
        urgency: Urgency,
        location: Location,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            ailment: ailment.into(),
            required_specialization,
            urgency,
            location,
            assigned_hospital: None,
            assigned_doctor: None,
            bed_number: None,
            travel_distance: 0.0,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_hospital.is_some()
    }

    pub fn reset(&mut self) {
        self.assigned_hospital = None;
        self.assigned_doctor = None;
        self.bed_number = None;
        self.travel_distance = 0.0;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub specialization: Specialization,
    pub hospital_id: HospitalId,
    pub experience: u32,
    #[serde(default)]
    pub current_patients: u32,
    pub max_patients: u32,
}

impl Doctor {
    pub fn has_room(&self) -> bool {
        self.current_patients < self.max_patients
    }

    /// Ranking used for manual doctor allocation: seniority minus load.
    pub fn allocation_score(&self) -> f64 {
        let load = if self.max_patients == 0 {
            1.0
        } else {
            f64::from(self.current_patients) / f64::from(self.max_patients)
        };
        f64::from(self.experience) - load * 10.0
    }

    pub fn take_patient(&mut self) {
        assert!(
            self.has_room(),
            "doctor {} took more than {} patients",
            self.id,
            self.max_patients
        );
        self.current_patients += 1;
    }

    pub fn release_patient(&mut self) {
        self.current_patients = self.current_patients.saturating_sub(1);
    }
}

/// One patient placed by an allocator run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub patient_id: PatientId,
    pub hospital_id: HospitalId,
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bed_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<DoctorId>,
}
