//! Hospital bed and doctor allocation.
//!
//! Patients are matched to hospitals of their required specialization under
//! capacity limits by one of three allocators, and each run is scored so the
//! strategies can be compared:
//!
//! - [`greedy`]: nearest compatible hospital, most urgent first; also hands
//!   out beds and doctors.
//! - [`knapsack`]: per-hospital 0/1 knapsack maximizing urgency value.
//! - [`branch_and_bound`]: exhaustive depth-first search with an admissible
//!   cost bound and a node budget.
//!
//! [`Session`] owns the patient, hospital and doctor collections, resets
//! them before every run and collects [`RunMetrics`].
//!
//! # Conventions
//!
//! - **Errors**: [`AllocError`]; an unmatched patient is not an error.
//! - **Logging**: `tracing` macros; the binary installs the subscriber.

pub mod assignment;
pub mod branch_and_bound;
pub mod builder;
pub mod config;
pub mod cost;
pub mod error;
pub mod generator;
pub mod greedy;
pub mod knapsack;
pub mod metrics;
pub mod model;
pub mod report;

pub use assignment::Session;
pub use builder::Instance;
pub use config::{Algorithm, AlgorithmSelection, BranchAndBoundConfig, EngineConfig, GeneratorConfig, UrgencyMix};
pub use error::{AllocError, Result};
pub use metrics::RunMetrics;
pub use model::{AssignmentRecord, Doctor, Hospital, Location, Patient, Specialization, Urgency};
