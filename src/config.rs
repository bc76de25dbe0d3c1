use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AllocError, Result};

/// Default cap on branch-and-bound node visits.
pub const DEFAULT_MAX_NODES: u64 = 5_000_000;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Greedy,
    Knapsack,
    BranchBound,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Greedy, Algorithm::Knapsack, Algorithm::BranchBound];

    /// Display name carried into run metrics.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Greedy => "Greedy Matching",
            Algorithm::Knapsack => "Knapsack DP",
            Algorithm::BranchBound => "Branch & Bound",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Algorithm::Greedy => "greedy",
            Algorithm::Knapsack => "knapsack",
            Algorithm::BranchBound => "branch-bound",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = AllocError;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.key() == s)
            .ok_or_else(|| AllocError::UnknownAlgorithm(s.to_string()))
    }
}

/// Which allocators a session runs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmSelection {
    #[default]
    All,
    Greedy,
    Knapsack,
    BranchBound,
}

impl AlgorithmSelection {
    pub fn algorithms(self) -> Vec<Algorithm> {
        match self {
            AlgorithmSelection::All => Algorithm::ALL.to_vec(),
            AlgorithmSelection::Greedy => vec![Algorithm::Greedy],
            AlgorithmSelection::Knapsack => vec![Algorithm::Knapsack],
            AlgorithmSelection::BranchBound => vec![Algorithm::BranchBound],
        }
    }
}

impl FromStr for AlgorithmSelection {
    type Err = AllocError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "all" {
            return Ok(AlgorithmSelection::All);
        }
        Ok(match s.parse::<Algorithm>()? {
            Algorithm::Greedy => AlgorithmSelection::Greedy,
            Algorithm::Knapsack => AlgorithmSelection::Knapsack,
            Algorithm::BranchBound => AlgorithmSelection::BranchBound,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BranchAndBoundConfig {
    /// Node visits allowed before the search stops with its best leaf so
    /// far. `None` searches the whole tree.
    pub max_nodes: Option<u64>,
}

impl Default for BranchAndBoundConfig {
    fn default() -> Self {
        Self {
            max_nodes: Some(DEFAULT_MAX_NODES),
        }
    }
}

impl BranchAndBoundConfig {
    pub fn unbounded() -> Self {
        Self { max_nodes: None }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub algorithm: AlgorithmSelection,
    pub branch_and_bound: BranchAndBoundConfig,
    /// Pause between consecutive runs, never inside one.
    pub pacing_ms: u64,
}

impl EngineConfig {
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path.as_ref()).and_then(|data| Self::from_json(&data))
    }
}

/// Share of generated patients per urgency level, in percent.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyMix {
    pub critical: u32,
    pub urgent: u32,
    pub stable: u32,
}

impl Default for UrgencyMix {
    fn default() -> Self {
        Self {
            critical: 20,
            urgent: 30,
            stable: 50,
        }
    }
}

impl UrgencyMix {
    /// Rescale so the three shares sum to 100 (each share rounded).
    pub fn normalized(self) -> Result<Self> {
        let total = u64::from(self.critical) + u64::from(self.urgent) + u64::from(self.stable);
        if total == 0 {
            return Err(AllocError::InvalidConfig(
                "urgency mix must not be all zero".into(),
            ));
        }
        if total == 100 {
            return Ok(self);
        }
        let factor = 100.0 / total as f64;
        let scale = |share: u32| (f64::from(share) * factor).round() as u32;
        Ok(Self {
            critical: scale(self.critical),
            urgent: scale(self.urgent),
            stable: scale(self.stable),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    pub hospital_count: u32,
    pub patient_count: u32,
    pub doctors_per_hospital: u32,
    pub hospital_capacity: u32,
    pub urgency_mix: UrgencyMix,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            hospital_count: 5,
            patient_count: 20,
            doctors_per_hospital: 3,
            hospital_capacity: 10,
            urgency_mix: UrgencyMix::default(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path.as_ref()).and_then(|data| Self::from_json(&data))
    }

    pub fn validate(&self) -> Result<()> {
        if self.hospital_capacity == 0 {
            return Err(AllocError::InvalidConfig(
                "hospital capacity must be at least 1".into(),
            ));
        }
        self.urgency_mix.normalized().map(|_| ())
    }
}

fn load_json(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| AllocError::Io {
        path: path.to_path_buf(),
        source,
    })
}
