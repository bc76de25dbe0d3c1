//! Depth-first branch-and-bound over patient-to-hospital edges.
//!
//! Patients are placed one at a time, most urgent first. Each level branches
//! over the patient's compatible hospitals in listed order, charging
//! `distance - urgency_weight * 10` per placement. A patient is skipped only
//! when none of its hospitals has simulated room left on the current branch.
//!
//! The cut compares an admissible bound against the best leaf so far: the
//! cost already paid plus, for every patient still to place, the cheapest
//! edge it could possibly take (or zero if skipping is cheaper). Only a
//! strictly better leaf replaces the incumbent, so among equal-cost
//! solutions the first one reached wins.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::builder::Instance;
use crate::config::BranchAndBoundConfig;
use crate::cost::{assignment_cost, distance, urgency_order};
use crate::model::AssignmentRecord;

/// Counters describing one search.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub nodes_visited: u64,
    pub pruned: u64,
    pub improvements: u64,
    /// Cost of the applied solution; `None` if no leaf was reached.
    pub best_cost: Option<f64>,
    /// The node budget ran out before the tree was fully explored.
    pub budget_exhausted: bool,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    hospital_idx: usize,
    distance: f64,
    cost: f64,
}

/// Read-only view of the search tree: one level per patient.
struct Tree {
    patients: Vec<usize>,
    edges: Vec<Vec<Edge>>,
    /// `optimistic_tail[d]`: lowest cost levels `d..` could still add.
    optimistic_tail: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    patient_idx: usize,
    hospital_idx: usize,
    distance: f64,
    cost: f64,
}

struct Search {
    room: Vec<u32>,
    path: Vec<Placement>,
    best: Option<(f64, Vec<Placement>)>,
    max_nodes: Option<u64>,
    stats: SearchStats,
}

/// One open node on the explicit DFS stack.
#[derive(Debug, Clone, Copy)]
struct Frame {
    depth: usize,
    cost: f64,
    next_edge: usize,
    branched: bool,
    skipped: bool,
    /// Hospital taken for the child currently below this frame.
    placed: Option<usize>,
}

impl Tree {
    fn build(instance: &Instance) -> Self {
        let patients = urgency_order(&instance.patients);
        let edges: Vec<Vec<Edge>> = patients
            .iter()
            .map(|&patient_idx| {
                let patient = &instance.patients[patient_idx];
                instance
                    .hospitals
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| h.specialization == patient.required_specialization)
                    .map(|(hospital_idx, h)| {
                        let d = distance(patient.location, h.location);
                        Edge {
                            hospital_idx,
                            distance: d,
                            cost: assignment_cost(d, patient.urgency),
                        }
                    })
                    .collect()
            })
            .collect();

        let mut optimistic_tail = vec![0.0; edges.len() + 1];
        for depth in (0..edges.len()).rev() {
            let cheapest = edges[depth]
                .iter()
                .map(|e| e.cost)
                .fold(0.0, f64::min);
            optimistic_tail[depth] = optimistic_tail[depth + 1] + cheapest;
        }

        Self {
            patients,
            edges,
            optimistic_tail,
        }
    }

    fn depth(&self) -> usize {
        self.patients.len()
    }

    /// The leaf the search dives to first: every patient takes its first
    /// edge with room left.
    fn first_fit(&self, mut room: Vec<u32>) -> (f64, Vec<Placement>) {
        let mut cost = 0.0;
        let mut placements = Vec::with_capacity(self.depth());
        for (depth, &patient_idx) in self.patients.iter().enumerate() {
            let Some(edge) = self.edges[depth].iter().find(|e| room[e.hospital_idx] > 0) else {
                continue;
            };
            room[edge.hospital_idx] -= 1;
            cost += edge.cost;
            placements.push(Placement {
                patient_idx,
                hospital_idx: edge.hospital_idx,
                distance: edge.distance,
                cost: edge.cost,
            });
        }
        (cost, placements)
    }
}

impl Search {
    fn over_budget(&mut self) -> bool {
        match self.max_nodes {
            Some(max) if self.stats.nodes_visited >= max => {
                self.stats.budget_exhausted = true;
                true
            }
            _ => false,
        }
    }

    /// Visit a node. Returns a frame when the node has children to expand.
    fn enter(&mut self, tree: &Tree, depth: usize, cost: f64) -> Option<Frame> {
        if self.over_budget() {
            return None;
        }
        self.stats.nodes_visited += 1;

        if let Some((best_cost, _)) = &self.best {
            if cost + tree.optimistic_tail[depth] >= *best_cost {
                self.stats.pruned += 1;
                return None;
            }
        }

        if depth == tree.depth() {
            trace!(cost, placed = self.path.len(), "new incumbent");
            self.stats.improvements += 1;
            self.best = Some((cost, self.path.clone()));
            return None;
        }

        Some(Frame {
            depth,
            cost,
            next_edge: 0,
            branched: false,
            skipped: false,
            placed: None,
        })
    }

    /// Depth-first search on an explicit stack, so depth is bounded by heap
    /// rather than by the thread's stack.
    fn run(&mut self, tree: &Tree) {
        let mut stack: Vec<Frame> = Vec::with_capacity(tree.depth() + 1);
        if let Some(root) = self.enter(tree, 0, 0.0) {
            stack.push(root);
        }

        while let Some(frame) = stack.last_mut() {
            if let Some(hospital_idx) = frame.placed.take() {
                self.path.pop();
                self.room[hospital_idx] += 1;
            }
            if self.stats.budget_exhausted {
                break;
            }

            let depth = frame.depth;
            let edges = &tree.edges[depth];
            let mut next = None;
            while frame.next_edge < edges.len() {
                let edge = edges[frame.next_edge];
                frame.next_edge += 1;
                if self.room[edge.hospital_idx] > 0 {
                    next = Some(edge);
                    break;
                }
            }

            let child = match next {
                Some(edge) => {
                    frame.branched = true;
                    frame.placed = Some(edge.hospital_idx);
                    self.room[edge.hospital_idx] -= 1;
                    self.path.push(Placement {
                        patient_idx: tree.patients[depth],
                        hospital_idx: edge.hospital_idx,
                        distance: edge.distance,
                        cost: edge.cost,
                    });
                    let cost = frame.cost + edge.cost;
                    self.enter(tree, depth + 1, cost)
                }
                None if !frame.branched && !frame.skipped => {
                    frame.skipped = true;
                    let cost = frame.cost;
                    self.enter(tree, depth + 1, cost)
                }
                None => {
                    stack.pop();
                    continue;
                }
            };
            if let Some(child) = child {
                stack.push(child);
            }
        }
    }
}

/// Search for the cheapest assignment and apply it to the instance.
pub fn allocate(
    instance: &mut Instance,
    config: &BranchAndBoundConfig,
) -> (Vec<AssignmentRecord>, SearchStats) {
    let tree = Tree::build(instance);
    let room: Vec<u32> = instance.hospitals.iter().map(|h| h.remaining_capacity()).collect();
    let mut search = Search {
        room: room.clone(),
        path: Vec::with_capacity(tree.depth()),
        best: None,
        max_nodes: config.max_nodes,
        stats: SearchStats::default(),
    };

    search.run(&tree);

    let mut stats = search.stats;
    if stats.budget_exhausted {
        warn!(
            max_nodes = ?config.max_nodes,
            nodes = stats.nodes_visited,
            "branch-and-bound node budget exhausted, keeping best solution found"
        );
        if search.best.is_none() {
            debug!("budget ran out before the first leaf, completing it first-fit");
            search.best = Some(tree.first_fit(room));
        }
    }
    debug!(
        nodes = stats.nodes_visited,
        pruned = stats.pruned,
        improvements = stats.improvements,
        "branch-and-bound search finished"
    );

    let Some((best_cost, placements)) = search.best else {
        return (Vec::new(), stats);
    };
    stats.best_cost = Some(best_cost);

    let assignments = placements
        .iter()
        .map(|placement| {
            let hospital = &mut instance.hospitals[placement.hospital_idx];
            let patient = &mut instance.patients[placement.patient_idx];
            hospital.admit();
            patient.assigned_hospital = Some(hospital.id);
            patient.travel_distance = placement.distance;
            trace!(
                patient = patient.id,
                hospital = hospital.id,
                cost = placement.cost,
                "branch-and-bound assignment"
            );
            AssignmentRecord {
                patient_id: patient.id,
                hospital_id: hospital.id,
                distance: placement.distance,
                bed_number: None,
                doctor_id: None,
            }
        })
        .collect();

    (assignments, stats)
}

/// Total branch-and-bound cost of a set of assignments against an instance.
pub fn solution_cost(instance: &Instance, assignments: &[AssignmentRecord]) -> f64 {
    assignments
        .iter()
        .filter_map(|a| {
            let patient = instance.patients.iter().find(|p| p.id == a.patient_id)?;
            Some(assignment_cost(a.distance, patient.urgency))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::greedy;
    use crate::model::{Hospital, Location, Patient, Specialization, Urgency};

    fn patient(id: u32, spec: Specialization, urgency: Urgency, x: f64, y: f64) -> Patient {
        Patient::new(id, "Dileep", "Fracture", spec, urgency, Location::new(x, y))
    }

    fn hospital(id: u32, capacity: u32, spec: Specialization, x: f64, y: f64) -> Hospital {
        Hospital::new(id, "Max Healthcare", capacity, spec, Location::new(x, y))
    }

    #[test]
    fn check_single_hospital_keeps_most_valuable() {
        let hospitals = vec![hospital(0, 2, Specialization::Cardiology, 0.0, 0.0)];
        let patients = vec![
            patient(0, Specialization::Cardiology, Urgency::Critical, 1.0, 0.0),
            patient(1, Specialization::Cardiology, Urgency::Stable, 2.0, 0.0),
            patient(2, Specialization::Cardiology, Urgency::Urgent, 0.0, 1.0),
        ];
        let mut instance = Instance::new(hospitals, patients, vec![]);

        let (assignments, stats) = allocate(&mut instance, &BranchAndBoundConfig::unbounded());

        assert_eq!(assignments.len(), 2);
        assert!(instance.patients[0].is_assigned());
        assert!(instance.patients[2].is_assigned());
        assert!(!instance.patients[1].is_assigned());
        assert_eq!(instance.hospitals[0].current_patients, 2);
        // (10 - 30) + (10 - 20)
        assert!((stats.best_cost.unwrap() + 30.0).abs() < 1e-9);
        assert!(!stats.budget_exhausted);
    }

    #[test]
    fn check_search_beats_greedy_by_swapping() {
        // Greedy sends the first critical patient to the near hospital and
        // forces the second one far away; swapping is cheaper overall.
        let hospitals = vec![
            hospital(0, 1, Specialization::Orthopedics, 0.0, 0.0),
            hospital(1, 1, Specialization::Orthopedics, 10.0, 0.0),
        ];
        let patients = vec![
            patient(0, Specialization::Orthopedics, Urgency::Critical, 4.0, 0.0),
            patient(1, Specialization::Orthopedics, Urgency::Critical, 0.0, 0.0),
        ];
        let mut greedy_instance = Instance::new(hospitals.clone(), patients.clone(), vec![]);
        let greedy_assignments = greedy::allocate(&mut greedy_instance);
        let greedy_cost = solution_cost(&greedy_instance, &greedy_assignments);

        let mut instance = Instance::new(hospitals, patients, vec![]);
        let (assignments, stats) = allocate(&mut instance, &BranchAndBoundConfig::unbounded());
        let bnb_cost = stats.best_cost.unwrap();

        assert!(bnb_cost < greedy_cost);
        assert!((bnb_cost - solution_cost(&instance, &assignments)).abs() < 1e-9);
        assert_eq!(instance.patients[0].assigned_hospital, Some(1));
        assert_eq!(instance.patients[1].assigned_hospital, Some(0));
    }

    #[test]
    fn check_unmatched_patient_is_skipped() {
        let hospitals = vec![hospital(0, 3, Specialization::Emergency, 5.0, 5.0)];
        let patients = vec![
            patient(0, Specialization::Pediatrics, Urgency::Critical, 5.0, 5.0),
            patient(1, Specialization::Emergency, Urgency::Stable, 6.0, 5.0),
        ];
        let mut instance = Instance::new(hospitals, patients, vec![]);

        let (assignments, _) = allocate(&mut instance, &BranchAndBoundConfig::default());

        assert_eq!(assignments.len(), 1);
        assert!(!instance.patients[0].is_assigned());
        assert_eq!(instance.patients[1].assigned_hospital, Some(0));
        assert!(instance.patients.iter().all(|p| p.bed_number.is_none() && p.assigned_doctor.is_none()));
    }

    #[test]
    fn check_empty_instance() {
        let mut instance = Instance::default();
        let (assignments, stats) = allocate(&mut instance, &BranchAndBoundConfig::default());
        assert!(assignments.is_empty());
        assert_eq!(stats.best_cost, Some(0.0));
        assert_eq!(stats.nodes_visited, 1);
    }

    #[test]
    fn check_node_budget_keeps_first_leaf() {
        let hospitals = vec![
            hospital(0, 3, Specialization::Neurology, 0.0, 0.0),
            hospital(1, 3, Specialization::Neurology, 100.0, 100.0),
            hospital(2, 3, Specialization::Neurology, 50.0, 50.0),
        ];
        let patients = (0..6)
            .map(|id| patient(id, Specialization::Neurology, Urgency::Urgent, f64::from(id) * 15.0, 40.0))
            .collect::<Vec<_>>();
        let mut bounded = Instance::new(hospitals.clone(), patients.clone(), vec![]);
        let mut full = Instance::new(hospitals, patients, vec![]);

        let budget = BranchAndBoundConfig { max_nodes: Some(10) };
        let (bounded_assignments, bounded_stats) = allocate(&mut bounded, &budget);
        let (_, full_stats) = allocate(&mut full, &BranchAndBoundConfig::unbounded());

        assert!(bounded_stats.budget_exhausted);
        assert!(bounded_stats.nodes_visited <= 10);
        assert_eq!(bounded_assignments.len(), 6);
        assert!(!full_stats.budget_exhausted);
        assert!(full_stats.best_cost.unwrap() <= bounded_stats.best_cost.unwrap() + 1e-9);
        for h in &bounded.hospitals {
            assert!(h.current_patients <= h.capacity);
        }
    }

    #[test]
    fn check_budget_below_depth_still_assigns() {
        let hospitals = vec![hospital(0, 30, Specialization::Cardiology, 0.0, 0.0)];
        let patients = (0..30)
            .map(|id| patient(id, Specialization::Cardiology, Urgency::Stable, 1.0, 1.0))
            .collect::<Vec<_>>();
        let mut greedy_instance = Instance::new(hospitals.clone(), patients.clone(), vec![]);
        let greedy_assignments = greedy::allocate(&mut greedy_instance);
        let mut instance = Instance::new(hospitals, patients, vec![]);

        let (assignments, stats) = allocate(&mut instance, &BranchAndBoundConfig { max_nodes: Some(20) });

        assert!(stats.budget_exhausted);
        assert_eq!(assignments.len(), greedy_assignments.len());
        assert_eq!(instance.hospitals[0].current_patients, 30);
        let best = stats.best_cost.unwrap();
        assert!((best - solution_cost(&instance, &assignments)).abs() < 1e-9);

        let mut empty_budget = Instance::new(
            vec![hospital(0, 2, Specialization::Cardiology, 0.0, 0.0)],
            vec![patient(0, Specialization::Cardiology, Urgency::Critical, 0.0, 0.0)],
            vec![],
        );
        let (assignments, stats) = allocate(&mut empty_budget, &BranchAndBoundConfig { max_nodes: Some(0) });
        assert_eq!(stats.nodes_visited, 0);
        assert_eq!(assignments.len(), 1);
    }

    #[test]
    fn check_deep_instance_runs_on_small_stack() {
        const PATIENTS: u32 = 20_000;
        let worker = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let hospitals = vec![hospital(0, PATIENTS, Specialization::Cardiology, 50.0, 50.0)];
                let patients = (0..PATIENTS)
                    .map(|id| patient(id, Specialization::Cardiology, Urgency::Stable, 50.0, 51.0))
                    .collect();
                let mut instance = Instance::new(hospitals, patients, vec![]);
                let (assignments, stats) = allocate(&mut instance, &BranchAndBoundConfig::default());
                (assignments.len(), stats)
            })
            .unwrap();

        let (assigned, stats) = worker.join().unwrap();
        assert_eq!(assigned, PATIENTS as usize);
        assert!(!stats.budget_exhausted);
        assert_eq!(stats.nodes_visited, u64::from(PATIENTS) + 1);
    }

    #[test]
    fn check_generous_budget_matches_unbounded() {
        let hospitals = vec![
            hospital(0, 2, Specialization::Cardiology, 10.0, 10.0),
            hospital(1, 2, Specialization::Cardiology, 60.0, 20.0),
        ];
        let patients = vec![
            patient(0, Specialization::Cardiology, Urgency::Stable, 12.0, 11.0),
            patient(1, Specialization::Cardiology, Urgency::Critical, 55.0, 25.0),
            patient(2, Specialization::Cardiology, Urgency::Urgent, 30.0, 15.0),
            patient(3, Specialization::Cardiology, Urgency::Stable, 70.0, 5.0),
        ];
        let mut a = Instance::new(hospitals.clone(), patients.clone(), vec![]);
        let mut b = Instance::new(hospitals, patients, vec![]);

        let (first, _) = allocate(&mut a, &BranchAndBoundConfig { max_nodes: Some(1_000_000) });
        let (second, _) = allocate(&mut b, &BranchAndBoundConfig::unbounded());
        assert_eq!(first, second);
        assert_eq!(a, b);
    }
}
