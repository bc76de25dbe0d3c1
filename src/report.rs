use std::fmt::Write;

use crate::builder::Instance;
use crate::metrics::RunMetrics;
use crate::model::BedStatus;

/// Side-by-side comparison of algorithm runs.
pub fn render_table(results: &[RunMetrics]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:>10} {:>10} {:>12} {:>12} {:>10}",
        "algorithm", "time (ms)", "assigned", "avg km", "util %", "score"
    );
    for run in results {
        let _ = writeln!(
            out,
            "{:<16} {:>10.3} {:>10} {:>12.2} {:>12.1} {:>10}",
            run.algorithm.name(),
            run.execution_time_ms,
            format!("{}/{}", run.patients_assigned, run.total_patients),
            run.avg_distance_km,
            run.utilization_percent,
            run.efficiency_score
        );
        if let Some(stats) = &run.branch_and_bound {
            let _ = writeln!(
                out,
                "  nodes={} pruned={} best_cost={} budget_exhausted={}",
                stats.nodes_visited,
                stats.pruned,
                stats
                    .best_cost
                    .map_or_else(|| "-".to_string(), |cost| format!("{cost:.2}")),
                stats.budget_exhausted
            );
        }
    }
    out
}

/// Per-hospital bed occupancy after the last run.
pub fn render_beds(instance: &Instance) -> String {
    let mut out = String::new();
    for hospital in &instance.hospitals {
        let status = match hospital.bed_status() {
            BedStatus::Available => "available",
            BedStatus::Filling => "filling",
            BedStatus::Full => "full",
        };
        let _ = writeln!(
            out,
            "{:<28} {:<12} {:>3}/{:<3} {:>6.1}% {}",
            hospital.name,
            hospital.specialization,
            hospital.current_patients,
            hospital.capacity,
            hospital.occupancy_percent(),
            status
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Algorithm;
    use crate::metrics::aggregate;
    use crate::model::{Hospital, Location, Specialization};

    #[test]
    fn check_table_lists_each_run() {
        let instance = Instance::default();
        let runs = vec![
            aggregate(Algorithm::Greedy, &instance, vec![], 0.25, None),
            aggregate(Algorithm::BranchBound, &instance, vec![], 1.0, Some(Default::default())),
        ];
        let table = render_table(&runs);
        assert_eq!(table.lines().count(), 4);
        assert!(table.contains("Greedy Matching"));
        assert!(table.contains("best_cost=-"));
    }

    #[test]
    fn check_bed_report_status() {
        let mut hospital = Hospital::new(0, "Tata Memorial Hospital", 1, Specialization::Neurology, Location::default());
        hospital.admit();
        let report = render_beds(&Instance::new(vec![hospital], vec![], vec![]));
        assert!(report.contains("1/1"));
        assert!(report.trim_end().ends_with("full"));
    }
}
