//! The metrics aggregator (C7): per-step snapshots and the overall summary derived from them.

use serde::Serialize;

use crate::world::World;

/// Metrics captured at the end of one maintenance step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepMetrics {
    /// The maintenance step this snapshot was taken at the end of.
    pub step: u32,
    /// The virtual clock value at snapshot time.
    pub now: u64,
    /// `now * |nonupdated_servers|`.
    pub vulnerability_surface: u64,
    /// `100 - (|used_servers| * 100 / count())`.
    pub consolidation_rate: f64,
    /// Mean of `occupation_rate()` over every server (see DESIGN.md for why this averages over
    /// all servers rather than only used servers).
    pub occupation_rate: f64,
    /// Number of migrations committed during this step.
    pub migrations_count: u64,
    /// Sum of those migrations' durations.
    pub migrations_duration_sum: u64,
    /// Shortest migration duration this step, if any migrations occurred.
    pub migrations_duration_min: Option<u64>,
    /// Longest migration duration this step, if any migrations occurred.
    pub migrations_duration_max: Option<u64>,
    /// Mean migration duration this step, if any migrations occurred.
    pub migrations_duration_mean: Option<f64>,
}

/// Metrics summarizing a complete maintenance run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverallMetrics {
    /// The final virtual clock value: total wall-simulated-time the run took.
    pub maintenance_duration: u64,
    /// Sum of every step's `vulnerability_surface`.
    pub total_vulnerability_surface: u64,
    /// Total migrations committed across the whole run.
    pub total_migrations: u64,
    /// Sum of every migration's duration across the whole run.
    pub total_migration_duration: u64,
    /// Mean, across every step, of that step's mean migration duration (a step with no
    /// migrations contributes 0).
    pub mean_of_step_mean_durations: f64,
    /// The largest single-step maximum migration duration observed.
    pub max_of_step_max_durations: u64,
    /// Every step's snapshot, in order.
    pub steps: Vec<StepMetrics>,
}

/// Captures a [`StepMetrics`] snapshot of `world` as of the end of maintenance step `step`, with
/// the virtual clock at `now`.
pub fn snapshot_step(world: &World, now: u64, step: u32) -> StepMetrics {
    let nonupdated = world.nonupdated_servers().len() as u64;

    let occupation_rate = if world.server_count() == 0 {
        0.0
    } else {
        world.servers().iter().map(|s| s.occupation_rate()).sum::<f64>() / world.server_count() as f64
    };

    let durations: Vec<u64> = world
        .vms()
        .iter()
        .flat_map(|vm| vm.migration_log.iter())
        .filter(|rec| rec.maintenance_step == step)
        .map(|rec| rec.duration)
        .collect();

    let migrations_duration_sum: u64 = durations.iter().sum();

    StepMetrics {
        step,
        now,
        vulnerability_surface: now * nonupdated,
        consolidation_rate: world.consolidation_rate(),
        occupation_rate,
        migrations_count: durations.len() as u64,
        migrations_duration_sum,
        migrations_duration_min: durations.iter().copied().min(),
        migrations_duration_max: durations.iter().copied().max(),
        migrations_duration_mean: if durations.is_empty() {
            None
        } else {
            Some(migrations_duration_sum as f64 / durations.len() as f64)
        },
    }
}

/// Rolls up a run's per-step snapshots into an [`OverallMetrics`] summary.
pub fn finish(steps: Vec<StepMetrics>) -> OverallMetrics {
    let maintenance_duration = steps.last().map(|s| s.now).unwrap_or(0);
    let total_vulnerability_surface = steps.iter().map(|s| s.vulnerability_surface).sum();
    let total_migrations = steps.iter().map(|s| s.migrations_count).sum();
    let total_migration_duration = steps.iter().map(|s| s.migrations_duration_sum).sum();

    let mean_of_step_mean_durations = if steps.is_empty() {
        0.0
    } else {
        steps.iter().map(|s| s.migrations_duration_mean.unwrap_or(0.0)).sum::<f64>() / steps.len() as f64
    };
    let max_of_step_max_durations = steps.iter().filter_map(|s| s.migrations_duration_max).max().unwrap_or(0);

    OverallMetrics {
        maintenance_duration,
        total_vulnerability_surface,
        total_migrations,
        total_migration_duration,
        mean_of_step_mean_durations,
        max_of_step_max_durations,
        steps,
    }
}
