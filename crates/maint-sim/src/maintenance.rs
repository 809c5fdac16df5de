//! The maintenance loop (C5): drives a [`World`] to completion under one [`MigrationPolicy`],
//! one step at a time, replaying each step's decisions through a fresh [`Scheduler`] and
//! aggregating metrics as it goes.

use maint_core::scheduler::{ClockAt, Scheduler, Scripted};
use maint_core::{log_error, log_info};

use crate::error::SimError;
use crate::metrics::{self, OverallMetrics, StepMetrics};
use crate::strategy::{run_phase, MigrationPolicy};
use crate::world::World;

/// The final state of a completed maintenance run: every server patched, plus the metrics
/// collected along the way.
pub struct RunOutcome {
    /// The world as it stands once every server has been patched.
    pub world: World,
    /// Metrics rolled up across every step of the run.
    pub metrics: OverallMetrics,
}

/// Drives `world` to completion under `policy`.
///
/// Each iteration runs exactly one phase (see [`run_phase`]): a patch phase if any server is
/// currently [`World::ready_to_patch`], otherwise a migration phase. The phase's yielded
/// timeouts are replayed through a fresh [`Scheduler`] — sequentially, since they represent
/// time-sharing the same migration bandwidth or, for a patch phase, the single largest duration
/// among servers patched in parallel — and the run's virtual clock advances by however long that
/// took. A step snapshot is then taken and the loop continues until no server is nonupdated.
///
/// # Errors
/// Returns [`SimError::NoProgress`] if a migration phase moves zero VMs while nonupdated servers
/// remain — every named strategy keeps trying other servers before giving up on a step, so
/// reaching this means the whole fleet is currently infeasible to drain further, not simply that
/// one candidate didn't work out. Returns whatever [`SimError`] a migration raises, unchanged.
pub fn run(mut world: World, policy: &dyn MigrationPolicy) -> Result<RunOutcome, SimError> {
    let mut clock: u64 = 0;
    let mut step: u32 = 1;
    let mut steps: Vec<StepMetrics> = Vec::new();

    loop {
        let nonupdated = world.nonupdated_servers();
        if nonupdated.is_empty() {
            break;
        }

        let timeouts = run_phase(policy, &mut world, step, clock)?;
        if timeouts.is_empty() {
            log_error!(
                ClockAt(clock),
                "step {}: no patch or migration occurred while {} server(s) remain nonupdated; aborting",
                step,
                nonupdated.len()
            );
            return Err(SimError::NoProgress {
                step,
                nonupdated: nonupdated.len(),
            });
        }

        let mut scheduler = Scheduler::new();
        scheduler.spawn(Box::new(Scripted::new(timeouts)));
        scheduler.run();
        clock += scheduler.now();

        log_info!(
            ClockAt(clock),
            "step {} complete: {} server(s) still nonupdated",
            step,
            world.nonupdated_servers().len()
        );

        steps.push(metrics::snapshot_step(&world, clock, step));
        step += 1;
    }

    Ok(RunOutcome {
        metrics: metrics::finish(steps),
        world,
    })
}
