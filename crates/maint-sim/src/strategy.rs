//! The strategy framework (C6): the shared phase-dispatch rule and migration-phase mechanics
//! that every named strategy runs through, plus the [`MigrationPolicy`] seam where strategies
//! actually differ.

use std::collections::HashSet;

use maint_core::scheduler::{ClockAt, Tick};
use maint_core::{log_debug, log_warn};

use crate::entities::{ServerId, VmId};
use crate::error::SimError;
use crate::placement::can_host_vms;
use crate::world::World;

/// The part of a maintenance strategy that varies: how to order servers for draining, whether a
/// feasibility gate applies, the order to move a draining server's VMs, and how to pick each
/// VM's destination.
///
/// The patch phase and the shared migration-phase bookkeeping (`emptied_this_step`, candidate
/// set construction, re-sorting between placements) are identical across every strategy and
/// live in [`run_phase`], not in this trait — per the Design Notes, "the dispatch rule lives in
/// a shared helper; only the migration-phase policy varies."
pub trait MigrationPolicy {
    /// The name this policy is registered under (matches the CLI's `--maintenance-strategy`).
    fn name(&self) -> &'static str;

    /// The order in which nonupdated servers are considered for draining this step.
    fn drain_order(&self, world: &World) -> Vec<ServerId>;

    /// Whether a server must pass [`can_host_vms`] before this policy will drain it at all.
    fn is_gated(&self) -> bool {
        false
    }

    /// The order to move VMs off `server`, computed once before any of them are moved.
    fn vm_order(&self, world: &World, server: ServerId) -> Vec<VmId>;

    /// Picks a destination for `vm` among `candidates`, or `None` if none currently fits.
    /// Called once per VM, so it always sees the current (possibly just-mutated) demand state.
    fn select_destination(&self, world: &World, vm: VmId, candidates: &[ServerId]) -> Option<ServerId>;
}

/// Sorts `candidates` by `(updated descending, occupation_rate descending)`, stably so that
/// equal-ranked candidates keep registry order. Shared by the two gated strategies.
pub(crate) fn sort_by_updated_then_occupation(world: &World, candidates: &[ServerId]) -> Vec<ServerId> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|&a, &b| {
        let (sa, sb) = (world.server(a), world.server(b));
        sb.updated
            .cmp(&sa.updated)
            .then_with(|| sb.occupation_rate().total_cmp(&sa.occupation_rate()))
    });
    sorted
}

/// Snapshots `server`'s hosted VMs sorted by `overall_demand()` descending, stably. Shared by
/// the two gated strategies, which pre-sort VMs before draining (§4.6).
pub(crate) fn vms_by_demand_desc(world: &World, server: ServerId) -> Vec<VmId> {
    let mut vms: Vec<VmId> = world.server(server).hosted.iter().copied().collect();
    vms.sort_by(|&a, &b| {
        world
            .vm(b)
            .demand
            .geometric_mean()
            .total_cmp(&world.vm(a).demand.geometric_mean())
    });
    vms
}

/// Runs exactly one phase — patch or migration — for `policy` against `world`, tagging any
/// mutation with `step`. Returns the sequence of timeouts this phase yields, in issue order,
/// ready to be replayed through a [`maint_core::Scheduler`] via [`maint_core::Scripted`].
///
/// `clock` is the virtual-time value this step started at, for log lines only — it does not
/// affect scheduling, since the phase's own timeouts are computed eagerly and replayed afterward
/// (see [`crate::maintenance::run`]).
pub fn run_phase(policy: &dyn MigrationPolicy, world: &mut World, step: u32, clock: Tick) -> Result<Vec<Tick>, SimError> {
    let at = ClockAt(clock);
    let ready = world.ready_to_patch();
    if !ready.is_empty() {
        return Ok(patch_phase(world, &ready, step, &at));
    }
    migration_phase(policy, world, step, &at)
}

fn patch_phase(world: &mut World, ready: &[ServerId], step: u32, at: &ClockAt) -> Vec<Tick> {
    let slowest = ready.iter().map(|&id| world.update_server(id, step)).max().unwrap_or(0);
    log_debug!(at, "step {}: patch phase updates {} server(s), advancing by {}", step, ready.len(), slowest);
    vec![slowest]
}

fn migration_phase(policy: &dyn MigrationPolicy, world: &mut World, step: u32, at: &ClockAt) -> Result<Vec<Tick>, SimError> {
    let mut timeouts = Vec::new();
    let mut emptied_this_step: HashSet<ServerId> = HashSet::new();

    for server in policy.drain_order(world) {
        let candidates: Vec<ServerId> = world
            .server_ids()
            .filter(|&id| id != server && !emptied_this_step.contains(&id))
            .collect();

        let vms = policy.vm_order(world, server);

        if policy.is_gated() && !can_host_vms(world, &candidates, &vms) {
            log_warn!(
                at,
                "step {}: {} gates draining server {}, but the remaining fleet cannot absorb its {} vm(s); skipping this step",
                step,
                policy.name(),
                server,
                vms.len()
            );
            continue;
        }

        for vm_id in vms {
            if let Some(dest) = policy.select_destination(world, vm_id, &candidates) {
                let duration = world.migrate(vm_id, dest, step)?;
                log_debug!(
                    at,
                    "step {}: migrating vm {} from server {} to server {} ({} ticks)",
                    step,
                    vm_id,
                    server,
                    dest,
                    duration
                );
                timeouts.push(duration);
            }
        }

        if world.server(server).is_empty() {
            emptied_this_step.insert(server);
        }
    }

    Ok(timeouts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Constants;
    use crate::entities::Server;
    use crate::resources::Resources;
    use crate::strategies;
    use indexmap::IndexSet;

    fn server(id: ServerId, cap: Resources, updated: bool, hosted: &[VmId]) -> Server {
        let demand = hosted.iter().fold(Resources::ZERO, |mut acc, _| {
            acc.add_assign(Resources { cpu: 1, memory: 1, disk: 1 });
            acc
        });
        Server {
            id,
            capacity: cap,
            demand,
            updated,
            update_step: None,
            patch_duration: 300,
            sanity_check_duration: 600,
            hosted: hosted.iter().copied().collect::<IndexSet<_>>(),
        }
    }

    fn vm(id: VmId, host: ServerId) -> crate::entities::VirtualMachine {
        crate::entities::VirtualMachine {
            id,
            demand: Resources { cpu: 1, memory: 1, disk: 1 },
            host,
            migration_log: Vec::new(),
        }
    }

    #[test]
    fn dispatch_prefers_a_patch_phase_when_any_server_is_ready() {
        let cap = Resources { cpu: 4, memory: 4, disk: 32 };
        let servers = vec![server(1, cap, false, &[])];
        let mut world = World::from_entities(servers, vec![], vec![], Constants::new());
        let policy = strategies::by_name("best_fit").unwrap();
        let timeouts = run_phase(policy.as_ref(), &mut world, 0, 0).unwrap();
        assert_eq!(timeouts, vec![900]);
        assert!(world.server(1).updated);
    }

    #[test]
    fn dispatch_runs_a_migration_phase_when_nothing_is_ready_to_patch() {
        // Both servers are nonupdated and nonempty, so `ready_to_patch()` is empty and the
        // dispatch rule must choose a migration phase, not a patch phase.
        let cap = Resources { cpu: 4, memory: 4, disk: 32 };
        let big = Resources { cpu: 2, memory: 2, disk: 2 };
        let mut s2 = server(2, cap, false, &[20]);
        s2.demand = big;
        let servers = vec![server(1, cap, false, &[10]), s2];
        let vms = vec![
            vm(10, 1),
            crate::entities::VirtualMachine { id: 20, demand: big, host: 2, migration_log: Vec::new() },
        ];
        let mut world = World::from_entities(servers, vms, vec![], Constants::new());
        let policy = strategies::by_name("best_fit").unwrap();
        let timeouts = run_phase(policy.as_ref(), &mut world, 0, 0).unwrap();
        assert_eq!(timeouts.len(), 1, "the lone movable VM should migrate exactly once");
        assert!(world.server(1).is_empty());
        assert!(!world.server(1).updated, "migration phases never patch");
        assert!(!world.server(2).updated, "migration phases never patch");
    }

    #[test]
    fn a_server_emptied_earlier_this_step_becomes_unavailable_as_a_later_destination() {
        // Three full-size-1 servers: s1 and s2 each host one VM, s3 is already empty. In
        // registry order, s1 drains its VM onto s3 first. By the time s2 is considered, s3 is
        // occupied and s1 (now empty) is excluded from its own candidate set per
        // `emptied_this_step`, so s2's VM has nowhere to go.
        let cap = Resources { cpu: 1, memory: 1, disk: 1 };
        let servers = vec![
            server(1, cap, false, &[10]),
            server(2, cap, false, &[20]),
            server(3, cap, false, &[]),
        ];
        let vms = vec![vm(10, 1), vm(20, 2)];
        let mut world = World::from_entities(servers, vms, vec![], Constants::new());
        let policy = strategies::by_name("first_fit").unwrap();
        let timeouts = run_phase(policy.as_ref(), &mut world, 0, 0).unwrap();
        assert_eq!(timeouts.len(), 1, "only s1's VM finds room; s2's VM has no destination left");
        assert!(world.server(1).is_empty());
        assert!(world.server(2).hosted.contains(&20), "s2's VM could not move");
        assert!(world.server(3).hosted.contains(&10), "s1's VM landed on s3");
    }

    #[test]
    fn sort_by_updated_then_occupation_prefers_already_updated_servers() {
        let cap = Resources { cpu: 4, memory: 4, disk: 32 };
        let servers = vec![server(1, cap, false, &[]), server(2, cap, true, &[])];
        let world = World::from_entities(servers, vec![], vec![], Constants::new());
        assert_eq!(sort_by_updated_then_occupation(&world, &[1, 2]), vec![2, 1]);
    }

    #[test]
    fn vms_by_demand_desc_orders_the_largest_vm_first() {
        let cap = Resources { cpu: 8, memory: 8, disk: 64 };
        let small = Resources { cpu: 1, memory: 1, disk: 1 };
        let big = Resources { cpu: 4, memory: 4, disk: 4 };
        let mut s = server(1, cap, false, &[10, 20]);
        s.demand = Resources::ZERO;
        s.demand.add_assign(small);
        s.demand.add_assign(big);
        let vms = vec![
            crate::entities::VirtualMachine { id: 10, demand: small, host: 1, migration_log: Vec::new() },
            crate::entities::VirtualMachine { id: 20, demand: big, host: 1, migration_log: Vec::new() },
        ];
        let world = World::from_entities(vec![s], vms, vec![], Constants::new());
        assert_eq!(vms_by_demand_desc(&world, 1), vec![20, 10]);
    }
}
