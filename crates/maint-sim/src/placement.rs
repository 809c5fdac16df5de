//! The bin-packing feasibility oracle (C3): "can this set of servers host this set of VMs?"

use std::collections::HashMap;

use crate::entities::{ServerId, VmId};
use crate::resources::Resources;
use crate::world::World;

/// Asks whether `candidates`, using only their own capacity, can collectively host every VM in
/// `vms` — a VM already hosted on one of `candidates` counts toward that candidate's demand, as
/// it would if the VM never moved.
///
/// Best-Fit Decreasing: VMs are tried largest-demand first; for each VM, candidates are tried in
/// descending occupation-rate order, and the first with room wins. Advisory only — this never
/// mutates `world`. It works against a local scratch snapshot of candidate demand rather than
/// mutating the registry's real `Server` values and restoring them afterward, which keeps the
/// "never mutates" guarantee correct even under an early return or panic in caller code.
///
/// `candidates` must already be in registry order: equal-occupation ties are broken by whichever
/// candidate the caller listed first, per the determinism contract.
pub fn can_host_vms(world: &World, candidates: &[ServerId], vms: &[VmId]) -> bool {
    let mut demand: HashMap<ServerId, Resources> =
        candidates.iter().map(|&id| (id, world.server(id).demand)).collect();

    let mut ordered_vms: Vec<VmId> = vms.to_vec();
    ordered_vms.sort_by(|&a, &b| {
        world
            .vm(b)
            .demand
            .geometric_mean()
            .total_cmp(&world.vm(a).demand.geometric_mean())
    });

    let mut placed = 0usize;
    for vm_id in ordered_vms {
        let vm_demand = world.vm(vm_id).demand;

        let mut sorted_candidates: Vec<ServerId> = candidates.to_vec();
        sorted_candidates.sort_by(|&a, &b| {
            occupation_rate(world.server(b).capacity, demand[&b])
                .total_cmp(&occupation_rate(world.server(a).capacity, demand[&a]))
        });

        if let Some(&dest) = sorted_candidates
            .iter()
            .find(|&&id| world.server(id).capacity.covers(plus(demand[&id], vm_demand)))
        {
            demand.get_mut(&dest).unwrap().add_assign(vm_demand);
            placed += 1;
        }
    }

    placed == vms.len()
}

fn plus(mut a: Resources, b: Resources) -> Resources {
    a.add_assign(b);
    a
}

fn occupation_rate(capacity: Resources, demand: Resources) -> f64 {
    let pct = |used: u64, total: u64| (used as f64) * 100.0 / (total as f64);
    (pct(demand.cpu, capacity.cpu) + pct(demand.memory, capacity.memory) + pct(demand.disk, capacity.disk)) / 3.0
}
