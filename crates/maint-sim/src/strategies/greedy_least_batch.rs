//! `greedy_least_batch`: gated — a server is only drained once the remaining fleet can
//! provably absorb its whole hosted set — and drains the least-occupied nonupdated servers
//! first, on the theory that they cost the least capacity to relocate.

use crate::entities::{ServerId, VmId};
use crate::strategy::{sort_by_updated_then_occupation, vms_by_demand_desc, MigrationPolicy};
use crate::world::World;

/// Drains least-occupied-first, but only once feasibility is confirmed for the whole batch.
pub struct GreedyLeastBatch;

impl MigrationPolicy for GreedyLeastBatch {
    fn name(&self) -> &'static str {
        "greedy_least_batch"
    }

    fn drain_order(&self, world: &World) -> Vec<ServerId> {
        let mut ids = world.nonupdated_servers();
        ids.sort_by(|&a, &b| world.server(a).occupation_rate().total_cmp(&world.server(b).occupation_rate()));
        ids
    }

    fn is_gated(&self) -> bool {
        true
    }

    fn vm_order(&self, world: &World, server: ServerId) -> Vec<VmId> {
        vms_by_demand_desc(world, server)
    }

    fn select_destination(&self, world: &World, vm: VmId, candidates: &[ServerId]) -> Option<ServerId> {
        let demand = world.vm(vm).demand;
        sort_by_updated_then_occupation(world, candidates)
            .into_iter()
            .find(|&id| world.server(id).has_capacity_to_host(demand))
    }
}
