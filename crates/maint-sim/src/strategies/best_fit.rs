//! `best_fit`: drains nonupdated servers in registry order, packing each VM onto whichever
//! eligible candidate is currently most occupied (but still has room).

use crate::entities::{ServerId, VmId};
use crate::strategy::MigrationPolicy;
use crate::world::World;

/// Picks the most-occupied candidate with room for each VM.
pub struct BestFit;

impl MigrationPolicy for BestFit {
    fn name(&self) -> &'static str {
        "best_fit"
    }

    fn drain_order(&self, world: &World) -> Vec<ServerId> {
        world.nonupdated_servers()
    }

    fn vm_order(&self, world: &World, server: ServerId) -> Vec<VmId> {
        world.server(server).hosted.iter().copied().collect()
    }

    fn select_destination(&self, world: &World, vm: VmId, candidates: &[ServerId]) -> Option<ServerId> {
        let demand = world.vm(vm).demand;
        let mut sorted = candidates.to_vec();
        sorted.sort_by(|&a, &b| world.server(b).occupation_rate().total_cmp(&world.server(a).occupation_rate()));
        sorted.into_iter().find(|&id| world.server(id).has_capacity_to_host(demand))
    }
}
