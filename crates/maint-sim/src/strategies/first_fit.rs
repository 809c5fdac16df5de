//! `first_fit`: drains nonupdated servers in registry order, placing each VM on the first
//! eligible candidate (in registry order) that has room.

use crate::entities::{ServerId, VmId};
use crate::strategy::MigrationPolicy;
use crate::world::World;

/// Picks the first registry-order candidate with room for each VM.
pub struct FirstFit;

impl MigrationPolicy for FirstFit {
    fn name(&self) -> &'static str {
        "first_fit"
    }

    fn drain_order(&self, world: &World) -> Vec<ServerId> {
        world.nonupdated_servers()
    }

    fn vm_order(&self, world: &World, server: ServerId) -> Vec<VmId> {
        world.server(server).hosted.iter().copied().collect()
    }

    fn select_destination(&self, world: &World, vm: VmId, candidates: &[ServerId]) -> Option<ServerId> {
        let demand = world.vm(vm).demand;
        candidates.iter().copied().find(|&id| world.server(id).has_capacity_to_host(demand))
    }
}
