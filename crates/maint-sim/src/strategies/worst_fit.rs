//! `worst_fit`: drains nonupdated servers in registry order, packing each VM onto whichever
//! eligible candidate is currently least occupied.

use crate::entities::{ServerId, VmId};
use crate::strategy::MigrationPolicy;
use crate::world::World;

/// Picks the least-occupied candidate with room for each VM.
pub struct WorstFit;

impl MigrationPolicy for WorstFit {
    fn name(&self) -> &'static str {
        "worst_fit"
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
        sorted.sort_by(|&a, &b| world.server(a).occupation_rate().total_cmp(&world.server(b).occupation_rate()));
        sorted.into_iter().find(|&id| world.server(id).has_capacity_to_host(demand))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Constants;
    use crate::entities::{Server, VirtualMachine};
    use crate::resources::Resources;
    use crate::world::World;
    use indexmap::IndexSet;

    #[test]
    fn picks_the_least_occupied_candidate_with_room() {
        let cap = Resources { cpu: 10, memory: 10, disk: 10 };
        let heavily_loaded = Server {
            id: 1,
            capacity: cap,
            demand: Resources { cpu: 8, memory: 8, disk: 8 },
            updated: false,
            update_step: None,
            patch_duration: 0,
            sanity_check_duration: 0,
            hosted: IndexSet::new(),
        };
        let lightly_loaded = Server {
            id: 2,
            capacity: cap,
            demand: Resources { cpu: 1, memory: 1, disk: 1 },
            updated: false,
            update_step: None,
            patch_duration: 0,
            sanity_check_duration: 0,
            hosted: IndexSet::new(),
        };
        let vm = VirtualMachine {
            id: 100,
            demand: Resources { cpu: 1, memory: 1, disk: 1 },
            host: 1,
            migration_log: Vec::new(),
        };
        let world = World::from_entities(
            vec![heavily_loaded, lightly_loaded],
            vec![vm],
            vec![],
            Constants::new(),
        );

        let dest = WorstFit.select_destination(&world, 100, &[1, 2]);
        assert_eq!(dest, Some(2), "worst_fit should prefer the emptier candidate that still has room");
    }
}
