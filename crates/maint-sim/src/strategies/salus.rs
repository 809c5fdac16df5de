//! `salus`: gated like `greedy_least_batch`, but orders drains by estimated update cost rather
//! than current occupation — `sqrt(maintenance_duration / (capacity_score + 1))`, ascending, so
//! cheap-to-update servers go first.

use crate::entities::{ServerId, VmId};
use crate::strategy::{sort_by_updated_then_occupation, vms_by_demand_desc, MigrationPolicy};
use crate::world::World;

/// Drains by ascending estimated update cost, gated on whole-batch feasibility.
pub struct Salus;

impl Salus {
    fn update_cost(&self, world: &World, server: ServerId) -> f64 {
        let duration = world.maintenance_duration(server) as f64;
        let score = world.server(server).capacity_score();
        (duration / (score + 1.0)).sqrt()
    }
}

impl MigrationPolicy for Salus {
    fn name(&self) -> &'static str {
        "salus"
    }

    fn drain_order(&self, world: &World) -> Vec<ServerId> {
        let mut ids = world.nonupdated_servers();
        ids.sort_by(|&a, &b| self.update_cost(world, a).total_cmp(&self.update_cost(world, b)));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Constants;
    use crate::entities::Server;
    use crate::resources::Resources;
    use crate::world::World;
    use indexmap::IndexSet;

    fn server(id: ServerId, cap: Resources, patch_duration: u64, sanity: u64) -> Server {
        Server {
            id,
            capacity: cap,
            demand: Resources::ZERO,
            updated: false,
            update_step: None,
            patch_duration,
            sanity_check_duration: sanity,
            hosted: IndexSet::new(),
        }
    }

    #[test]
    fn is_gated() {
        assert!(Salus.is_gated());
    }

    #[test]
    fn drain_order_prefers_the_cheaper_update_first() {
        // A smaller capacity_score and a shorter maintenance duration both push update_cost
        // down, so the server that is both smaller and quicker to patch should drain first.
        let small_cap = Resources { cpu: 1, memory: 1, disk: 1 };
        let big_cap = Resources { cpu: 16, memory: 16, disk: 16 };
        let servers = vec![server(1, big_cap, 1000, 1000), server(2, small_cap, 100, 100)];
        let world = World::from_entities(servers, vec![], vec![], Constants::new());
        assert_eq!(Salus.drain_order(&world), vec![2, 1]);
    }

    #[test]
    fn update_cost_matches_the_documented_formula() {
        let cap = Resources { cpu: 1, memory: 1, disk: 1 };
        let servers = vec![server(1, cap, 300, 600)];
        let world = World::from_entities(servers, vec![], vec![], Constants::new());
        let expected = (world.maintenance_duration(1) as f64 / (world.server(1).capacity_score() + 1.0)).sqrt();
        assert_eq!(Salus.update_cost(&world, 1), expected);
    }
}
