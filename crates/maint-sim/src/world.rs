//! The entity registry (C1) and the World-level resource-model operations that need to see more
//! than one entity at once (C2): migration, drain/maintenance duration, consolidation rate.
//!
//! Per the Design Notes' guidance, there is no class-level global state: every operation takes
//! an explicit `&World` or `&mut World`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::Constants;
use crate::entities::{MigrationRecord, Server, ServerId, VirtualMachine, VmId};
use crate::error::SimError;

/// One edge of the input dataset's network topology, retained verbatim.
///
/// No algorithm in this crate reads this; it exists purely for round-trip fidelity with the
/// input dataset's topology, which is treated as opaque metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEdge {
    /// The endpoints of this edge, in whatever shape the dataset used.
    pub nodes: serde_json::Value,
    /// The edge's bandwidth, in the dataset's own units.
    pub bandwidth: u64,
}

/// The owning registry of every Server and VM for one simulation run.
pub struct World {
    constants: Constants,
    servers: Vec<Server>,
    server_index: HashMap<ServerId, usize>,
    vms: Vec<VirtualMachine>,
    vm_index: HashMap<VmId, usize>,
    network_topology: Vec<NetworkEdge>,
}

impl World {
    /// Builds a world directly from already-validated entities. Dataset-level validation
    /// (dangling references, demand exceeding capacity, duplicate hosting) is performed by
    /// [`crate::dataset::load_file`] before this is called; this constructor only establishes
    /// the id→index maps.
    pub(crate) fn from_entities(
        servers: Vec<Server>,
        vms: Vec<VirtualMachine>,
        network_topology: Vec<NetworkEdge>,
        constants: Constants,
    ) -> Self {
        let server_index = servers.iter().enumerate().map(|(i, s)| (s.id, i)).collect();
        let vm_index = vms.iter().enumerate().map(|(i, v)| (v.id, i)).collect();
        Self {
            constants,
            servers,
            server_index,
            vms,
            vm_index,
            network_topology,
        }
    }

    /// The constants this world was loaded with.
    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    /// The retained, unread network topology edges.
    pub fn network_topology(&self) -> &[NetworkEdge] {
        &self.network_topology
    }

    // -- C1: entity registry -------------------------------------------------------------

    /// Every server, in registry (dataset load) order.
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// Every VM, in registry (dataset load) order.
    pub fn vms(&self) -> &[VirtualMachine] {
        &self.vms
    }

    /// Number of servers.
    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Looks up a server by id.
    pub fn server(&self, id: ServerId) -> &Server {
        &self.servers[self.server_index[&id]]
    }

    /// Looks up a VM by id.
    pub fn vm(&self, id: VmId) -> &VirtualMachine {
        &self.vms[self.vm_index[&id]]
    }

    /// Ids of every server, in registry order.
    pub fn server_ids(&self) -> impl Iterator<Item = ServerId> + '_ {
        self.servers.iter().map(|s| s.id)
    }

    /// Ids of servers that have already been patched, in registry order.
    pub fn updated_servers(&self) -> Vec<ServerId> {
        self.servers.iter().filter(|s| s.updated).map(|s| s.id).collect()
    }

    /// Ids of servers not yet patched, in registry order.
    pub fn nonupdated_servers(&self) -> Vec<ServerId> {
        self.servers.iter().filter(|s| !s.updated).map(|s| s.id).collect()
    }

    /// Ids of servers hosting at least one VM, in registry order.
    pub fn used_servers(&self) -> Vec<ServerId> {
        self.servers.iter().filter(|s| !s.is_empty()).map(|s| s.id).collect()
    }

    /// Ids of servers that are both nonupdated and empty, in registry order — the servers that
    /// may be patched right now.
    pub fn ready_to_patch(&self) -> Vec<ServerId> {
        self.servers
            .iter()
            .filter(|s| !s.updated && s.is_empty())
            .map(|s| s.id)
            .collect()
    }

    /// `100 - (|used_servers()| * 100 / count())`.
    pub fn consolidation_rate(&self) -> f64 {
        100.0 - (self.used_servers().len() as f64) * 100.0 / (self.server_count() as f64)
    }

    // -- C2: cross-entity resource-model operations ---------------------------------------

    /// Sum of `migration_time()` over a server's currently hosted VMs.
    pub fn drain_duration(&self, server_id: ServerId) -> u64 {
        let c = &self.constants;
        self.server(server_id)
            .hosted
            .iter()
            .map(|&vm_id| self.vm(vm_id).migration_time(c.save_time, c.restore_time, c.network_bw))
            .sum()
    }

    /// `drain_duration() + patch_duration + sanity_check_duration`.
    pub fn maintenance_duration(&self, server_id: ServerId) -> u64 {
        let s = self.server(server_id);
        self.drain_duration(server_id) + s.patch_duration + s.sanity_check_duration
    }

    /// Marks a server as patched, recording `step`, and returns the maintenance duration it
    /// took. Does not itself drain the server — callers (the patch phase) only call this for
    /// servers already in [`World::ready_to_patch`], which are empty by definition.
    pub fn update_server(&mut self, server_id: ServerId, step: u32) -> u64 {
        let duration = self.maintenance_duration(server_id);
        let idx = self.server_index[&server_id];
        self.servers[idx].updated = true;
        self.servers[idx].update_step = Some(step);
        duration
    }

    /// Moves `vm_id` from its current host onto `destination`, updating both sides' demand and
    /// hosted set, rebinding the VM's host, and appending a migration-log entry tagged with
    /// `step`. Returns the migration's duration.
    ///
    /// # Errors
    /// Returns [`SimError::InvariantViolated`] if `destination` does not currently have capacity
    /// to host the VM — this mirrors a precondition the caller is expected to have already
    /// checked; hitting it is a programming error, not an expected runtime outcome.
    pub fn migrate(&mut self, vm_id: VmId, destination: ServerId, step: u32) -> Result<u64, SimError> {
        let vm_demand = self.vm(vm_id).demand;
        let origin = self.vm(vm_id).host;
        if !self.server(destination).has_capacity_to_host(vm_demand) {
            return Err(SimError::InvariantViolated {
                step,
                detail: format!(
                    "migrate: vm {vm_id} does not fit on destination server {destination} (insufficient capacity)"
                ),
            });
        }

        let c = self.constants;
        let duration = self
            .vm(vm_id)
            .migration_time(c.save_time, c.restore_time, c.network_bw);

        {
            let (origin_server, dest_server) = self.two_servers_mut(origin, destination);
            origin_server.hosted.shift_remove(&vm_id);
            origin_server.demand.sub_assign(vm_demand);
            dest_server.hosted.insert(vm_id);
            dest_server.demand.add_assign(vm_demand);
        }

        let vm_idx = self.vm_index[&vm_id];
        let vm = &mut self.vms[vm_idx];
        vm.host = destination;
        vm.migration_log.push(MigrationRecord {
            maintenance_step: step,
            duration,
            origin,
            destination,
        });

        Ok(duration)
    }

    /// Returns mutable references to two distinct servers at once.
    ///
    /// `migrate` needs to mutate origin and destination simultaneously; the registry stores
    /// servers contiguously by insertion index, so a single `split_at_mut` on the backing `Vec`
    /// gets both without unsafe code. Panics if `a == b` — callers never migrate a VM to its own
    /// current host.
    fn two_servers_mut(&mut self, a: ServerId, b: ServerId) -> (&mut Server, &mut Server) {
        let (i, j) = (self.server_index[&a], self.server_index[&b]);
        assert_ne!(i, j, "cannot borrow the same server twice");
        if i < j {
            let (left, right) = self.servers.split_at_mut(j);
            (&mut left[i], &mut right[0])
        } else {
            let (left, right) = self.servers.split_at_mut(i);
            (&mut right[0], &mut left[j])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Server;
    use crate::resources::Resources;
    use indexmap::IndexSet;

    fn server(id: ServerId, cap: Resources, hosted: &[VmId]) -> Server {
        let demand = hosted.iter().fold(Resources::ZERO, |mut acc, _| {
            acc.add_assign(Resources { cpu: 1, memory: 1, disk: 1 });
            acc
        });
        Server {
            id,
            capacity: cap,
            demand,
            updated: false,
            update_step: None,
            patch_duration: 0,
            sanity_check_duration: 0,
            hosted: hosted.iter().copied().collect::<IndexSet<_>>(),
        }
    }

    fn vm(id: VmId, host: ServerId) -> VirtualMachine {
        VirtualMachine {
            id,
            demand: Resources { cpu: 1, memory: 1, disk: 1 },
            host,
            migration_log: Vec::new(),
        }
    }

    fn sample_world() -> World {
        let cap = Resources { cpu: 4, memory: 4, disk: 32 };
        let servers = vec![server(1, cap, &[10]), server(2, cap, &[])];
        let vms = vec![vm(10, 1)];
        World::from_entities(servers, vms, vec![], Constants::new())
    }

    #[test]
    fn registry_filters_preserve_insertion_order() {
        let world = sample_world();
        assert_eq!(world.server_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(world.nonupdated_servers(), vec![1, 2]);
        assert_eq!(world.used_servers(), vec![1]);
        assert_eq!(world.ready_to_patch(), vec![2]);
    }

    #[test]
    fn migrate_moves_demand_and_hosted_set_atomically() {
        let mut world = sample_world();
        let duration = world.migrate(10, 2, 0).unwrap();
        assert_eq!(duration, world.constants().save_time + world.constants().restore_time);
        assert!(world.server(1).is_empty());
        assert!(world.server(2).hosted.contains(&10));
        assert_eq!(world.server(2).demand, Resources { cpu: 1, memory: 1, disk: 1 });
        assert_eq!(world.vm(10).host, 2);
        assert_eq!(world.vm(10).migration_log.len(), 1);
        assert_eq!(world.vm(10).migration_log[0].origin, 1);
        assert_eq!(world.vm(10).migration_log[0].destination, 2);
    }

    #[test]
    fn migrate_refuses_a_destination_without_capacity() {
        let mut world = sample_world();
        let tiny = Resources { cpu: 0, memory: 0, disk: 0 };
        {
            let idx = world.server_index[&2];
            world.servers[idx].capacity = tiny;
        }
        let err = world.migrate(10, 2, 0).unwrap_err();
        assert!(matches!(err, SimError::InvariantViolated { .. }));
        // The failed attempt must not have mutated anything.
        assert!(world.server(1).hosted.contains(&10));
    }

    #[test]
    fn update_server_marks_updated_and_records_the_step() {
        let mut world = sample_world();
        let duration = world.update_server(2, 3);
        assert_eq!(duration, 0);
        assert!(world.server(2).updated);
        assert_eq!(world.server(2).update_step, Some(3));
    }

    #[test]
    fn consolidation_rate_counts_idle_servers() {
        let world = sample_world();
        // 1 used out of 2 servers: 100 - (1*100/2) = 50.
        assert_eq!(world.consolidation_rate(), 50.0);
    }

    #[test]
    fn maintenance_duration_includes_drain_patch_and_sanity() {
        let mut world = sample_world();
        {
            let idx = world.server_index[&1];
            world.servers[idx].patch_duration = 300;
            world.servers[idx].sanity_check_duration = 600;
        }
        let drain = world.drain_duration(1);
        assert_eq!(drain, world.constants().save_time + world.constants().restore_time);
        assert_eq!(world.maintenance_duration(1), drain + 300 + 600);
    }
}
