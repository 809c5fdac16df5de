//! The dataset loader (C8): deserializes the input JSON schema into a validated [`World`].

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use serde::Deserialize;

use crate::config::Constants;
use crate::entities::{Server, ServerId, VirtualMachine, VmId};
use crate::error::SimError;
use crate::resources::Resources;
use crate::world::{NetworkEdge, World};

/// The top-level shape of an input dataset, matching the external-interfaces schema.
#[derive(Debug, Deserialize)]
pub struct Dataset {
    /// Every server, each carrying the ids of the VMs it initially hosts.
    pub servers: Vec<DatasetServer>,
    /// Every VM, each carrying the id of its initial host.
    pub virtual_machines: Vec<DatasetVm>,
    /// Opaque network topology edges, retained but never consulted.
    #[serde(default)]
    pub network_topology: Vec<DatasetEdge>,
}

/// One server entry in the input dataset.
#[derive(Debug, Deserialize)]
pub struct DatasetServer {
    /// Stable id, unique within the dataset.
    pub id: ServerId,
    /// CPU capacity, in cores.
    pub cpu_capacity: u64,
    /// Memory capacity, in GiB.
    pub memory_capacity: u64,
    /// Disk capacity, in GiB.
    pub disk_capacity: u64,
    /// Whether this server starts already patched.
    pub updated: bool,
    /// How long the patch itself takes once drained.
    pub patch_duration: u64,
    /// How long the post-patch sanity check takes.
    pub sanity_check_duration: u64,
    /// Ids of the VMs this server initially hosts, in hosting order.
    pub virtual_machines: Vec<VmId>,
}

/// One VM entry in the input dataset.
#[derive(Debug, Deserialize)]
pub struct DatasetVm {
    /// Stable id, unique within the dataset.
    pub id: VmId,
    /// CPU demand, in cores.
    pub cpu_demand: u64,
    /// Memory demand, in GiB.
    pub memory_demand: u64,
    /// Disk demand, in GiB.
    pub disk_demand: u64,
    /// The id of the server this VM is initially hosted on; must match a server whose
    /// `virtual_machines` lists this VM's id.
    pub server: ServerId,
}

/// One opaque network topology edge.
#[derive(Debug, Deserialize)]
pub struct DatasetEdge {
    /// Edge endpoints, in whatever shape the dataset used.
    pub nodes: serde_json::Value,
    /// Edge bandwidth, in the dataset's own units.
    pub bandwidth: u64,
}

/// Reads and parses a dataset JSON file. Does not validate cross-references; see
/// [`build_world`] for that.
pub fn read_file(path: &str) -> Result<Dataset, SimError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SimError::MalformedDataset(format!("can't read dataset file {path:?}: {e}")))?;
    serde_json::from_str(&text)
        .map_err(|e| SimError::MalformedDataset(format!("can't parse dataset JSON {path:?}: {e}")))
}

/// Validates a parsed [`Dataset`] and builds the [`World`] it describes.
///
/// Checks, in order: no duplicate server or VM ids; every VM is listed under exactly one
/// server's `virtual_machines`, and that server matches the VM's own `server` field; every VM's
/// `server` field resolves to a known server; no server's computed demand exceeds its capacity.
/// Any failure returns [`SimError::MalformedDataset`] describing which entity failed which
/// check.
pub fn build_world(dataset: Dataset, constants: Constants) -> Result<World, SimError> {
    let mut seen_server_ids = HashSet::new();
    for s in &dataset.servers {
        if !seen_server_ids.insert(s.id) {
            return Err(SimError::MalformedDataset(format!("duplicate server id {}", s.id)));
        }
    }
    let mut seen_vm_ids = HashSet::new();
    for vm in &dataset.virtual_machines {
        if !seen_vm_ids.insert(vm.id) {
            return Err(SimError::MalformedDataset(format!("duplicate vm id {}", vm.id)));
        }
    }

    let server_by_id: HashMap<ServerId, &DatasetServer> = dataset.servers.iter().map(|s| (s.id, s)).collect();
    let vm_by_id: HashMap<VmId, &DatasetVm> = dataset.virtual_machines.iter().map(|v| (v.id, v)).collect();

    let mut listed_host: HashMap<VmId, ServerId> = HashMap::new();
    for s in &dataset.servers {
        for &vm_id in &s.virtual_machines {
            if let Some(&prev) = listed_host.get(&vm_id) {
                return Err(SimError::MalformedDataset(format!(
                    "vm {vm_id} is listed under both server {prev} and server {}",
                    s.id
                )));
            }
            listed_host.insert(vm_id, s.id);
        }
    }
    for vm in &dataset.virtual_machines {
        if !server_by_id.contains_key(&vm.server) {
            return Err(SimError::MalformedDataset(format!(
                "vm {} references unknown host server {}",
                vm.id, vm.server
            )));
        }
        match listed_host.get(&vm.id) {
            None => {
                return Err(SimError::MalformedDataset(format!(
                    "vm {} is not listed under any server's virtual_machines",
                    vm.id
                )))
            }
            Some(&host) if host != vm.server => {
                return Err(SimError::MalformedDataset(format!(
                    "vm {} declares host server {} but is listed under server {}'s virtual_machines",
                    vm.id, vm.server, host
                )))
            }
            _ => {}
        }
    }

    let mut servers = Vec::with_capacity(dataset.servers.len());
    for s in &dataset.servers {
        let mut demand = Resources::ZERO;
        let mut hosted = IndexSet::new();
        for &vm_id in &s.virtual_machines {
            let vm = vm_by_id
                .get(&vm_id)
                .ok_or_else(|| SimError::MalformedDataset(format!("server {} lists unknown vm {vm_id}", s.id)))?;
            demand.add_assign(Resources {
                cpu: vm.cpu_demand,
                memory: vm.memory_demand,
                disk: vm.disk_demand,
            });
            hosted.insert(vm_id);
        }
        let capacity = Resources {
            cpu: s.cpu_capacity,
            memory: s.memory_capacity,
            disk: s.disk_capacity,
        };
        if !capacity.covers(demand) {
            return Err(SimError::MalformedDataset(format!(
                "server {} initial demand exceeds its capacity",
                s.id
            )));
        }
        servers.push(Server {
            id: s.id,
            capacity,
            demand,
            updated: s.updated,
            update_step: None,
            patch_duration: s.patch_duration,
            sanity_check_duration: s.sanity_check_duration,
            hosted,
        });
    }

    let vms = dataset
        .virtual_machines
        .iter()
        .map(|vm| VirtualMachine {
            id: vm.id,
            demand: Resources {
                cpu: vm.cpu_demand,
                memory: vm.memory_demand,
                disk: vm.disk_demand,
            },
            host: vm.server,
            migration_log: Vec::new(),
        })
        .collect();

    let network_topology = dataset
        .network_topology
        .into_iter()
        .map(|e| NetworkEdge {
            nodes: e.nodes,
            bandwidth: e.bandwidth,
        })
        .collect();

    Ok(World::from_entities(servers, vms, network_topology, constants))
}

/// Reads a dataset file and builds its [`World`] in one step.
pub fn load_file(path: &str, constants: Constants) -> Result<World, SimError> {
    build_world(read_file(path)?, constants)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        serde_json::from_str(
            r#"{
                "servers": [
                    {"id": 1, "cpu_capacity": 4, "memory_capacity": 4, "disk_capacity": 32,
                     "updated": false, "patch_duration": 300, "sanity_check_duration": 600,
                     "virtual_machines": [10]},
                    {"id": 2, "cpu_capacity": 4, "memory_capacity": 4, "disk_capacity": 32,
                     "updated": false, "patch_duration": 300, "sanity_check_duration": 600,
                     "virtual_machines": []}
                ],
                "virtual_machines": [
                    {"id": 10, "cpu_demand": 1, "memory_demand": 1, "disk_demand": 8, "server": 1}
                ],
                "network_topology": []
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn loads_a_valid_dataset() {
        let world = build_world(sample(), Constants::new()).unwrap();
        assert_eq!(world.server_count(), 2);
        assert_eq!(world.server(1).demand, Resources { cpu: 1, memory: 1, disk: 8 });
        assert!(world.server(2).is_empty());
    }

    #[test]
    fn rejects_dangling_vm_reference() {
        let mut dataset = sample();
        dataset.virtual_machines[0].server = 99;
        let err = build_world(dataset, Constants::new()).unwrap_err();
        assert!(matches!(err, SimError::MalformedDataset(_)));
    }

    #[test]
    fn rejects_vm_listed_under_two_servers() {
        let mut dataset = sample();
        dataset.servers[1].virtual_machines.push(10);
        let err = build_world(dataset, Constants::new()).unwrap_err();
        assert!(matches!(err, SimError::MalformedDataset(_)));
    }

    #[test]
    fn rejects_demand_exceeding_capacity() {
        let mut dataset = sample();
        dataset.virtual_machines[0].disk_demand = 1000;
        let err = build_world(dataset, Constants::new()).unwrap_err();
        assert!(matches!(err, SimError::MalformedDataset(_)));
    }
}
