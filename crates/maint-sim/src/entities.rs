//! The Server and VirtualMachine resource model, and the migration log entries they share.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::resources::Resources;

/// Stable server identifier, as assigned by the dataset.
pub type ServerId = u32;

/// Stable VM identifier, as assigned by the dataset.
pub type VmId = u32;

/// A physical server: fixed capacity, mutable demand tracking its hosted VMs, and patch state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    /// Stable identifier, unique within a [`World`](crate::world::World).
    pub id: ServerId,
    /// Fixed resource capacity.
    pub capacity: Resources,
    /// Current demand: the sum of every hosted VM's demand. Kept in sync by
    /// [`World::migrate`](crate::world::World::migrate) and dataset loading; never mutated
    /// directly outside those paths.
    pub demand: Resources,
    /// Whether this server has already received its patch.
    pub updated: bool,
    /// The maintenance step during which this server was patched, if any.
    pub update_step: Option<u32>,
    /// How long applying the patch itself takes, once drained.
    pub patch_duration: u64,
    /// How long the post-patch sanity check takes.
    pub sanity_check_duration: u64,
    /// The VMs currently hosted here, in the order they were most recently placed (initial
    /// dataset order, then migration-in order). This is the order non-gated strategies use when
    /// choosing which VM to move first.
    pub hosted: IndexSet<VmId>,
}

impl Server {
    /// Geometric mean of the three capacity components. Used for strategy tie-breaking
    /// (e.g. salus's update-cost formula); independent of current demand.
    pub fn capacity_score(&self) -> f64 {
        self.capacity.geometric_mean()
    }

    /// Geometric mean of the three demand components, zero-propagating.
    pub fn overall_demand(&self) -> f64 {
        self.demand.geometric_mean()
    }

    /// Mean of per-resource usage percentages, as a value in `[0, 100]`.
    pub fn occupation_rate(&self) -> f64 {
        let pct = |used: u64, total: u64| (used as f64) * 100.0 / (total as f64);
        (pct(self.demand.cpu, self.capacity.cpu)
            + pct(self.demand.memory, self.capacity.memory)
            + pct(self.demand.disk, self.capacity.disk))
            / 3.0
    }

    /// True iff adding `vm_demand` to the current demand would not exceed capacity, for every
    /// resource.
    pub fn has_capacity_to_host(&self, vm_demand: Resources) -> bool {
        let mut projected = self.demand;
        projected.add_assign(vm_demand);
        self.capacity.covers(projected)
    }

    /// True iff this server currently hosts no VMs.
    pub fn is_empty(&self) -> bool {
        self.hosted.is_empty()
    }
}

/// A virtual machine: fixed demand, a current host, and its append-only migration history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualMachine {
    /// Stable identifier, unique within a [`World`](crate::world::World).
    pub id: VmId,
    /// Fixed resource demand.
    pub demand: Resources,
    /// The server currently hosting this VM. Never absent once the dataset has loaded.
    pub host: ServerId,
    /// Every migration this VM has undergone, oldest first.
    pub migration_log: Vec<MigrationRecord>,
}

/// One entry in a VM's migration log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// The maintenance step during which this migration was committed.
    pub maintenance_step: u32,
    /// How long the migration took, in ticks.
    pub duration: u64,
    /// The server the VM moved off of.
    pub origin: ServerId,
    /// The server the VM moved onto.
    pub destination: ServerId,
}

impl VirtualMachine {
    /// `SAVE_TIME + floor((memory_GiB * 1024 + disk_GiB * 1024) / NETWORK_BW) + RESTORE_TIME`.
    ///
    /// Deterministic: depends only on this VM's demand and the process-wide constants.
    pub fn migration_time(&self, save_time: u64, restore_time: u64, network_bw: u64) -> u64 {
        let transferred_mib = self.demand.memory * 1024 + self.demand.disk * 1024;
        save_time + transferred_mib / network_bw + restore_time
    }
}
