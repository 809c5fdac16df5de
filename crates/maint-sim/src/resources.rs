//! The three resources every server and VM is measured in.

use serde::{Deserialize, Serialize};

/// A CPU/memory/disk triple, in cores and GiB respectively.
///
/// Used both for a server's capacity (immutable after load) and for a server's or VM's demand
/// (mutable, for servers; fixed, for VMs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    /// CPU cores.
    pub cpu: u64,
    /// Memory, in GiB.
    pub memory: u64,
    /// Disk, in GiB.
    pub disk: u64,
}

impl Resources {
    /// A zero-valued triple.
    pub const ZERO: Resources = Resources {
        cpu: 0,
        memory: 0,
        disk: 0,
    };

    /// Adds `other` in place, component-wise.
    pub fn add_assign(&mut self, other: Resources) {
        self.cpu += other.cpu;
        self.memory += other.memory;
        self.disk += other.disk;
    }

    /// Subtracts `other` in place, component-wise.
    ///
    /// Panics (debug builds) on underflow: callers must never subtract more than a server's
    /// current demand, which would mean a hosted-set/demand desync.
    pub fn sub_assign(&mut self, other: Resources) {
        self.cpu -= other.cpu;
        self.memory -= other.memory;
        self.disk -= other.disk;
    }

    /// True iff every resource in `self` is at least `other`'s.
    pub fn covers(&self, other: Resources) -> bool {
        self.cpu >= other.cpu && self.memory >= other.memory && self.disk >= other.disk
    }

    /// Geometric mean of the three components, as `(cpu * memory * disk)^(1/3)`.
    ///
    /// Zero-propagating: if any component is zero, the result is zero. This is the reference
    /// convention named in the Open Questions (one of several defensible conventions; see
    /// DESIGN.md).
    pub fn geometric_mean(&self) -> f64 {
        let product = (self.cpu as f64) * (self.memory as f64) * (self.disk as f64);
        product.cbrt()
    }
}
