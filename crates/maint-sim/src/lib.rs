#![warn(missing_docs)]
//! Discrete-event simulation of rolling data-center maintenance: patching every server in a
//! fleet exactly once while migrating VMs out of the way, under a choice of five placement
//! strategies.
//!
//! The simulation itself is built on [`maint_core`]'s scheduler: each maintenance step computes
//! its decisions eagerly against a [`World`](world::World), then replays the resulting timeouts
//! through a real [`maint_core::Scheduler`] so that the virtual clock, not wall time, governs
//! how the run unfolds.

pub mod config;
pub mod dataset;
pub mod entities;
pub mod error;
pub mod maintenance;
pub mod metrics;
pub mod placement;
pub mod resources;
pub mod strategies;
pub mod strategy;
pub mod world;

pub use config::Constants;
pub use dataset::{load_file, Dataset};
pub use entities::{Server, ServerId, VirtualMachine, VmId};
pub use error::SimError;
pub use maintenance::{run, RunOutcome};
pub use metrics::OverallMetrics;
pub use resources::Resources;
pub use strategy::MigrationPolicy;
pub use world::World;
