#![warn(missing_docs)]
//! A minimal discrete-event scheduling kernel.
//!
//! This crate knows nothing about servers, virtual machines, or maintenance
//! strategies. It provides a [`Scheduler`](scheduler::Scheduler) that
//! multiplexes cooperative [`Process`](scheduler::Process) trait objects over
//! an integer virtual clock, honoring timeouts in earliest-deadline order
//! with ties broken by spawn order.

pub mod log;
pub mod scheduler;

pub use colored;
pub use scheduler::{ClockAt, Poll, Process, Scheduler, Scripted, Tick};
