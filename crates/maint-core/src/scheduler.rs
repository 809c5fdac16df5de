//! The discrete-event kernel: virtual clock, cooperative processes, timeouts.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// Simulated time, in whole ticks.
pub type Tick = u64;

/// Process identifier, assigned in spawn order.
///
/// Used to break ties between timeouts due at the same simulated instant: the process spawned
/// earlier wins.
pub type ProcessId = u64;

/// Outcome of resuming a [`Process`] for one scheduling quantum.
pub enum Poll {
    /// The process suspended itself, asking to be resumed after `Tick` ticks of simulated time
    /// elapse relative to when it next gets the CPU.
    Suspended(Tick),
    /// The process has no further work.
    Completed,
}

/// A cooperative routine multiplexed by the [`Scheduler`].
///
/// A process alternates between running synchronously (inside [`resume`](Process::resume)) and
/// suspending on a timeout. The kernel does not care what a process does while it runs, only
/// what [`Poll`] it returns.
pub trait Process {
    /// Resumes this process. Called once per scheduling quantum; a process that returned
    /// [`Poll::Suspended`] will be resumed again once its timeout elapses.
    fn resume(&mut self) -> Poll;
}

struct Wakeup {
    at: Tick,
    id: ProcessId,
}

impl PartialEq for Wakeup {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.id == other.id
    }
}

impl Eq for Wakeup {}

impl Ord for Wakeup {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse both fields so earliest time, then earliest spawn,
        // sorts to the top.
        other.at.cmp(&self.at).then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Wakeup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Drives a set of [`Process`] trait objects over an integer virtual clock.
///
/// The scheduler is domain-agnostic: it is exercised directly by the unit tests below using
/// throwaway processes, independent of any resource-model fixture.
#[derive(Default)]
pub struct Scheduler {
    now: Tick,
    processes: Vec<Option<Box<dyn Process>>>,
    ready: VecDeque<ProcessId>,
    waiting: BinaryHeap<Wakeup>,
    next_id: ProcessId,
}

impl Scheduler {
    /// Creates a scheduler with its virtual clock at 0 and no processes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the virtual clock.
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Registers a process and marks it ready for the next [`run`](Scheduler::run) call.
    ///
    /// Returns the assigned id, which determines this process's tie-break priority against
    /// others spawned later but due at the same wakeup time.
    pub fn spawn(&mut self, process: Box<dyn Process>) -> ProcessId {
        let id = self.next_id;
        self.next_id += 1;
        self.processes.push(Some(process));
        self.ready.push_back(id);
        id
    }

    /// Drives every spawned process to completion, advancing `now` as timeouts require.
    ///
    /// Ready processes are resumed FIFO; when none are ready, the earliest pending wakeup
    /// fires, `now` advances to it, and every process due at that instant becomes ready, in
    /// spawn order. Returns once both the ready queue and the wakeup heap are empty.
    pub fn run(&mut self) {
        loop {
            while let Some(id) = self.ready.pop_front() {
                let Some(slot) = self.processes.get_mut(id as usize) else {
                    continue;
                };
                let Some(mut process) = slot.take() else {
                    continue;
                };
                match process.resume() {
                    Poll::Suspended(d) => {
                        self.waiting.push(Wakeup { at: self.now + d, id });
                        self.processes[id as usize] = Some(process);
                    }
                    Poll::Completed => {}
                }
            }
            let Some(next) = self.waiting.pop() else {
                break;
            };
            self.now = next.at;
            self.ready.push_back(next.id);
            while let Some(peek) = self.waiting.peek() {
                if peek.at != self.now {
                    break;
                }
                let due = self.waiting.pop().unwrap();
                self.ready.push_back(due.id);
            }
        }
    }
}

/// A fixed point in virtual time, for log call sites that need a `.now()`-shaped clock but run
/// outside a live [`Scheduler`] (e.g. a caller logging at the start of a step, before that step's
/// scheduler exists).
pub struct ClockAt(pub Tick);

impl ClockAt {
    /// The fixed tick this clock reports.
    pub fn now(&self) -> Tick {
        self.0
    }
}

/// A process whose yields are computed eagerly and replayed by the scheduler.
///
/// `maint-sim` uses this to drive a maintenance phase's precomputed timeouts through a real
/// scheduler: the domain decision logic runs once, up front (bookkeeping is atomic with respect
/// to the scheduler), and the resulting sequence of durations is handed here to be replayed one
/// at a time, each as its own suspend/resume quantum.
pub struct Scripted {
    remaining: VecDeque<Tick>,
}

impl Scripted {
    /// Creates a process that yields each duration in `timeouts`, in order, then completes.
    pub fn new(timeouts: impl IntoIterator<Item = Tick>) -> Self {
        Self {
            remaining: timeouts.into_iter().collect(),
        }
    }
}

impl Process for Scripted {
    fn resume(&mut self) -> Poll {
        match self.remaining.pop_front() {
            Some(d) => Poll::Suspended(d),
            None => Poll::Completed,
        }
    }
}
