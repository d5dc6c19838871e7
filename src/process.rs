use crate::error::{Error, Result};

/// Latest accepted arrival time.
pub const MAX_ARRIVAL_TIME: usize = 1_000_000;
/// Longest accepted burst.
pub const MAX_BURST_TIME: usize = 1_000_000;

/// One schedulable unit.
///
/// `pid`, `arrival_time`, `burst_time` and `priority` are fixed at creation.
/// The remaining fields are simulation state: a policy resets them when it
/// takes the record and fills in the three metrics once the process finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pid: usize,
    arrival_time: usize,
    burst_time: usize,
    // lower value wins
    priority: i32,

    remaining_burst_time: usize,

    // stats
    completion_time: Option<usize>,
    turnaround_time: Option<usize>,
    waiting_time: Option<usize>,
}

impl Process {
    pub fn new(pid: usize, arrival_time: usize, burst_time: usize, priority: i32) -> Result<Self> {
        if burst_time == 0 {
            return Err(Error::InvalidProcess {
                pid,
                reason: "burst time must be greater than zero",
            });
        }
        if arrival_time > MAX_ARRIVAL_TIME {
            return Err(Error::InvalidProcess {
                pid,
                reason: "arrival time is beyond the simulated horizon",
            });
        }
        if burst_time > MAX_BURST_TIME {
            return Err(Error::InvalidProcess {
                pid,
                reason: "burst time is beyond the simulated horizon",
            });
        }

        Ok(Process {
            pid,
            arrival_time,
            burst_time,
            priority,
            remaining_burst_time: burst_time,
            completion_time: None,
            turnaround_time: None,
            waiting_time: None,
        })
    }

    pub fn pid(&self) -> usize {
        self.pid
    }

    pub fn arrival_time(&self) -> usize {
        self.arrival_time
    }

    pub fn burst_time(&self) -> usize {
        self.burst_time
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn remaining_burst_time(&self) -> usize {
        self.remaining_burst_time
    }

    pub fn completion_time(&self) -> Option<usize> {
        self.completion_time
    }

    pub fn turnaround_time(&self) -> Option<usize> {
        self.turnaround_time
    }

    pub fn waiting_time(&self) -> Option<usize> {
        self.waiting_time
    }

    pub fn is_finished(&self) -> bool {
        self.completion_time.is_some()
    }

    pub fn has_arrived(&self, clock: usize) -> bool {
        self.arrival_time <= clock
    }

    /// Puts back metrics read from a saved record.
    ///
    /// They must agree with each other: `turnaround = completion - arrival`
    /// and `waiting = turnaround - burst`.
    pub(crate) fn restore_metrics(
        &mut self,
        completion: usize,
        turnaround: usize,
        waiting: usize,
    ) -> Result<()> {
        let consistent = completion.checked_sub(self.arrival_time) == Some(turnaround)
            && turnaround.checked_sub(self.burst_time) == Some(waiting);
        if !consistent {
            return Err(Error::InvalidProcess {
                pid: self.pid,
                reason: "saved metrics do not match arrival and burst time",
            });
        }

        self.remaining_burst_time = 0;
        self.completion_time = Some(completion);
        self.turnaround_time = Some(turnaround);
        self.waiting_time = Some(waiting);
        Ok(())
    }

    /// Clears the simulation state before a policy run.
    pub(crate) fn reset(&mut self) {
        self.remaining_burst_time = self.burst_time;
        self.completion_time = None;
        self.turnaround_time = None;
        self.waiting_time = None;
    }

    /// Executes the process for `units` ticks, never past its remaining time.
    /// Returns the ticks actually executed.
    pub(crate) fn execute(&mut self, units: usize) -> usize {
        let executed = units.min(self.remaining_burst_time);
        self.remaining_burst_time -= executed;
        executed
    }

    /// Fixes the metrics of a process that completed at `clock`.
    ///
    /// Turnaround and waiting saturate at zero. That only matters for the
    /// ungated round robin, which can run a process before it arrives.
    pub(crate) fn finish(&mut self, clock: usize) {
        debug_assert!(self.completion_time.is_none(), "P{} finished twice", self.pid);

        let turnaround = clock.saturating_sub(self.arrival_time);
        self.remaining_burst_time = 0;
        self.completion_time = Some(clock);
        self.turnaround_time = Some(turnaround);
        self.waiting_time = Some(turnaround.saturating_sub(self.burst_time));
    }
}
