use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use regex::Regex;

use crate::error::Error;
use crate::process::Process;
use crate::trace::{Slot, Trace};
use crate::{q_trace, v_trace};

/// Outcome of one run: every record carries its metrics, sorted by pid.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub processes: Vec<Process>,
    pub trace: Trace,
}

impl Schedule {
    fn new(mut processes: Vec<Process>, trace: Trace) -> Self {
        processes.sort_by_key(Process::pid);
        Schedule { processes, trace }
    }
}

/// A scheduling policy.
///
/// `schedule` takes the records by value, so one record set can never be
/// inside two runs at once.
pub trait Scheduler {
    fn name(&self) -> &'static str;
    fn schedule(&self, processes: Vec<Process>) -> Schedule;
}

/// Longest run a policy is asked to simulate.
pub const MAX_HORIZON: usize = 10_000_000;

/// Upper bound on the end of any run over `processes`: the latest arrival
/// plus every burst. Fails past [`MAX_HORIZON`].
pub fn check_horizon(processes: &[Process]) -> crate::error::Result<usize> {
    let latest = processes.iter().map(Process::arrival_time).max().unwrap_or(0);
    processes
        .iter()
        .try_fold(latest, |end, p| end.checked_add(p.burst_time()))
        .filter(|&end| end <= MAX_HORIZON)
        .ok_or(Error::InvalidArgument("workload runs past the simulated horizon"))
}

fn prepare(mut processes: Vec<Process>) -> Vec<Process> {
    for p in processes.iter_mut() {
        p.reset();
    }
    processes
}

// renders the eligible set for q_trace
fn ready_list<K: fmt::Display>(
    processes: &[Process],
    eligible: impl Fn(&Process) -> bool,
    key: impl Fn(&Process) -> K,
) -> String {
    processes
        .iter()
        .filter(|p| eligible(p))
        .map(|p| format!("P{}:{}", p.pid(), key(p)))
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Fcfs;

impl Scheduler for Fcfs {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn schedule(&self, processes: Vec<Process>) -> Schedule {
        let mut processes = prepare(processes);
        processes.sort_by_key(|p| (p.arrival_time(), p.pid()));

        let mut trace = Trace::new();
        let mut clock = 0;
        for p in processes.iter_mut() {
            if clock < p.arrival_time() {
                v_trace!("{}: idle until {}", clock, p.arrival_time());
                trace.push(Slot::Idle, clock, p.arrival_time());
                clock = p.arrival_time();
            }

            v_trace!(
                "{}: run P{} (arrival {}, burst {})",
                clock,
                p.pid(),
                p.arrival_time(),
                p.burst_time()
            );
            let burst = p.execute(p.burst_time());
            trace.push(Slot::Process(p.pid()), clock, clock + burst);
            clock += burst;
            p.finish(clock);
        }

        Schedule::new(processes, trace)
    }
}

/// Round robin with a fixed time quantum.
///
/// With the arrival gate on, a process joins the rotation only once the
/// clock has reached its arrival; arrivals during a slice queue up ahead of
/// the preempted process. Without it every process is in the rotation from
/// time 0, in input order.
pub struct RoundRobin {
    quantum: NonZeroUsize,
    arrival_gate: bool,
}

impl RoundRobin {
    pub fn new(quantum: NonZeroUsize) -> Self {
        RoundRobin {
            quantum,
            arrival_gate: true,
        }
    }

    /// Rotation that ignores arrival times.
    pub fn ungated(quantum: NonZeroUsize) -> Self {
        RoundRobin {
            quantum,
            arrival_gate: false,
        }
    }

    pub fn quantum(&self) -> NonZeroUsize {
        self.quantum
    }

    fn admit(
        processes: &[Process],
        pending: &mut VecDeque<usize>,
        queue: &mut VecDeque<usize>,
        clock: usize,
    ) {
        while let Some(&idx) = pending.front() {
            if !processes[idx].has_arrived(clock) {
                break;
            }
            v_trace!("{}: P{} arrives", clock, processes[idx].pid());
            queue.push_back(idx);
            pending.pop_front();
        }
    }
}

impl Scheduler for RoundRobin {
    fn name(&self) -> &'static str {
        "Round Robin"
    }

    fn schedule(&self, processes: Vec<Process>) -> Schedule {
        let mut processes = prepare(processes);
        let mut trace = Trace::new();
        let mut clock = 0;

        let mut queue: VecDeque<usize> = VecDeque::new();
        let mut pending: VecDeque<usize> = VecDeque::new();
        if self.arrival_gate {
            let mut order: Vec<usize> = (0..processes.len()).collect();
            order.sort_by_key(|&idx| (processes[idx].arrival_time(), processes[idx].pid()));
            pending.extend(order);
            Self::admit(&processes, &mut pending, &mut queue, clock);
        } else {
            queue.extend(0..processes.len());
        }

        loop {
            let idx = match queue.pop_front() {
                Some(idx) => idx,
                None => match pending.front() {
                    Some(&next) => {
                        let arrival = processes[next].arrival_time();
                        v_trace!("{}: idle until {}", clock, arrival);
                        trace.push(Slot::Idle, clock, arrival);
                        clock = arrival;
                        Self::admit(&processes, &mut pending, &mut queue, clock);
                        continue;
                    }
                    None => break,
                },
            };

            q_trace!(
                "\tRotation: ({}) --> P{}",
                queue
                    .iter()
                    .map(|&i| format!("P{}:{}", processes[i].pid(), processes[i].remaining_burst_time()))
                    .collect::<Vec<_>>()
                    .join(" "),
                processes[idx].pid()
            );

            let p = &mut processes[idx];
            v_trace!(
                "{}: run P{} (remaining {})",
                clock,
                p.pid(),
                p.remaining_burst_time()
            );
            let slice = p.execute(self.quantum.get());
            trace.push(Slot::Process(p.pid()), clock, clock + slice);
            clock += slice;

            let done = p.remaining_burst_time() == 0;
            if done {
                p.finish(clock);
                v_trace!("{}: P{} done", clock, p.pid());
            }

            Self::admit(&processes, &mut pending, &mut queue, clock);
            if !done {
                queue.push_back(idx);
            }
        }

        Schedule::new(processes, trace)
    }
}

// One tick at a time, always switching to the eligible process with the
// smallest key. Ties go to the lowest pid.
fn run_preemptive<K, F>(processes: Vec<Process>, key: F) -> Schedule
where
    K: Ord + fmt::Display,
    F: Fn(&Process) -> K,
{
    let mut processes = prepare(processes);
    let mut trace = Trace::new();
    let mut clock = 0;
    let mut left = processes.len();

    while left > 0 {
        let eligible = |p: &Process| p.has_arrived(clock) && p.remaining_burst_time() > 0;
        let next = processes
            .iter()
            .enumerate()
            .filter(|(_, p)| eligible(p))
            .min_by_key(|(_, p)| (key(p), p.pid()))
            .map(|(idx, _)| idx);
        q_trace!("\tReady: ({})", ready_list(&processes, eligible, &key));

        match next {
            Some(idx) => {
                let p = &mut processes[idx];
                v_trace!(
                    "{}: run P{} (key {}, remaining {})",
                    clock,
                    p.pid(),
                    key(p),
                    p.remaining_burst_time()
                );
                p.execute(1);
                trace.push(Slot::Process(p.pid()), clock, clock + 1);
                clock += 1;

                if p.remaining_burst_time() == 0 {
                    p.finish(clock);
                    v_trace!("{}: P{} done", clock, p.pid());
                    left -= 1;
                }
            }
            None => {
                v_trace!("{}: idle", clock);
                trace.push(Slot::Idle, clock, clock + 1);
                clock += 1;
            }
        }
    }

    Schedule::new(processes, trace)
}

// Picks the arrived process with the smallest key and runs it to completion.
fn run_non_preemptive<K, F>(processes: Vec<Process>, key: F) -> Schedule
where
    K: Ord + fmt::Display,
    F: Fn(&Process) -> K,
{
    let mut processes = prepare(processes);
    let mut trace = Trace::new();
    let mut clock = 0;
    let mut left = processes.len();

    while left > 0 {
        let eligible = |p: &Process| p.has_arrived(clock) && !p.is_finished();
        let next = processes
            .iter()
            .enumerate()
            .filter(|(_, p)| eligible(p))
            .min_by_key(|(_, p)| (key(p), p.pid()))
            .map(|(idx, _)| idx);
        q_trace!("\tReady: ({})", ready_list(&processes, eligible, &key));

        match next {
            Some(idx) => {
                let p = &mut processes[idx];
                v_trace!("{}: run P{} (key {})", clock, p.pid(), key(p));
                let burst = p.execute(p.burst_time());
                trace.push(Slot::Process(p.pid()), clock, clock + burst);
                clock += burst;
                p.finish(clock);
                left -= 1;
            }
            None => {
                v_trace!("{}: idle", clock);
                trace.push(Slot::Idle, clock, clock + 1);
                clock += 1;
            }
        }
    }

    Schedule::new(processes, trace)
}

/// Preemptive priority, re-evaluated every tick.
pub struct Priority;

impl Scheduler for Priority {
    fn name(&self) -> &'static str {
        "Priority (preemptive)"
    }

    fn schedule(&self, processes: Vec<Process>) -> Schedule {
        run_preemptive(processes, Process::priority)
    }
}

pub struct PriorityNonPreemptive;

impl Scheduler for PriorityNonPreemptive {
    fn name(&self) -> &'static str {
        "Priority (non-preemptive)"
    }

    fn schedule(&self, processes: Vec<Process>) -> Schedule {
        run_non_preemptive(processes, Process::priority)
    }
}

pub struct Sjf;

impl Scheduler for Sjf {
    fn name(&self) -> &'static str {
        "Shortest Job First"
    }

    fn schedule(&self, processes: Vec<Process>) -> Schedule {
        run_non_preemptive(processes, Process::burst_time)
    }
}

pub struct Srt;

impl Scheduler for Srt {
    fn name(&self) -> &'static str {
        "Shortest Remaining Time"
    }

    fn schedule(&self, processes: Vec<Process>) -> Schedule {
        run_preemptive(processes, Process::remaining_burst_time)
    }
}

/// Policy selector, written as `F`, `R<quantum>`, `P`, `N`, `J` or `S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Fcfs,
    RoundRobin(NonZeroUsize),
    Priority,
    PriorityNonPreemptive,
    Sjf,
    Srt,
}

impl Policy {
    pub fn scheduler(self, arrival_gate: bool) -> Box<dyn Scheduler> {
        match self {
            Policy::Fcfs => Box::new(Fcfs),
            Policy::RoundRobin(quantum) if arrival_gate => Box::new(RoundRobin::new(quantum)),
            Policy::RoundRobin(quantum) => Box::new(RoundRobin::ungated(quantum)),
            Policy::Priority => Box::new(Priority),
            Policy::PriorityNonPreemptive => Box::new(PriorityNonPreemptive),
            Policy::Sjf => Box::new(Sjf),
            Policy::Srt => Box::new(Srt),
        }
    }

    /// Default report file written after a run.
    pub fn report_file(self) -> &'static str {
        match self {
            Policy::Fcfs | Policy::RoundRobin(_) => "processes_with_gantt.txt",
            Policy::Priority | Policy::PriorityNonPreemptive => "priority_gantt.txt",
            Policy::Sjf => "sjf_gantt.txt",
            Policy::Srt => "srt_gantt.txt",
        }
    }
}

impl FromStr for Policy {
    type Err = Error;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidSpec(spec.to_string());
        let re = Regex::new(r"^(?:([FPNJS])|R(\d+))$").map_err(|_| invalid())?;
        let caps = re.captures(spec.trim()).ok_or_else(invalid)?;

        if let Some(quantum) = caps.get(2) {
            let quantum = quantum.as_str().parse().map_err(|_| invalid())?;
            return NonZeroUsize::new(quantum)
                .map(Policy::RoundRobin)
                .ok_or_else(invalid);
        }

        match caps.get(1).map(|m| m.as_str()) {
            Some("F") => Ok(Policy::Fcfs),
            Some("P") => Ok(Policy::Priority),
            Some("N") => Ok(Policy::PriorityNonPreemptive),
            Some("J") => Ok(Policy::Sjf),
            Some("S") => Ok(Policy::Srt),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Policy::Fcfs => write!(f, "F"),
            Policy::RoundRobin(quantum) => write!(f, "R{}", quantum),
            Policy::Priority => write!(f, "P"),
            Policy::PriorityNonPreemptive => write!(f, "N"),
            Policy::Sjf => write!(f, "J"),
            Policy::Srt => write!(f, "S"),
        }
    }
}
