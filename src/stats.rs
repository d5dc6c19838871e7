use std::fmt;

use crate::error::{Error, Result};
use crate::process::Process;
use crate::trace::Trace;

/// Summary figures over a set of process records.
///
/// Averages run over the whole set. A record that has not finished yet
/// counts as 0 for every metric, so a partially finished set still averages
/// over its full size. Nothing here mutates the records.
#[derive(Debug, Clone, Copy)]
pub struct Statistics<'a> {
    processes: &'a [Process],
    trace: Option<&'a Trace>,
}

impl<'a> Statistics<'a> {
    pub fn new(processes: Option<&'a [Process]>) -> Result<Self> {
        let processes = processes.ok_or(Error::InvalidArgument("processes list cannot be absent"))?;
        Ok(Statistics {
            processes,
            trace: None,
        })
    }

    /// Adds the run's trace, which enables makespan, utilization and throughput.
    pub fn with_trace(mut self, trace: &'a Trace) -> Self {
        self.trace = Some(trace);
        self
    }

    fn average(&self, metric: impl Fn(&Process) -> Option<usize>) -> f64 {
        if self.processes.is_empty() {
            return 0.0;
        }
        let total: usize = self.processes.iter().map(|p| metric(p).unwrap_or(0)).sum();
        total as f64 / self.processes.len() as f64
    }

    pub fn average_waiting_time(&self) -> f64 {
        self.average(Process::waiting_time)
    }

    pub fn average_turnaround_time(&self) -> f64 {
        self.average(Process::turnaround_time)
    }

    pub fn average_completion_time(&self) -> f64 {
        self.average(Process::completion_time)
    }

    pub fn max_waiting_time(&self) -> usize {
        self.processes
            .iter()
            .filter_map(Process::waiting_time)
            .max()
            .unwrap_or(0)
    }

    pub fn finished(&self) -> usize {
        self.processes.iter().filter(|p| p.is_finished()).count()
    }

    pub fn makespan(&self) -> Option<usize> {
        self.trace.map(Trace::end)
    }

    /// Busy time over makespan, `None` without a trace or for an empty run.
    pub fn cpu_utilization(&self) -> Option<f64> {
        let trace = self.trace?;
        if trace.end() == 0 {
            return None;
        }
        Some(trace.busy_time() as f64 / trace.end() as f64)
    }

    /// Finished processes per unit of simulated time.
    pub fn throughput(&self) -> Option<f64> {
        let makespan = self.makespan().filter(|&end| end > 0)?;
        Some(self.finished() as f64 / makespan as f64)
    }
}

impl fmt::Display for Statistics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Processes: {} ({} finished)", self.processes.len(), self.finished())?;
        writeln!(f, "Average Waiting Time: {:.2}", self.average_waiting_time())?;
        writeln!(f, "Average Turnaround Time: {:.2}", self.average_turnaround_time())?;
        write!(f, "Average Completion Time: {:.2}", self.average_completion_time())?;
        if let (Some(makespan), Some(util), Some(tput)) =
            (self.makespan(), self.cpu_utilization(), self.throughput())
        {
            writeln!(f)?;
            writeln!(f, "Max Waiting Time: {}", self.max_waiting_time())?;
            writeln!(f, "Makespan: {}", makespan)?;
            writeln!(f, "CPU Utilization: {:.2}%", util * 100.0)?;
            write!(f, "Throughput: {:.4} processes/unit", tput)?;
        }
        Ok(())
    }
}
