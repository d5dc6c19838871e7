use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use crate::c_trace;
use crate::error::Result;
use crate::process::Process;
use crate::rand_generator::RandGenerator;
use crate::schedulers::{check_horizon, Policy, Schedule};
use crate::stats::Statistics;
use crate::utils;

/// File that manual entry and generation save to.
pub const DEFAULT_PROCESS_FILE: &str = "processes.txt";

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Round robin only admits processes that have arrived.
    pub arrival_gate: bool,
    /// Pause between replayed segments. Cosmetic only.
    pub delay: Duration,
    /// Report path, instead of the policy's default file.
    pub output: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            arrival_gate: true,
            delay: Duration::ZERO,
            output: None,
        }
    }
}

fn replay<W: Write>(out: &mut W, schedule: &Schedule, delay: Duration) -> Result<()> {
    for seg in schedule.trace.merged().segments() {
        writeln!(out, "At time {}ms, {} runs until {}ms", seg.start, seg.slot, seg.end)?;
        thread::sleep(delay);
    }
    Ok(())
}

/// Runs one policy over `processes`, prints the chart and writes the report.
///
/// A workload that would run past the simulated horizon is refused before
/// anything runs. A report that cannot be written is reported on `out`; the
/// schedule is returned either way.
pub fn run_simulation<W: Write>(
    out: &mut W,
    policy: Policy,
    processes: Vec<Process>,
    options: &RunOptions,
) -> Result<Schedule> {
    check_horizon(&processes)?;
    let scheduler = policy.scheduler(options.arrival_gate);
    writeln!(out, "\nStarting {} Scheduling...", scheduler.name())?;

    let schedule = scheduler.schedule(processes);
    if !options.delay.is_zero() {
        replay(out, &schedule, options.delay)?;
    }
    writeln!(out, "Gantt Chart: {}", schedule.trace)?;
    c_trace!("Timeline: {}", schedule.trace.merged().timeline());

    let report = options
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(policy.report_file()));
    match utils::write_report(&report, scheduler.name(), &schedule) {
        Ok(()) => writeln!(
            out,
            "Process information and Gantt chart saved to file: {}",
            report.display()
        )?,
        Err(err) => writeln!(out, "Error saving processes to file: {}", err)?,
    }

    Ok(schedule)
}

/// The numbered interactive menu.
pub struct Menu<R, W> {
    input: R,
    out: W,
    tokens: VecDeque<String>,
    processes: Vec<Process>,
    last_run: Option<(Policy, Schedule)>,
    options: RunOptions,
    generator: RandGenerator,
    process_file: PathBuf,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, out: W, options: RunOptions, generator: RandGenerator) -> Self {
        Menu {
            input,
            out,
            tokens: VecDeque::new(),
            processes: Vec::new(),
            last_run: None,
            options,
            generator,
            process_file: PathBuf::from(DEFAULT_PROCESS_FILE),
        }
    }

    pub fn with_processes(mut self, processes: Vec<Process>) -> Self {
        self.processes = processes;
        self
    }

    pub fn with_process_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.process_file = path.into();
        self
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    fn prompt(&mut self, text: &str) -> Result<()> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(())
    }

    // whitespace-separated tokens across lines; None at end of input
    fn next_token(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                return Ok(Some(token));
            }
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.tokens
                .extend(line.split_whitespace().map(str::to_string));
        }
    }

    fn read_number<T: FromStr>(&mut self) -> Result<Option<T>> {
        while let Some(token) = self.next_token()? {
            match token.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(self.out, "Invalid input. Please enter a valid number.")?,
            }
        }
        Ok(None)
    }

    fn autosave(&mut self, done: &str) -> Result<()> {
        match utils::write_processes(&self.process_file, &self.processes) {
            Ok(()) => writeln!(self.out, "{}", done)?,
            Err(err) => writeln!(self.out, "Error saving process to file: {}", err)?,
        }
        Ok(())
    }

    /// Serves the menu until the exit option or the end of input.
    pub fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.out, "\nSelect an option:")?;
            writeln!(self.out, "1. Add Process")?;
            writeln!(self.out, "2. Load Processes from File")?;
            writeln!(self.out, "3. Save Processes to File")?;
            writeln!(self.out, "4. Generate Random Processes")?;
            writeln!(self.out, "5. Run Scheduler")?;
            writeln!(self.out, "6. View Statistics")?;
            writeln!(self.out, "7. Exit")?;

            let Some(choice) = self.read_number::<usize>()? else {
                return Ok(());
            };
            let keep_going = match choice {
                1 => self.add_process()?,
                2 => self.load()?,
                3 => self.save()?,
                4 => self.generate()?,
                5 => self.run_scheduler()?,
                6 => self.show_statistics()?,
                7 => {
                    writeln!(self.out, "Exiting the program...")?;
                    false
                }
                _ => {
                    writeln!(self.out, "Invalid option. Try again.")?;
                    true
                }
            };
            if !keep_going {
                return Ok(());
            }
        }
    }

    fn add_process(&mut self) -> Result<bool> {
        self.prompt("Enter PID, Arrival Time, Burst Time, Priority: ")?;
        let Some(pid) = self.read_number::<usize>()? else {
            return Ok(false);
        };
        let Some(arrival) = self.read_number::<usize>()? else {
            return Ok(false);
        };
        let Some(burst) = self.read_number::<usize>()? else {
            return Ok(false);
        };
        let Some(priority) = self.read_number::<i32>()? else {
            return Ok(false);
        };

        if self.processes.iter().any(|p| p.pid() == pid) {
            writeln!(self.out, "Process P{} already exists.", pid)?;
            return Ok(true);
        }
        match Process::new(pid, arrival, burst, priority) {
            Ok(process) => {
                self.processes.push(process);
                self.last_run = None;
                self.autosave("Process added and saved to file.")?;
            }
            Err(err) => writeln!(self.out, "Invalid process: {}", err)?,
        }
        Ok(true)
    }

    fn load(&mut self) -> Result<bool> {
        self.prompt("Enter filename to load processes from: ")?;
        let Some(filename) = self.next_token()? else {
            return Ok(false);
        };
        match utils::read_input_file(&filename) {
            Ok(processes) => {
                self.processes = processes;
                self.last_run = None;
                writeln!(self.out, "Processes loaded successfully!")?;
            }
            Err(err) => writeln!(self.out, "Error loading file: {}", err)?,
        }
        Ok(true)
    }

    fn save(&mut self) -> Result<bool> {
        self.prompt("Enter filename to save processes: ")?;
        let Some(filename) = self.next_token()? else {
            return Ok(false);
        };
        match utils::write_processes(&filename, &self.processes) {
            Ok(()) => writeln!(self.out, "Processes saved successfully!")?,
            Err(err) => writeln!(self.out, "Error saving file: {}", err)?,
        }
        Ok(true)
    }

    fn generate(&mut self) -> Result<bool> {
        self.prompt("Enter the number of processes to generate: ")?;
        let Some(count) = self.read_number::<usize>()? else {
            return Ok(false);
        };
        // pids restart at 1, so the generated set replaces the current one
        match self.generator.generate(count) {
            Ok(processes) => {
                self.processes = processes;
                self.last_run = None;
            }
            Err(err) => {
                writeln!(self.out, "Error generating processes: {}", err)?;
                return Ok(true);
            }
        }
        let done = format!("{} random processes generated and saved to file!", count);
        self.autosave(&done)?;
        Ok(true)
    }

    fn read_quantum(&mut self) -> Result<Option<NonZeroUsize>> {
        loop {
            self.prompt("Enter Time Quantum: ")?;
            let Some(quantum) = self.read_number::<usize>()? else {
                return Ok(None);
            };
            match NonZeroUsize::new(quantum) {
                Some(quantum) => return Ok(Some(quantum)),
                None => writeln!(self.out, "Time quantum must be greater than zero.")?,
            }
        }
    }

    fn run_scheduler(&mut self) -> Result<bool> {
        writeln!(self.out, "Choose Scheduling Algorithm:")?;
        writeln!(self.out, "1. FCFS")?;
        writeln!(self.out, "2. Round Robin")?;
        writeln!(self.out, "3. Priority")?;
        writeln!(self.out, "4. Shortest Job First (SJF)")?;
        writeln!(self.out, "5. Shortest Remaining Time (SRT)")?;

        let Some(choice) = self.read_number::<usize>()? else {
            return Ok(false);
        };
        let policy = match choice {
            1 => Policy::Fcfs,
            2 => match self.read_quantum()? {
                Some(quantum) => Policy::RoundRobin(quantum),
                None => return Ok(false),
            },
            3 => {
                self.prompt("Choose Priority Type (1 for Preemptive, 2 for Non-Preemptive): ")?;
                match self.read_number::<usize>()? {
                    Some(1) => Policy::Priority,
                    Some(2) => Policy::PriorityNonPreemptive,
                    Some(_) => {
                        writeln!(self.out, "Invalid priority type. Returning to main menu.")?;
                        return Ok(true);
                    }
                    None => return Ok(false),
                }
            }
            4 => Policy::Sjf,
            5 => Policy::Srt,
            _ => {
                writeln!(self.out, "Invalid choice. Returning to main menu.")?;
                return Ok(true);
            }
        };

        if let Err(err) = check_horizon(&self.processes) {
            writeln!(self.out, "Cannot run: {}", err)?;
            return Ok(true);
        }
        let schedule = run_simulation(&mut self.out, policy, self.processes.clone(), &self.options)?;
        self.processes = schedule.processes.clone();
        self.last_run = Some((policy, schedule));
        writeln!(
            self.out,
            "Scheduling completed. View statistics now or return to main menu."
        )?;
        Ok(true)
    }

    fn show_statistics(&mut self) -> Result<bool> {
        match &self.last_run {
            None => writeln!(
                self.out,
                "No statistics available. Please run a scheduling algorithm first."
            )?,
            Some((policy, schedule)) => {
                let stats = Statistics::new(Some(schedule.processes.as_slice()))?
                    .with_trace(&schedule.trace);
                writeln!(self.out, "Statistics ({}):", policy)?;
                writeln!(self.out, "{}", stats)?;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cpusched-{}-{}", std::process::id(), name))
    }

    fn options(name: &str) -> RunOptions {
        RunOptions {
            output: Some(temp_path(name)),
            ..RunOptions::default()
        }
    }

    fn p(pid: usize, arrival: usize, burst: usize, priority: i32) -> Process {
        Process::new(pid, arrival, burst, priority).unwrap()
    }

    // runs the menu over `input` and returns its output and final records
    fn drive(
        input: &str,
        processes: Vec<Process>,
        name: &str,
    ) -> (String, Vec<Process>) {
        let mut out = Vec::new();
        let records = {
            let mut menu = Menu::new(
                input.as_bytes(),
                &mut out,
                options(&format!("{}-report.txt", name)),
                RandGenerator::seeded(1),
            )
            .with_processes(processes)
            .with_process_file(temp_path(&format!("{}-processes.txt", name)));
            menu.run().unwrap();
            menu.processes().to_vec()
        };
        let _ = fs::remove_file(temp_path(&format!("{}-report.txt", name)));
        let _ = fs::remove_file(temp_path(&format!("{}-processes.txt", name)));
        (String::from_utf8(out).unwrap(), records)
    }

    #[test]
    fn run_simulation_writes_report() {
        let opts = options("sim-report.txt");
        let mut out = Vec::new();
        let schedule =
            run_simulation(&mut out, Policy::Fcfs, vec![p(1, 0, 2, 1)], &opts).unwrap();
        let report = fs::read_to_string(temp_path("sim-report.txt")).unwrap();
        fs::remove_file(temp_path("sim-report.txt")).unwrap();

        assert_eq!(schedule.trace.to_string(), "| P1 |");
        assert!(report.contains("Gantt Chart: | P1 |"));
        assert!(String::from_utf8(out).unwrap().contains("saved to file"));
    }

    #[test]
    fn report_failure_is_not_fatal() {
        let opts = RunOptions {
            output: Some(temp_path("missing-dir").join("report.txt")),
            ..RunOptions::default()
        };
        let mut out = Vec::new();
        let schedule = run_simulation(&mut out, Policy::Srt, vec![p(1, 0, 2, 1)], &opts).unwrap();
        assert_eq!(schedule.processes[0].completion_time(), Some(2));
        assert!(String::from_utf8(out).unwrap().contains("Error saving processes to file"));
    }

    #[test]
    fn delay_replays_segments() {
        let opts = RunOptions {
            delay: Duration::from_millis(1),
            ..options("replay-report.txt")
        };
        let mut out = Vec::new();
        run_simulation(&mut out, Policy::Fcfs, vec![p(1, 2, 1, 1)], &opts).unwrap();
        let _ = fs::remove_file(temp_path("replay-report.txt"));
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("At time 0ms, Idle runs until 2ms"));
        assert!(out.contains("At time 2ms, P1 runs until 3ms"));
    }

    #[test]
    fn oversized_workload_is_refused() {
        let heavy: Vec<_> = (1..=11)
            .map(|pid| p(pid, 0, crate::process::MAX_BURST_TIME, 1))
            .collect();
        let mut out = Vec::new();
        let err = run_simulation(&mut out, Policy::Srt, heavy.clone(), &options("heavy-report.txt"))
            .unwrap_err();
        assert!(matches!(err, crate::Error::InvalidArgument(_)));
        assert!(!temp_path("heavy-report.txt").exists());

        let (out, records) = drive("5\n5\n6\n7\n", heavy, "heavy");
        assert!(out.contains("Cannot run:"));
        assert!(out.contains("No statistics available"));
        assert_eq!(records.len(), 11);
    }

    #[test]
    fn replacing_records_drops_old_statistics() {
        let path = temp_path("stale-stats.txt");
        fs::write(&path, "7 0 2 1\n").unwrap();
        let script = format!("5\n1\n2\n{}\n6\n7\n", path.display());
        let (out, records) = drive(&script, vec![p(1, 0, 3, 1)], "stale");
        fs::remove_file(&path).unwrap();
        assert!(out.contains("Gantt Chart: | P1 |"));
        assert!(out.contains("No statistics available"));
        assert_eq!(records, vec![p(7, 0, 2, 1)]);

        let (out, _) = drive("5\n1\n4\n3\n6\n7\n", vec![p(1, 0, 3, 1)], "stale-gen");
        assert!(out.contains("3 random processes generated"));
        assert!(out.contains("No statistics available"));
    }

    #[test]
    fn invalid_input_is_reprompted() {
        let (out, _) = drive("abc\n9\n7\n", Vec::new(), "reprompt");
        assert!(out.contains("Invalid input. Please enter a valid number."));
        assert!(out.contains("Invalid option. Try again."));
        assert!(out.contains("Exiting the program..."));
    }

    #[test]
    fn end_of_input_stops_cleanly() {
        let (out, _) = drive("", Vec::new(), "eof");
        assert!(out.contains("7. Exit"));
    }

    #[test]
    fn add_run_and_view_statistics() {
        let (out, records) = drive("1\n1 0 5 2\n5\n1\n6\n7\n", Vec::new(), "add-run");
        assert!(out.contains("Process added and saved to file."));
        assert!(out.contains("Gantt Chart: | P1 |"));
        assert!(out.contains("Average Waiting Time: 0.00"));
        assert_eq!(records[0].completion_time(), Some(5));
    }

    #[test]
    fn duplicate_pid_is_refused() {
        let (out, records) = drive("1\n1 0 5 2\n7\n", vec![p(1, 0, 3, 1)], "dup");
        assert!(out.contains("Process P1 already exists."));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn round_robin_prompts_for_quantum() {
        let (out, _) = drive(
            "5\n2\n0\n2\n6\n7\n",
            vec![p(1, 0, 5, 1), p(2, 0, 3, 1)],
            "rr",
        );
        assert!(out.contains("Time quantum must be greater than zero."));
        assert!(out.contains("Gantt Chart: | P1 | P2 | P1 | P2 | P1 |"));
        assert!(out.contains("Statistics (R2):"));
    }

    #[test]
    fn priority_type_selects_variant() {
        let (out, _) = drive("5\n3\n2\n7\n", vec![p(1, 0, 4, 3), p(2, 1, 2, 1)], "prio");
        assert!(out.contains("Starting Priority (non-preemptive) Scheduling..."));
        assert!(out.contains("Gantt Chart: | P1 | P2 |"));
    }

    #[test]
    fn statistics_need_a_run() {
        let (out, _) = drive("6\n7\n", Vec::new(), "nostats");
        assert!(out.contains("No statistics available. Please run a scheduling algorithm first."));
    }

    #[test]
    fn failed_load_keeps_records() {
        let (out, records) = drive(
            "2\n/nonexistent/cpusched/processes.txt\n7\n",
            vec![p(1, 0, 3, 1)],
            "load",
        );
        assert!(out.contains("Error loading file"));
        assert_eq!(records, vec![p(1, 0, 3, 1)]);
    }

    #[test]
    fn generate_replaces_records() {
        let (out, records) = drive("4\n6\n7\n", vec![p(9, 0, 3, 1)], "gen");
        assert!(out.contains("6 random processes generated and saved to file!"));
        let pids: Vec<_> = records.iter().map(Process::pid).collect();
        assert_eq!(pids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn save_and_load_through_menu() {
        let path = temp_path("menu-save.txt");
        let script = format!("3\n{}\n7\n", path.display());
        drive(&script, vec![p(1, 0, 3, 1), p(2, 4, 2, 5)], "save");

        let script = format!("2\n{}\n7\n", path.display());
        let (out, records) = drive(&script, Vec::new(), "reload");
        fs::remove_file(&path).unwrap();
        assert!(out.contains("Processes loaded successfully!"));
        assert_eq!(records, vec![p(1, 0, 3, 1), p(2, 4, 2, 5)]);
    }
}
