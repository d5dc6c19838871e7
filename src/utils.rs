use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};
use crate::process::Process;
use crate::schedulers::Schedule;

const RECORD_HEADER: &str = "# pid arrival burst priority [completion turnaround waiting]";

// pid arrival burst priority, then optionally completion turnaround waiting.
// Fields are separated by whitespace and/or a comma.
const RECORD_PATTERN: &str = r"^(\d+)(?:\s*,\s*|\s+)(\d+)(?:\s*,\s*|\s+)(\d+)(?:\s*,\s*|\s+)(-?\d+)(?:(?:\s*,\s*|\s+)(\d+)(?:\s*,\s*|\s+)(\d+)(?:\s*,\s*|\s+)(\d+))?$";

fn record_regex() -> Result<Regex> {
    Regex::new(RECORD_PATTERN).map_err(|_| Error::InvalidArgument("record pattern"))
}

/// Parses the body of a process file.
///
/// Lines starting with `#` and blank lines are skipped. Any other line must be
/// a full record, otherwise the whole load fails naming that line.
pub fn parse_processes(path: &Path, contents: &str) -> Result<Vec<Process>> {
    let re = record_regex()?;
    let mut seen = HashSet::new();
    let mut processes = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let malformed = || Error::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            content: line.to_string(),
        };
        let caps = re.captures(line).ok_or_else(malformed)?;
        let field = |i: usize| -> Result<usize> {
            caps[i].parse().map_err(|_| malformed())
        };

        let pid = field(1)?;
        let priority: i32 = caps[4].parse().map_err(|_| malformed())?;
        let mut process = Process::new(pid, field(2)?, field(3)?, priority)?;
        if caps.get(5).is_some() {
            process
                .restore_metrics(field(5)?, field(6)?, field(7)?)
                .map_err(|_| malformed())?;
        }

        if !seen.insert(pid) {
            return Err(Error::DuplicatePid {
                path: path.to_path_buf(),
                pid,
            });
        }
        processes.push(process);
    }

    Ok(processes)
}

pub fn read_input_file(filename: impl AsRef<Path>) -> Result<Vec<Process>> {
    let path = filename.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    let mut line = String::new();

    while reader.read_line(&mut line).map_err(|e| Error::io(path, e))? > 0 {
        contents.push_str(&line);
        line.clear();
    }

    parse_processes(path, &contents)
}

/// One record per line; finished processes also carry their metrics.
pub fn format_processes(processes: &[Process]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RECORD_HEADER);
    for p in processes {
        let _ = write!(
            out,
            "{} {} {} {}",
            p.pid(),
            p.arrival_time(),
            p.burst_time(),
            p.priority()
        );
        if let (Some(c), Some(t), Some(w)) =
            (p.completion_time(), p.turnaround_time(), p.waiting_time())
        {
            let _ = write!(out, " {} {} {}", c, t, w);
        }
        out.push('\n');
    }
    out
}

pub fn write_processes(filename: impl AsRef<Path>, processes: &[Process]) -> Result<()> {
    let path = filename.as_ref();
    fs::write(path, format_processes(processes)).map_err(|e| Error::io(path, e))
}

fn metric(value: Option<usize>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Human-readable run report: the chart plus per-process metrics.
pub fn format_report(policy: &str, schedule: &Schedule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Process Scheduling Result with Gantt Chart:");
    let _ = writeln!(out, "Algorithm: {}", policy);
    let _ = writeln!(out, "Gantt Chart: {}", schedule.trace);
    let _ = writeln!(out, "Timeline: {}", schedule.trace.merged().timeline());
    let _ = writeln!(out);
    let _ = writeln!(out, "Process Details:");
    for p in &schedule.processes {
        let _ = writeln!(
            out,
            "PID: {}, Arrival Time: {}, Burst Time: {}, Waiting Time: {}, Turnaround Time: {}, Completion Time: {}",
            p.pid(),
            p.arrival_time(),
            p.burst_time(),
            metric(p.waiting_time()),
            metric(p.turnaround_time()),
            metric(p.completion_time())
        );
    }
    out
}

pub fn write_report(filename: impl AsRef<Path>, policy: &str, schedule: &Schedule) -> Result<()> {
    let path = filename.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(format_report(policy, schedule).as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(path, e))
}
