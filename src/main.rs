use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{App, Arg};

use cpusched::rand_generator::RandGenerator;
use cpusched::simulator::{self, Menu, RunOptions};
use cpusched::{set_flags, utils, Flags, Policy, Process, Statistics};

struct Args {
    policy: Option<Policy>,
    inputfile: Option<String>,
    rfile: Option<String>,
    seed: Option<u64>,
    options: RunOptions,
}

fn valid_schedspec(value: &str) -> Result<(), String> {
    value
        .parse::<Policy>()
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn build_app() -> App<'static> {
    App::new("cpusched")
        .about("Single-processor CPU scheduling simulator")
        .arg(
            Arg::with_name("schedspec")
                .short('s')
                .long("schedspec")
                .takes_value(true)
                .validator(valid_schedspec)
                .requires("inputfile")
                .help("Scheduling policy (F, R<num>, P, N, J or S); runs INPUTFILE without the menu"),
        )
        .arg(
            Arg::with_name("v_flag")
                .short('v')
                .required(false)
                .help("print every scheduling step")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("q_flag")
                .short('q')
                .required(false)
                .help("print the eligible processes at every decision")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("c_flag")
                .short('c')
                .required(false)
                .help("print the compact timeline after a run")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("no_arrival_gate")
                .long("no-arrival-gate")
                .help("let round robin run processes before they arrive")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("delay")
                .long("delay")
                .takes_value(true)
                .default_value("0")
                .help("milliseconds to pause between replayed chart segments"),
        )
        .arg(
            Arg::with_name("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .help("report file, instead of the policy's default"),
        )
        .arg(
            Arg::with_name("rfile")
                .short('r')
                .long("rfile")
                .takes_value(true)
                .help("random number file for process generation"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .help("seed for process generation"),
        )
        .arg(
            Arg::with_name("inputfile")
                .help("process file to load")
                .index(1),
        )
}

fn parse_args(actual_args: &Vec<String>) -> anyhow::Result<Args> {
    let matches = build_app().get_matches_from(actual_args);

    let policy = matches
        .value_of("schedspec")
        .map(str::parse::<Policy>)
        .transpose()?;
    let delay: u64 = matches
        .value_of("delay")
        .unwrap_or("0")
        .parse()
        .context("--delay expects milliseconds")?;
    let seed = matches
        .value_of("seed")
        .map(str::parse::<u64>)
        .transpose()
        .context("--seed expects a number")?;

    set_flags(Flags {
        v_option: matches.is_present("v_flag"),
        q_option: matches.is_present("q_flag"),
        c_option: matches.is_present("c_flag"),
    });

    Ok(Args {
        policy,
        inputfile: matches.value_of("inputfile").map(str::to_string),
        rfile: matches.value_of("rfile").map(str::to_string),
        seed,
        options: RunOptions {
            arrival_gate: !matches.is_present("no_arrival_gate"),
            delay: Duration::from_millis(delay),
            output: matches.value_of("output").map(PathBuf::from),
        },
    })
}

fn run_batch(policy: Policy, processes: Vec<Process>, options: &RunOptions) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let schedule = simulator::run_simulation(&mut out, policy, processes, options)?;
    let stats = Statistics::new(Some(schedule.processes.as_slice()))?.with_trace(&schedule.trace);
    writeln!(out, "{}", stats)?;
    Ok(())
}

fn actual_main_fn(args: Args) -> anyhow::Result<()> {
    let generator = match (&args.rfile, args.seed) {
        (Some(rfile), _) => RandGenerator::from_file(rfile)
            .with_context(|| format!("cannot use random file {}", rfile))?,
        (None, Some(seed)) => RandGenerator::seeded(seed),
        (None, None) => RandGenerator::new(),
    };
    let processes = match &args.inputfile {
        Some(inputfile) => utils::read_input_file(inputfile)
            .with_context(|| format!("cannot load processes from {}", inputfile))?,
        None => Vec::new(),
    };

    if let (Some(policy), Some(_)) = (args.policy, &args.inputfile) {
        return run_batch(policy, processes, &args.options);
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut menu = Menu::new(stdin.lock(), stdout.lock(), args.options, generator)
        .with_processes(processes);
    menu.run()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = std::env::args().collect::<Vec<String>>();
    let args = parse_args(&args)?;
    actual_main_fn(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn schedspec_validation() {
        for good in ["F", "R4", "P", "N", "J", "S"] {
            assert!(valid_schedspec(good).is_ok(), "{}", good);
        }
        for bad in ["R0", "L", "R", "E2:3"] {
            assert!(valid_schedspec(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn parses_batch_arguments() {
        let parsed = parse_args(&args(&[
            "cpusched",
            "-sR3",
            "-v",
            "--no-arrival-gate",
            "--delay",
            "5",
            "-o",
            "out.txt",
            "input1",
        ]))
        .unwrap();
        assert_eq!(parsed.policy.map(|p| p.to_string()), Some("R3".to_string()));
        assert_eq!(parsed.inputfile.as_deref(), Some("input1"));
        assert!(!parsed.options.arrival_gate);
        assert_eq!(parsed.options.delay, Duration::from_millis(5));
        assert_eq!(parsed.options.output, Some(PathBuf::from("out.txt")));
        assert!(cpusched::flags().v_option);
        assert!(!cpusched::flags().q_option);
    }

    #[test]
    fn schedspec_needs_an_input_file() {
        let err = build_app()
            .try_get_matches_from(args(&["cpusched", "-sF"]))
            .unwrap_err();
        assert_eq!(err.kind(), clap::ErrorKind::MissingRequiredArgument);
        assert!(build_app()
            .try_get_matches_from(args(&["cpusched", "-sF", "input1"]))
            .is_ok());
    }

    #[test]
    fn defaults_start_the_menu() {
        let parsed = parse_args(&args(&["cpusched", "--seed", "7"])).unwrap();
        assert!(parsed.policy.is_none());
        assert!(parsed.inputfile.is_none());
        assert_eq!(parsed.seed, Some(7));
        assert!(parsed.options.arrival_gate);
        assert_eq!(parsed.options.delay, Duration::ZERO);
    }
}
