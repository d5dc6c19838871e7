//! Single-processor CPU scheduling simulator.
//!
//! The engine lives in [`schedulers`]: every policy takes ownership of a set
//! of [`Process`] records, runs them on a simulated clock and hands back a
//! [`Schedule`] holding the records (now carrying completion, turnaround and
//! waiting times) together with the Gantt [`Trace`] of the run.
//!
//! Step-by-step output is opt-in. The engine reports through [`v_trace!`]
//! and [`q_trace!`], which stay silent until the driver flips the matching
//! switch in [`TFLAGS`].

use std::cell::RefCell;

pub mod error;
pub mod process;
pub mod rand_generator;
pub mod schedulers;
pub mod simulator;
pub mod stats;
pub mod trace;
pub mod utils;

pub use error::{Error, Result};
pub use process::Process;
pub use schedulers::{Policy, Schedule, Scheduler};
pub use stats::Statistics;
pub use trace::{Segment, Slot, Trace};

// Define a struct to hold the flags
#[derive(Debug, Default, Clone, Copy)]
pub struct Flags {
    /// print every scheduling step
    pub v_option: bool,
    /// print the eligible set at every decision
    pub q_option: bool,
    /// print the merged (compact) chart after a run
    pub c_option: bool,
}

// Define a thread-local variable to hold the flags
thread_local!(pub static TFLAGS: RefCell<Flags> = RefCell::new(Flags::default()));

/// Replaces the trace flags of the current thread.
pub fn set_flags(flags: Flags) {
    TFLAGS.with(|tflags| *tflags.borrow_mut() = flags);
}

pub fn flags() -> Flags {
    TFLAGS.with(|tflags| *tflags.borrow())
}

// prints the scheduling steps
#[macro_export]
macro_rules! v_trace {
    ($($arg:tt)*) => {
        $crate::TFLAGS.with(|tflags| {
            let tflags = tflags.borrow();
            if tflags.v_option {
                println!("{}", format_args!($($arg)*));
            }
        });
    };
}

// prints the eligible processes
#[macro_export]
macro_rules! q_trace {
    ($($arg:tt)*) => {
        $crate::TFLAGS.with(|tflags| {
            let tflags = tflags.borrow();
            if tflags.q_option {
                println!("{}", format_args!($($arg)*));
            }
        });
    };
}

// prints the compact chart
#[macro_export]
macro_rules! c_trace {
    ($($arg:tt)*) => {
        $crate::TFLAGS.with(|tflags| {
            let tflags = tflags.borrow();
            if tflags.c_option {
                println!("{}", format_args!($($arg)*));
            }
        });
    };
}
