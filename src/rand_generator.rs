use std::fs;

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::process::Process;

// Bounds for generated processes.
pub const MAX_ARRIVAL: usize = 100; // arrival in 0..100
pub const MAX_BURST: usize = 20; // burst in 1..=20
pub const MAX_PRIORITY: usize = 5; // priority in 1..=5

enum Source {
    Thread(ThreadRng),
    Seeded(StdRng),
    // numbers read from an rfile, consumed in order and wrapping around
    File { values: Vec<usize>, ofs: usize },
}

pub struct RandGenerator {
    source: Source,
}

impl RandGenerator {
    pub fn new() -> Self {
        RandGenerator {
            source: Source::Thread(rand::rng()),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        RandGenerator {
            source: Source::Seeded(StdRng::seed_from_u64(seed)),
        }
    }

    /// Reads a random file: the first line holds the count, followed by that
    /// many non-negative numbers separated by whitespace.
    pub fn from_file(filename: &str) -> Result<Self> {
        let contents = fs::read_to_string(filename).map_err(|e| Error::io(filename, e))?;
        let malformed = |line: usize, content: &str| Error::Parse {
            path: filename.into(),
            line,
            content: content.to_string(),
        };

        let mut lines = contents.lines();
        let first = lines.next().unwrap_or("");
        let count: usize = first.trim().parse().map_err(|_| malformed(1, first))?;

        let mut values: Vec<usize> = Vec::with_capacity(count);
        for (idx, line) in lines.enumerate() {
            for token in line.split_whitespace() {
                if values.len() == count {
                    break;
                }
                values.push(token.parse().map_err(|_| malformed(idx + 2, line))?);
            }
        }
        if values.is_empty() {
            return Err(malformed(1, first));
        }

        Ok(RandGenerator {
            source: Source::File { values, ofs: 0 },
        })
    }

    /// A number in `0..bound`. `bound` must be non-zero.
    pub fn below(&mut self, bound: usize) -> usize {
        match &mut self.source {
            Source::Thread(rng) => rng.random_range(0..bound),
            Source::Seeded(rng) => rng.random_range(0..bound),
            Source::File { values, ofs } => {
                let value = values[*ofs];
                *ofs = (*ofs + 1) % values.len();
                value % bound
            }
        }
    }

    /// `count` processes with pids 1..=count.
    pub fn generate(&mut self, count: usize) -> Result<Vec<Process>> {
        (1..=count)
            .map(|pid| {
                let arrival = self.below(MAX_ARRIVAL);
                let burst = 1 + self.below(MAX_BURST);
                let priority = 1 + self.below(MAX_PRIORITY) as i32;
                Process::new(pid, arrival, burst, priority)
            })
            .collect()
    }
}

impl Default for RandGenerator {
    fn default() -> Self {
        RandGenerator::new()
    }
}
