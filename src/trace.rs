use std::fmt;

/// What the CPU did during a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Process(usize),
    Idle,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Slot::Process(pid) => write!(f, "P{}", pid),
            Slot::Idle => write!(f, "Idle"),
        }
    }
}

/// The half-open span `[start, end)` of simulated time spent on `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub slot: Slot,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Gantt chart of one run. Segments are contiguous and start at time 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    segments: Vec<Segment>,
}

impl Trace {
    pub fn new() -> Self {
        Trace::default()
    }

    /// Appends `[start, end)`. Empty spans are dropped.
    pub(crate) fn push(&mut self, slot: Slot, start: usize, end: usize) {
        debug_assert_eq!(start, self.end(), "trace must stay contiguous");
        if end > start {
            self.segments.push(Segment { slot, start, end });
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Slots in execution order, one per segment.
    pub fn slots(&self) -> Vec<Slot> {
        self.segments.iter().map(|seg| seg.slot).collect()
    }

    /// Time at which the last segment ends.
    pub fn end(&self) -> usize {
        self.segments.last().map_or(0, |seg| seg.end)
    }

    /// Time the CPU spent on processes, idle segments excluded.
    pub fn busy_time(&self) -> usize {
        self.segments
            .iter()
            .filter(|seg| seg.slot != Slot::Idle)
            .map(Segment::len)
            .sum()
    }

    /// Total time `pid` spent on the CPU.
    pub fn executed(&self, pid: usize) -> usize {
        self.segments
            .iter()
            .filter(|seg| seg.slot == Slot::Process(pid))
            .map(Segment::len)
            .sum()
    }

    /// Coalesces neighbouring segments that ran the same slot.
    pub fn merged(&self) -> Trace {
        let mut segments: Vec<Segment> = Vec::with_capacity(self.segments.len());
        for seg in &self.segments {
            match segments.last_mut() {
                Some(last) if last.slot == seg.slot => last.end = seg.end,
                _ => segments.push(*seg),
            }
        }
        Trace { segments }
    }

    /// Renders the chart with time marks, e.g. `0 [P1] 3 [Idle] 4 [P2] 6`.
    pub fn timeline(&self) -> String {
        let mut out = String::new();
        if let Some(first) = self.segments.first() {
            out.push_str(&first.start.to_string());
        }
        for seg in &self.segments {
            out.push_str(&format!(" [{}] {}", seg.slot, seg.end));
        }
        out
    }
}

/// The classic chart format: `| P1 | P2 | Idle |`.
impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.segments.is_empty() {
            return Ok(());
        }
        for seg in &self.segments {
            write!(f, "| {} ", seg.slot)?;
        }
        write!(f, "|")
    }
}
