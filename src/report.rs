use std::io::{self, Write};

use crate::myprocess::ProcessRecord;

/// Final per-process peaks and their sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub total: u64,
    pub records: Vec<ProcessRecord>,
}

impl Report {
    /// Orders by ascending pid and sums every peak, exited children included.
    pub fn new(mut records: Vec<ProcessRecord>) -> Self {
        records.sort_by_key(|r| r.pid);
        let total = records
            .iter()
            .fold(0u64, |sum, r| sum.saturating_add(r.peak_memory));
        Self { total, records }
    }

    pub fn write_to(&self, out: &mut impl Write, size: impl Fn(u64) -> String) -> io::Result<()> {
        writeln!(out, "mempeak: process tree memory usage:")?;
        for record in &self.records {
            writeln!(
                out,
                "  PID {} ({}): {}",
                record.pid,
                record.name,
                size(record.peak_memory)
            )?;
        }
        writeln!(out, "mempeak: total peak memory usage: {}", size(self.total))?;
        out.flush()
    }
}
