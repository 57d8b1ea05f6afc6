use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use crate::myprocess::{Pid, ProcessRecord};

/// Running peak per process, safe to share between the sampling task and
/// the reader of the final result.
///
/// Records are never removed: a child that has exited keeps its last peak.
#[derive(Debug, Default)]
pub struct PeakTracker {
    records: RwLock<BTreeMap<Pid, ProcessRecord>>,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one sample into the record of `pid`. The name is only used
    /// when the record is created.
    ///
    /// A zero sample is a failed read, not an observation, and changes nothing.
    pub fn update(&self, pid: Pid, name: impl Into<String>, bytes: u64) {
        if bytes == 0 {
            return;
        }
        //an update either fully happened or not at all, so poisoned data is still valid
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match records.get_mut(&pid) {
            Some(record) => {
                if record.observe(bytes) {
                    log::trace!("new peak for {} ({}): {}", pid, record.name, bytes);
                }
            }
            None => {
                let record = ProcessRecord::new(pid, name.into(), bytes);
                log::debug!("tracking {} ({})", pid, record.name);
                records.insert(pid, record);
            }
        }
    }

    /// All records, ascending by pid.
    pub fn snapshot(&self) -> Vec<ProcessRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
