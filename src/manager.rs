use std::sync::{Mutex, MutexGuard, PoisonError};

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, ThreadKind};

use crate::{error::ProbeError, myprocess::Pid, source::ProcessSource};

/// Process information through `sysinfo`, for platforms where neither
/// procfs nor `ps` exist.
pub struct SystemSource {
    system: Mutex<System>,
}

impl SystemSource {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    //a panic mid refresh leaves the cache stale at worst, next refresh fixes it
    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh_one(system: &mut System, pid: Pid, kind: ProcessRefreshKind) -> sysinfo::Pid {
        let pid = sysinfo::Pid::from_u32(pid);
        system.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, kind);
        pid
    }
}

impl Default for SystemSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SystemSource {
    fn resident(&self, pid: Pid) -> Result<u64, ProbeError> {
        let mut system = self.system();
        let spid = Self::refresh_one(&mut system, pid, ProcessRefreshKind::nothing().with_memory());
        system
            .process(spid)
            .map(|p| p.memory())
            .ok_or(ProbeError::NotFound(pid))
    }

    fn parent_links(&self) -> Result<Vec<(Pid, Pid)>, ProbeError> {
        let mut system = self.system();
        system.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::nothing());
        let links = system
            .processes()
            .values()
            //threads show up as processes on linux
            .filter(|p| p.thread_kind() != Some(ThreadKind::Userland))
            .filter_map(|p| Some((p.pid().as_u32(), p.parent()?.as_u32())))
            .collect();
        Ok(links)
    }

    fn name(&self, pid: Pid) -> Result<String, ProbeError> {
        let mut system = self.system();
        let spid = Self::refresh_one(&mut system, pid, ProcessRefreshKind::nothing());
        system
            .process(spid)
            .map(|p| p.name().to_string_lossy().to_string())
            .ok_or(ProbeError::NotFound(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sees_own_process() {
        let source = SystemSource::new();
        let pid = std::process::id();

        assert!(source.resident(pid).unwrap() > 0);
        assert!(!source.name(pid).unwrap().is_empty());
        assert!(source
            .parent_links()
            .unwrap()
            .iter()
            .any(|(child, _)| *child == pid));
    }

    #[test]
    fn missing_process_is_not_found() {
        let source = SystemSource::new();
        assert!(matches!(
            source.resident(u32::MAX - 1),
            Err(ProbeError::NotFound(_))
        ));
    }
}
