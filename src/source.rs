use std::sync::Arc;

use crate::{
    config::Backend,
    error::ProbeError,
    manager::SystemSource,
    myprocess::Pid,
    procfs::ProcFs,
    ps::PsCommand,
};

pub const UNKNOWN_NAME: &str = "unknown";

/// The three questions the sampler asks the operating system.
///
/// Implementations are called from the blocking pool, one poll cycle at a
/// time, so they may block on file or process I/O.
pub trait ProcessSource: Send + Sync {
    /// Resident set size of `pid` in bytes.
    fn resident(&self, pid: Pid) -> Result<u64, ProbeError>;

    /// `(pid, parent pid)` for every process currently listed.
    ///
    /// Only a wholesale failure of the listing is an error; processes that
    /// vanish while being listed are simply left out.
    fn parent_links(&self) -> Result<Vec<(Pid, Pid)>, ProbeError>;

    /// Command name of `pid`, as the OS reports it.
    fn name(&self, pid: Pid) -> Result<String, ProbeError>;
}

/// Asks `primary` first and `fallback` whenever the primary cannot answer.
pub struct Fallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> Fallback<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: ProcessSource, F: ProcessSource> ProcessSource for Fallback<P, F> {
    fn resident(&self, pid: Pid) -> Result<u64, ProbeError> {
        self.primary.resident(pid).or_else(|err| {
            log::trace!("resident({pid}) falling back: {err}");
            self.fallback.resident(pid)
        })
    }

    fn parent_links(&self) -> Result<Vec<(Pid, Pid)>, ProbeError> {
        self.primary.parent_links().or_else(|err| {
            log::debug!("process listing falling back: {err}");
            self.fallback.parent_links()
        })
    }

    fn name(&self, pid: Pid) -> Result<String, ProbeError> {
        self.primary.name(pid).or_else(|err| {
            log::trace!("name({pid}) falling back: {err}");
            self.fallback.name(pid)
        })
    }
}

pub fn for_backend(backend: Backend) -> Arc<dyn ProcessSource> {
    match backend {
        Backend::Auto => auto(),
        Backend::Procfs => Arc::new(ProcFs::default()),
        Backend::Ps => Arc::new(PsCommand::default()),
        Backend::Sysinfo => Arc::new(SystemSource::new()),
    }
}

#[cfg(unix)]
fn auto() -> Arc<dyn ProcessSource> {
    Arc::new(Fallback::new(ProcFs::default(), PsCommand::default()))
}

#[cfg(not(unix))]
fn auto() -> Arc<dyn ProcessSource> {
    Arc::new(SystemSource::new())
}

///trimmed command name, `unknown` if nothing usable is found
pub fn display_name(source: &dyn ProcessSource, pid: Pid) -> String {
    match source.name(pid) {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        Ok(_) => UNKNOWN_NAME.to_string(),
        Err(err) => {
            log::trace!("no name for {pid}: {err}");
            UNKNOWN_NAME.to_string()
        }
    }
}
