use crate::{myprocess::Pid, source::ProcessSource};

/// Current resident memory of `pid` in bytes.
///
/// Zero means "no observation": the process is gone, unreadable, or the
/// source could not be parsed. It is never an error.
pub fn sample(source: &dyn ProcessSource, pid: Pid) -> u64 {
    match source.resident(pid) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::trace!("no sample for {pid}: {err}");
            0
        }
    }
}
