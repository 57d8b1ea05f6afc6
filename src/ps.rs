//! The `ps` utility, for hosts without procfs.

use std::process::{Command, Stdio};

use crate::{
    error::{parse_number, ProbeError},
    myprocess::Pid,
    source::ProcessSource,
};

pub struct PsCommand {
    program: String,
}

impl Default for PsCommand {
    fn default() -> Self {
        Self::new("ps")
    }
}

impl PsCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, ProbeError> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                program: self.program.clone(),
                status: output.status,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ProcessSource for PsCommand {
    fn resident(&self, pid: Pid) -> Result<u64, ProbeError> {
        let out = self.run(&["-o", "rss=", "-p", &pid.to_string()])?;
        //ps reports kibibytes
        let kib: u64 = parse_number(out.trim())?;
        Ok(kib.saturating_mul(1024))
    }

    fn parent_links(&self) -> Result<Vec<(Pid, Pid)>, ProbeError> {
        let out = self.run(&["-eo", "pid,ppid"])?;
        Ok(parse_links(&out))
    }

    fn name(&self, pid: Pid) -> Result<String, ProbeError> {
        let out = self.run(&["-o", "comm=", "-p", &pid.to_string()])?;
        Ok(out.trim().to_string())
    }
}

///rows of `pid ppid`, the header and anything unparsable is skipped
fn parse_links(out: &str) -> Vec<(Pid, Pid)> {
    out.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let pid = fields.next()?.parse().ok()?;
            let ppid = fields.next()?.parse().ok()?;
            Some((pid, ppid))
        })
        .collect()
}
