//! Kernel process records under `/proc`.

use std::path::PathBuf;

use crate::{
    error::{parse_number, ProbeError},
    myprocess::Pid,
    source::ProcessSource,
};

pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, pid: Pid, file: &str) -> Result<(PathBuf, String), ProbeError> {
        let path = self.root.join(pid.to_string()).join(file);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok((path, contents)),
            Err(err) => Err(ProbeError::read(path, err)),
        }
    }

    fn parent(&self, pid: Pid) -> Result<Pid, ProbeError> {
        let (path, stat) = self.read(pid, "stat")?;
        parse_stat_parent(&stat).ok_or(ProbeError::MissingField {
            path,
            field: "ppid",
        })?
    }
}

impl ProcessSource for ProcFs {
    fn resident(&self, pid: Pid) -> Result<u64, ProbeError> {
        let (path, status) = self.read(pid, "status")?;
        let kib = parse_status_rss(&status).ok_or(ProbeError::MissingField {
            path,
            field: "VmRSS",
        })??;
        Ok(kib.saturating_mul(1024))
    }

    fn parent_links(&self) -> Result<Vec<(Pid, Pid)>, ProbeError> {
        let entries =
            std::fs::read_dir(&self.root).map_err(|err| ProbeError::read(&self.root, err))?;
        let links = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().to_str()?.parse::<Pid>().ok())
            //gone between listing and reading, or unreadable
            .filter_map(|pid| self.parent(pid).ok().map(|parent| (pid, parent)))
            .collect();
        Ok(links)
    }

    fn name(&self, pid: Pid) -> Result<String, ProbeError> {
        let (_, comm) = self.read(pid, "comm")?;
        Ok(comm.trim().to_string())
    }
}

///`VmRSS:    1234 kB` in kibibytes. None if the line is absent (kernel threads, zombies)
fn parse_status_rss(status: &str) -> Option<Result<u64, ProbeError>> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let value = line.split_whitespace().nth(1)?;
    Some(parse_number(value))
}

///parent pid is the second field after the command, which is wrapped in
///parentheses and may itself contain spaces or parentheses
fn parse_stat_parent(stat: &str) -> Option<Result<Pid, ProbeError>> {
    let close = stat.rfind(')')?;
    let rest = stat.get(close + 1..)?;
    let ppid = rest.split_whitespace().nth(1)?;
    Some(parse_number(ppid))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fake_process(root: &std::path::Path, pid: Pid, ppid: Pid, comm: &str, rss_kib: Option<u64>) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("stat"),
            format!("{pid} ({comm}) S {ppid} {pid} {pid} 0 -1 4194304 100 0 0 0"),
        )
        .unwrap();
        let rss = rss_kib
            .map(|kib| format!("VmRSS:\t{kib:>8} kB\n"))
            .unwrap_or_default();
        fs::write(
            dir.join("status"),
            format!("Name:\t{comm}\nState:\tS (sleeping)\nPPid:\t{ppid}\n{rss}Threads:\t1\n"),
        )
        .unwrap();
        fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
    }

    #[test]
    fn resident_converts_kib_to_bytes() {
        let root = tempfile::tempdir().unwrap();
        fake_process(root.path(), 10, 1, "sleep", Some(1536));

        let procfs = ProcFs::new(root.path());
        assert_eq!(procfs.resident(10).unwrap(), 1536 * 1024);
    }

    #[test]
    fn resident_missing_field_or_process() {
        let root = tempfile::tempdir().unwrap();
        fake_process(root.path(), 2, 0, "kthreadd", None);

        let procfs = ProcFs::new(root.path());
        assert!(matches!(
            procfs.resident(2),
            Err(ProbeError::MissingField { field: "VmRSS", .. })
        ));
        assert!(matches!(procfs.resident(99), Err(ProbeError::Read { .. })));
    }

    #[test]
    fn resident_rejects_garbage() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("5");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("status"), "VmRSS:\tlots kB\n").unwrap();

        let procfs = ProcFs::new(root.path());
        assert!(matches!(
            procfs.resident(5),
            Err(ProbeError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn parent_links_handle_odd_names_and_strays() {
        let root = tempfile::tempdir().unwrap();
        fake_process(root.path(), 1, 0, "init", Some(100));
        fake_process(root.path(), 20, 1, "my (odd) proc", Some(100));
        fake_process(root.path(), 21, 20, "child", Some(100));
        //non pid entries and half gone processes are skipped
        fs::create_dir_all(root.path().join("self")).unwrap();
        fs::write(root.path().join("uptime"), "1.0 2.0").unwrap();
        fs::create_dir_all(root.path().join("30")).unwrap();

        let mut links = ProcFs::new(root.path()).parent_links().unwrap();
        links.sort();
        assert_eq!(links, vec![(1, 0), (20, 1), (21, 20)]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let procfs = ProcFs::new(root.path().join("absent"));
        assert!(procfs.parent_links().is_err());
    }

    #[test]
    fn name_is_trimmed() {
        let root = tempfile::tempdir().unwrap();
        fake_process(root.path(), 3, 1, "cargo", Some(1));
        assert_eq!(ProcFs::new(root.path()).name(3).unwrap(), "cargo");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn reads_own_process() {
        let procfs = ProcFs::default();
        let pid = std::process::id();
        assert!(procfs.resident(pid).unwrap() > 0);
        assert!(procfs
            .parent_links()
            .unwrap()
            .iter()
            .any(|(child, _)| *child == pid));
    }
}
