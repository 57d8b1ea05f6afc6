pub type Pid = u32;

///peak observation of a single process in the tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub name: String,
    pub peak_memory: u64,
}

impl ProcessRecord {
    pub fn new(pid: Pid, name: String, peak_memory: u64) -> Self {
        Self {
            pid,
            name,
            peak_memory,
        }
    }

    ///returns true if the peak was raised
    pub fn observe(&mut self, bytes: u64) -> bool {
        if bytes > self.peak_memory {
            self.peak_memory = bytes;
            true
        } else {
            false
        }
    }
}
