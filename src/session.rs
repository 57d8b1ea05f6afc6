use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    memory,
    myprocess::{Pid, ProcessRecord},
    source::{display_name, ProcessSource},
    tracker::PeakTracker,
    tree,
};

/// Background sampling of one process tree.
///
/// The sampling task is the only writer to the tracker. [`stop`](Self::stop)
/// returns only after that task has finished, so the records it hands back
/// can no longer change.
pub struct SamplingSession {
    root: Pid,
    tracker: Arc<PeakTracker>,
    cycles: Arc<AtomicU64>,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SamplingSession {
    /// Starts sampling right away; the first cycle runs without waiting for
    /// `interval`. Must be called from within a tokio runtime.
    pub fn start(root: Pid, source: Arc<dyn ProcessSource>, interval: Duration) -> Self {
        let tracker = Arc::new(PeakTracker::new());
        let cycles = Arc::new(AtomicU64::new(0));
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(
            root,
            source,
            interval,
            Arc::clone(&tracker),
            Arc::clone(&cycles),
            token.clone(),
        ));
        log::debug!("sampling {root} every {interval:?}");
        Self {
            root,
            tracker,
            cycles,
            token,
            handle,
        }
    }

    pub fn root(&self) -> Pid {
        self.root
    }

    /// Halts sampling and waits for the task to acknowledge.
    ///
    /// A cycle in progress is allowed to finish; no extra cycle is run.
    pub async fn stop(self) -> Vec<ProcessRecord> {
        //cancellation is sticky, a task mid cycle sees it at the top of the next one
        self.token.cancel();
        if let Err(err) = self.handle.await {
            log::error!("sampling task for {} failed: {}", self.root, err);
        }
        log::debug!(
            "stopped sampling {} after {} cycles, {} processes tracked",
            self.root,
            self.cycles.load(Ordering::Acquire),
            self.tracker.len()
        );
        self.tracker.snapshot()
    }

    #[cfg(test)]
    fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }
}

async fn run(
    root: Pid,
    source: Arc<dyn ProcessSource>,
    interval: Duration,
    tracker: Arc<PeakTracker>,
    cycles: Arc<AtomicU64>,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let source = Arc::clone(&source);
        let tracker = Arc::clone(&tracker);
        //procfs reads and ps runs block, keep them off the runtime threads
        let cycle =
            tokio::task::spawn_blocking(move || poll_cycle(root, source.as_ref(), &tracker)).await;
        match cycle {
            Ok(sampled) => {
                let n = cycles.fetch_add(1, Ordering::AcqRel) + 1;
                log::trace!("cycle {n}: {sampled} processes sampled");
            }
            Err(err) => log::error!("poll cycle for {root} failed: {err}"),
        }
    }
}

/// One walk, sample and fold pass. Returns how many processes gave a sample.
pub fn poll_cycle(root: Pid, source: &dyn ProcessSource, tracker: &PeakTracker) -> usize {
    let mut sampled = 0;
    for pid in tree::descendants(source, root) {
        let bytes = memory::sample(source, pid);
        if bytes == 0 {
            continue;
        }
        sampled += 1;
        tracker.update(pid, display_name(source, pid), bytes);
    }
    sampled
}
