//! Cancellable periodic sampling of the playback position.

use std::time::Duration;
use tracing::trace;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Owns the platform timer primitive. Each scheduled task must report ticks tagged with
/// the generation it was started with.
pub trait TickScheduler {
    type Task;

    fn schedule(&mut self, period: Duration, generation: u64) -> Self::Task;
    fn cancel(&mut self, task: Self::Task);
}

/// At most one periodic task is alive at a time.
pub struct PollingClock<S: TickScheduler> {
    scheduler: S,
    period: Duration,
    generation: u64,
    active: Option<S::Task>,
}

impl<S: TickScheduler> PollingClock<S> {
    pub fn new(scheduler: S, period: Duration) -> Self {
        Self {
            scheduler,
            period,
            generation: 0,
            active: None,
        }
    }

    /// Starts sampling. A no-op while already running.
    pub fn start(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.generation += 1;
        trace!(generation = self.generation, "polling clock started");
        self.active = Some(self.scheduler.schedule(self.period, self.generation));
        true
    }

    pub fn stop(&mut self) -> bool {
        let Some(task) = self.active.take() else {
            return false;
        };
        trace!(generation = self.generation, "polling clock stopped");
        self.scheduler.cancel(task);
        true
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.active.is_some()
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a tick tagged `generation` belongs to the running task.
    pub fn accepts(&self, generation: u64) -> bool {
        self.active.is_some() && generation == self.generation
    }

    #[cfg(test)]
    pub(crate) fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

impl<S: TickScheduler> Drop for PollingClock<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
