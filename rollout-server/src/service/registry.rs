//! Rollout registry
//!
//! Supervisory record of the worker tasks the dispatcher has launched. The
//! dispatcher's callers never see these handles; they exist so the process
//! can count in-flight rollouts and wait for them during shutdown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, warn};

#[derive(Clone, Default)]
pub struct RolloutRegistry {
    tasks: Arc<Mutex<HashMap<String, Vec<JoinHandle<()>>>>>,
}

impl RolloutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the task running a rollout
    ///
    /// Finished tasks are pruned first, so the map only grows with rollouts
    /// that are still in flight. A rollout id that is already active keeps
    /// both tasks.
    pub fn track(&self, rollout_id: String, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);

        tasks.retain(|_, handles| {
            handles.retain(|handle| !handle.is_finished());
            !handles.is_empty()
        });

        if tasks.contains_key(&rollout_id) {
            warn!(
                "Rollout {} is already active; tracking another worker under it",
                rollout_id
            );
        }
        tasks.entry(rollout_id).or_default().push(handle);
    }

    /// Number of worker tasks that have not finished yet
    pub fn active_count(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .flatten()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Whether a rollout still has an unfinished worker
    pub fn is_active(&self, rollout_id: &str) -> bool {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(rollout_id)
            .is_some_and(|handles| handles.iter().any(|handle| !handle.is_finished()))
    }

    /// Ids of rollouts that still have an unfinished worker, sorted
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, handles)| handles.iter().any(|handle| !handle.is_finished()))
            .map(|(rollout_id, _)| rollout_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Waits for every tracked task to finish and forgets them
    ///
    /// Returns how many tasks were awaited. Tasks tracked while draining are
    /// picked up by the next loop iteration.
    pub async fn drain(&self) -> usize {
        match self.drain_until(None).await {
            Ok(drained) | Err(drained) => drained,
        }
    }

    /// Like [`drain`](Self::drain), but gives up after `limit`
    ///
    /// On timeout the unfinished tasks stay tracked, so [`active_ids`](Self::active_ids)
    /// still reports them and a later drain can pick them up again. The error
    /// carries the number of tasks awaited before the deadline.
    pub async fn drain_within(&self, limit: Duration) -> Result<usize, usize> {
        self.drain_until(Some(Instant::now() + limit)).await
    }

    async fn drain_until(&self, deadline: Option<Instant>) -> Result<usize, usize> {
        let mut drained = 0;

        loop {
            let mut pending: Vec<(String, JoinHandle<()>)> = self
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain()
                .flat_map(|(rollout_id, handles)| {
                    handles
                        .into_iter()
                        .map(move |handle| (rollout_id.clone(), handle))
                })
                .collect();

            if pending.is_empty() {
                break;
            }

            while let Some((rollout_id, mut handle)) = pending.pop() {
                let joined = match deadline {
                    Some(deadline) => match time::timeout_at(deadline, &mut handle).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            pending.push((rollout_id, handle));
                            self.restore(pending);
                            debug!("Drain timed out after {} rollout worker(s)", drained);
                            return Err(drained);
                        }
                    },
                    None => (&mut handle).await,
                };

                if let Err(e) = joined {
                    warn!("Worker task for rollout {} failed: {}", rollout_id, e);
                }
                drained += 1;
            }
        }

        debug!("Drained {} rollout worker(s)", drained);
        Ok(drained)
    }

    /// Aborts every tracked task and forgets it, returning how many were aborted
    ///
    /// An aborted worker emits no terminal status.
    pub fn abort_all(&self) -> usize {
        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .flat_map(|(_, handles)| handles)
            .collect();

        for handle in &tasks {
            handle.abort();
        }
        tasks.len()
    }

    fn restore(&self, pending: Vec<(String, JoinHandle<()>)>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for (rollout_id, handle) in pending {
            tasks.entry(rollout_id).or_default().push(handle);
        }
    }
}
