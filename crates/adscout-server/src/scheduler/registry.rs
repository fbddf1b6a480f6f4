//! Named recurring jobs on top of `tokio-cron-scheduler`.
//!
//! Each job fires in its own task. A firing that arrives while the previous
//! run of the same job is still in flight is skipped.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use adscout_core::Clock;
use adscout_pipeline::TriggerSpec;
use chrono::{DateTime, FixedOffset, Utc};
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

pub type RunFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),

    #[error("job '{0}' is already registered")]
    Duplicate(String),

    #[error("no job named '{0}'")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobState {
    pub active: bool,
    pub running: bool,
    pub next_fire: Option<DateTime<Utc>>,
}

struct Entry {
    trigger: TriggerSpec,
    run: RunFn,
    in_flight: Arc<AtomicBool>,
    job_id: Option<Uuid>,
}

/// Clears the in-flight flag when a run ends, including by panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Start `run` in a new task unless it is already in flight.
fn dispatch(name: &str, in_flight: &Arc<AtomicBool>, run: &RunFn) -> Option<JoinHandle<()>> {
    if in_flight.swap(true, Ordering::SeqCst) {
        tracing::warn!(job = %name, "scheduler: previous run still in flight, skipping");
        return None;
    }
    let guard = InFlight(Arc::clone(in_flight));
    let fut = run();
    let name = name.to_owned();
    Some(tokio::spawn(async move {
        let _guard = guard;
        tracing::info!(job = %name, "scheduler: run started");
        fut.await;
        tracing::info!(job = %name, "scheduler: run finished");
    }))
}

pub struct JobRegistry {
    scheduler: JobScheduler,
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
    entries: BTreeMap<String, Entry>,
    started: bool,
    /// Set by [`JobRegistry::stop_all`]; the next start builds a new timer.
    shut_down: bool,
}

impl JobRegistry {
    /// # Errors
    ///
    /// Returns [`RegistryError::Scheduler`] if the underlying scheduler
    /// cannot be created.
    pub async fn new(offset: FixedOffset, clock: Arc<dyn Clock>) -> Result<Self, RegistryError> {
        Ok(Self {
            scheduler: JobScheduler::new().await?,
            offset,
            clock,
            entries: BTreeMap::new(),
            started: false,
            shut_down: false,
        })
    }

    /// Add a job. It does not fire until [`Self::start_all`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if `name` is taken.
    pub fn register(
        &mut self,
        name: &str,
        trigger: TriggerSpec,
        run: RunFn,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_owned()));
        }
        self.entries.insert(
            name.to_owned(),
            Entry {
                trigger,
                run,
                in_flight: Arc::new(AtomicBool::new(false)),
                job_id: None,
            },
        );
        tracing::debug!(job = %name, trigger = %trigger, "scheduler: job registered");
        Ok(())
    }

    /// Schedule every inactive job and start the timer. After
    /// [`Self::stop_all`] a fresh timer replaces the one that was shut down.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Scheduler`] if a cron job cannot be created
    /// or the scheduler fails to start.
    pub async fn start_all(&mut self) -> Result<(), RegistryError> {
        if self.shut_down {
            self.scheduler = JobScheduler::new().await?;
            self.shut_down = false;
        }
        for (name, entry) in &mut self.entries {
            if entry.job_id.is_some() {
                continue;
            }
            let job_name = name.clone();
            let in_flight = Arc::clone(&entry.in_flight);
            let run = Arc::clone(&entry.run);
            let job = Job::new_async_tz(
                entry.trigger.cron_expression().as_str(),
                self.offset,
                move |_uuid, _lock| {
                    dispatch(&job_name, &in_flight, &run);
                    Box::pin(async {})
                },
            )?;
            entry.job_id = Some(self.scheduler.add(job).await?);
            tracing::info!(
                job = %name,
                cron = %entry.trigger.cron_expression(),
                "scheduler: job active"
            );
        }

        if !self.started {
            self.scheduler.start().await?;
            self.started = true;
        }
        Ok(())
    }

    /// Deactivate one job. A run already in flight is left to finish.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unknown`] for an unregistered name or
    /// [`RegistryError::Scheduler`] if removal fails.
    pub async fn stop_job(&mut self, name: &str) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| RegistryError::Unknown(name.to_owned()))?;
        if let Some(id) = entry.job_id.take() {
            self.scheduler.remove(&id).await?;
            tracing::info!(job = %name, "scheduler: job stopped");
        }
        Ok(())
    }

    /// Deactivate every job and shut the timer down.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError::Scheduler`] hit; remaining jobs are
    /// still deactivated.
    pub async fn stop_all(&mut self) -> Result<(), RegistryError> {
        let mut first_err = None;
        for (name, entry) in &mut self.entries {
            if let Some(id) = entry.job_id.take() {
                if let Err(e) = self.scheduler.remove(&id).await {
                    tracing::warn!(job = %name, error = %e, "scheduler: failed to remove job");
                    first_err.get_or_insert(e);
                }
            }
        }
        if self.started {
            self.scheduler.shutdown().await?;
            self.started = false;
            self.shut_down = true;
        }
        tracing::info!("scheduler: all jobs stopped");
        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Fire `name` immediately, outside its schedule. Returns `None` when the
    /// job is already in flight and the firing was skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unknown`] for an unregistered name.
    pub fn run_now(&self, name: &str) -> Result<Option<JoinHandle<()>>, RegistryError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RegistryError::Unknown(name.to_owned()))?;
        Ok(dispatch(name, &entry.in_flight, &entry.run))
    }

    #[must_use]
    pub fn status(&self) -> BTreeMap<String, JobState> {
        let now = self.clock.now();
        self.entries
            .iter()
            .map(|(name, entry)| {
                let active = entry.job_id.is_some();
                let state = JobState {
                    active,
                    running: entry.in_flight.load(Ordering::SeqCst),
                    next_fire: active.then(|| entry.trigger.next_fire_after(now, self.offset)),
                };
                (name.clone(), state)
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
