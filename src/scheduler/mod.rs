pub mod tasks;

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info};

/// Owns the background jobs; they stop when [`Scheduler::shutdown`] runs.
pub struct Scheduler {
    inner: JobScheduler,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self { inner })
    }

    /// Run `tick` every `period`. The first run happens one period after
    /// [`Scheduler::start`]; a tick that is still running is not cancelled
    /// by the next one.
    pub async fn every<F, Fut>(&self, period: Duration, name: &'static str, tick: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_repeated_async(period, move |_uuid, _lock| {
            let fut = tick();
            Box::pin(async move {
                debug!("Running {}", name);
                fut.await;
            })
        })
        .with_context(|| format!("Failed to create job {}", name))?;

        self.inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job {}", name))?;
        info!("Job {} runs every {:?}", name, period);
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shut down scheduler")?;
        info!("Background jobs stopped");
        Ok(())
    }
}
