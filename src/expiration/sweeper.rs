//! Periodic reclamation of expired state
//!
//! One background task drives every [`Sweep`] target on a fixed interval.
//! The task lives until [`SweeperHandle::shutdown`] is called.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info};

/// Something holding state that goes stale with time
#[async_trait]
pub trait Sweep: Send + Sync {
    /// Label used in logs
    fn name(&self) -> &'static str;

    /// Drop stale entries, returning how many were reclaimed
    async fn sweep(&self) -> anyhow::Result<usize>;
}

pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for the task to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!("Sweeper task ended abnormally: {}", e);
        }
    }
}

/// Run one pass over every target
pub async fn sweep_all(targets: &[Arc<dyn Sweep>]) -> usize {
    let mut total = 0;
    for target in targets {
        match target.sweep().await {
            Ok(0) => {}
            Ok(reclaimed) => {
                debug!(target = target.name(), reclaimed, "sweep reclaimed entries");
                total += reclaimed;
            }
            Err(e) => error!(target = target.name(), "Sweep failed: {}", e),
        }
    }
    total
}

/// Spawn the background sweeper
pub fn spawn_sweeper(interval: Duration, targets: Vec<Arc<dyn Sweep>>) -> SweeperHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(interval);

        // Skip the first tick which fires immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let reclaimed = sweep_all(&targets).await;
                    if reclaimed > 0 {
                        info!("Sweeper reclaimed {} expired entries", reclaimed);
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping sweeper");
                        break;
                    }
                }
            }
        }
    });

    SweeperHandle { shutdown_tx, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTarget {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl Sweep for CountingTarget {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn sweep(&self) -> anyhow::Result<usize> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    struct FailingTarget;

    #[async_trait]
    impl Sweep for FailingTarget {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn sweep(&self) -> anyhow::Result<usize> {
            anyhow::bail!("boom")
        }
    }

    #[tokio::test]
    async fn test_sweep_all_continues_past_failures() {
        let counting = Arc::new(CountingTarget {
            runs: AtomicUsize::new(0),
        });
        let targets: Vec<Arc<dyn Sweep>> = vec![Arc::new(FailingTarget), counting.clone()];

        assert_eq!(sweep_all(&targets).await, 1);
        assert_eq!(counting.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_ticks_and_stops() {
        let counting = Arc::new(CountingTarget {
            runs: AtomicUsize::new(0),
        });
        let handle = spawn_sweeper(Duration::from_secs(60), vec![counting.clone()]);

        time::sleep(Duration::from_secs(150)).await;
        assert_eq!(counting.runs.load(Ordering::SeqCst), 2);

        handle.shutdown().await;
        time::sleep(Duration::from_secs(600)).await;
        assert_eq!(counting.runs.load(Ordering::SeqCst), 2);
    }
}
