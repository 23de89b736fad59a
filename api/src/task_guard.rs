//! Single-flight guard around the background puller.
//!
//! The guard owns one slot for the task handle. A start request is rejected
//! while the task in the slot is still running; once it finished the slot is
//! simply overwritten by the next run. Nothing cancels or times out a run,
//! so a stuck pull keeps rejecting starts until the process restarts.

use std::sync::Arc;

use shared::{puller, PullerFactory};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Error, Debug, PartialEq, Eq)]
#[error("a pull is already running")]
pub struct AlreadyRunning;

pub struct PullGuard {
    factory: Arc<dyn PullerFactory>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PullGuard {
    pub fn new(factory: Arc<dyn PullerFactory>) -> Self {
        Self {
            factory,
            task: Mutex::new(None),
        }
    }

    /// Spawns a pull unless one is still in flight.
    pub async fn start(&self) -> Result<(), AlreadyRunning> {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(AlreadyRunning);
        }

        let factory = self.factory.clone();
        *task = Some(tokio::spawn(async move {
            info!("Starting puller!");
            let mut puller = factory.create();
            match puller::run(puller.as_mut()).await {
                Ok(()) => info!("Puller finished"),
                Err(e) => error!("Puller failed: {:#}", e),
            }
        }));
        Ok(())
    }

    /// Whether a pull is currently running.
    pub async fn status(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use shared::Puller;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Puller that blocks in `pull_tasks` until the gate is opened.
    struct GatedPuller {
        gate: Arc<Notify>,
        fail: bool,
    }

    #[async_trait]
    impl Puller for GatedPuller {
        async fn start(&mut self) -> Result<()> {
            Ok(())
        }

        async fn pull_tasks(&mut self) -> Result<()> {
            self.gate.notified().await;
            if self.fail {
                bail!("upstream unavailable");
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct GatedFactory {
        gate: Arc<Notify>,
        created: AtomicUsize,
        fail: bool,
    }

    impl PullerFactory for GatedFactory {
        fn create(&self) -> Box<dyn Puller> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Box::new(GatedPuller {
                gate: self.gate.clone(),
                fail: self.fail,
            })
        }
    }

    fn guard(fail: bool) -> (PullGuard, Arc<GatedFactory>) {
        let factory = Arc::new(GatedFactory {
            gate: Arc::new(Notify::new()),
            created: AtomicUsize::new(0),
            fail,
        });
        (PullGuard::new(factory.clone()), factory)
    }

    async fn wait_until_idle(guard: &PullGuard) {
        for _ in 0..200 {
            if !guard.status().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("pull never finished");
    }

    #[tokio::test]
    async fn test_not_running_before_first_start() {
        let (guard, _) = guard(false);
        assert!(!guard.status().await);
    }

    #[tokio::test]
    async fn test_second_start_rejected_while_running() {
        let (guard, factory) = guard(false);

        assert_eq!(guard.start().await, Ok(()));
        assert!(guard.status().await);
        assert_eq!(guard.start().await, Err(AlreadyRunning));

        factory.gate.notify_one();
        wait_until_idle(&guard).await;
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_finished_task_is_replaced() {
        let (guard, factory) = guard(false);

        guard.start().await.unwrap();
        factory.gate.notify_one();
        wait_until_idle(&guard).await;

        assert_eq!(guard.start().await, Ok(()));
        assert!(guard.status().await);

        factory.gate.notify_one();
        wait_until_idle(&guard).await;
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_pull_frees_the_slot() {
        let (guard, factory) = guard(true);

        guard.start().await.unwrap();
        factory.gate.notify_one();
        wait_until_idle(&guard).await;

        assert_eq!(guard.start().await, Ok(()));
        factory.gate.notify_one();
        wait_until_idle(&guard).await;
    }
}
