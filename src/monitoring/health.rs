//! Periodic background health checks.

use crate::core::Result;
use crate::region::{Orchestrator, RegionHealth, RegionStatus};
use crate::routing::RoutingSelector;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Interval used when no region configures one.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// Runs `check_health` on an orchestrator until shut down, optionally
/// forwarding each result to a routing selector.
pub struct HealthMonitor {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
    interval: Duration,
}

impl HealthMonitor {
    /// Spawn with the orchestrator's shortest configured interval.
    pub fn spawn(orchestrator: Arc<Orchestrator>, router: Option<Arc<RoutingSelector>>) -> Self {
        let interval = orchestrator
            .health_check_interval()
            .unwrap_or(DEFAULT_HEALTH_INTERVAL);
        Self::spawn_with_interval(orchestrator, router, interval)
    }

    /// Spawn with an explicit interval. A zero interval falls back to the default.
    pub fn spawn_with_interval(
        orchestrator: Arc<Orchestrator>,
        router: Option<Arc<RoutingSelector>>,
        interval: Duration,
    ) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_HEALTH_INTERVAL
        } else {
            interval
        };
        let (shutdown, mut stop) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(module = %orchestrator.name(), interval_ms = interval.as_millis() as u64, "health monitor started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = run_once(&orchestrator, router.as_deref()).await {
                            tracing::error!(module = %orchestrator.name(), error = %e, "health check failed");
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!(module = %orchestrator.name(), "health monitor stopped");
        });

        Self {
            shutdown,
            handle,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "health monitor task aborted");
        }
    }
}

/// One health pass: refresh the orchestrator, then the router if given.
pub async fn run_once(orchestrator: &Orchestrator, router: Option<&RoutingSelector>) -> Result<Vec<RegionHealth>> {
    let healths = orchestrator.check_health().await?;
    for h in healths.iter().filter(|h| h.status == RegionStatus::Failed) {
        tracing::warn!(module = %orchestrator.name(), region = %h.name, "region failed");
    }
    if let Some(router) = router {
        router.apply_health(&healths).await;
    }
    Ok(healths)
}
