//! Poll scheduler.
//!
//! Ticks at the shortest configured poll interval and, on every tick, runs a
//! cycle for each modem in its own task. A panic inside one modem's task is
//! logged and does not touch the others. Shutdown stops new ticks; the tick
//! in progress runs to completion.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use smsfwd_config::AppConfig;
use smsfwd_core::error::ForwardError;
use smsfwd_forwarders::ForwarderEnv;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::cycle::{CycleReport, ModemEndpoint};

/// Tick period used when no modem is configured.
pub const DEFAULT_TICK: Duration = Duration::from_secs(30);

pub struct Scheduler {
    endpoints: Vec<Arc<ModemEndpoint>>,
    tick: Duration,
}

impl Scheduler {
    pub fn new(endpoints: Vec<ModemEndpoint>) -> Self {
        let tick = endpoints
            .iter()
            .map(ModemEndpoint::poll_interval)
            .min()
            .unwrap_or(DEFAULT_TICK)
            .max(Duration::from_secs(1));
        Self {
            endpoints: endpoints.into_iter().map(Arc::new).collect(),
            tick,
        }
    }

    /// Build endpoints for every configured modem.
    pub fn from_config(config: &AppConfig) -> Result<Self, ForwardError> {
        let env = ForwarderEnv::from_settings(&config.daemon)?;
        let endpoints = config
            .modems
            .iter()
            .map(|modem| ModemEndpoint::from_config(modem, &config.daemon, &env))
            .collect();
        Ok(Self::new(endpoints))
    }

    pub fn tick_period(&self) -> Duration {
        self.tick
    }

    pub fn endpoints(&self) -> &[Arc<ModemEndpoint>] {
        &self.endpoints
    }

    /// Run one cycle on every modem concurrently and collect the reports.
    ///
    /// Modems whose task panicked are missing from the result.
    pub async fn run_tick(&self) -> Vec<CycleReport> {
        let handles: Vec<_> = self
            .endpoints
            .iter()
            .map(|endpoint| {
                let endpoint = Arc::clone(endpoint);
                let span = info_span!(
                    "cycle",
                    modem = %endpoint.port(),
                    cycle_id = %Uuid::new_v4()
                );
                let port = endpoint.port().to_string();
                let handle =
                    tokio::spawn(async move { endpoint.run_cycle().await }.instrument(span));
                (port, handle)
            })
            .collect();

        let (ports, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let mut reports = Vec::with_capacity(ports.len());

        for (port, joined) in ports.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) if e.is_panic() => {
                    error!(modem = %port, "Modem cycle panicked");
                }
                Err(e) => {
                    error!(modem = %port, error = %e, "Modem cycle task failed");
                }
            }
        }

        reports
    }

    /// Tick until `shutdown` is cancelled. The first tick fires immediately.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            modems = self.endpoints.len(),
            tick_secs = self.tick.as_secs(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    let reports = self.run_tick().await;
                    let delivered: usize = reports.iter().map(|r| r.delivered).sum();
                    debug!(modems = reports.len(), delivered, "Tick finished");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use async_trait::async_trait;
    use smsfwd_core::error::ModemError;
    use smsfwd_core::modem::ModemClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        port: &'static str,
        fetches: AtomicUsize,
        panics: bool,
    }

    impl Counting {
        fn new(port: &'static str, panics: bool) -> Arc<Self> {
            Arc::new(Self {
                port,
                fetches: AtomicUsize::new(0),
                panics,
            })
        }
    }

    #[async_trait]
    impl ModemClient for Counting {
        fn port(&self) -> &str {
            self.port
        }

        async fn fetch_feed(&self) -> Result<String, ModemError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.panics {
                panic!("modem driver bug");
            }
            Ok(r#"{"msg":[]}"#.into())
        }

        async fn delete_message(&self, _index: i64) -> Result<(), ModemError> {
            Ok(())
        }
    }

    fn endpoint(client: Arc<Counting>, secs: u64) -> ModemEndpoint {
        ModemEndpoint::new(
            client,
            Dispatcher::new(Vec::new(), Duration::from_secs(5)),
            Duration::from_secs(secs),
            false,
        )
    }

    #[test]
    fn tick_is_shortest_interval() {
        let s = Scheduler::new(vec![
            endpoint(Counting::new("a", false), 60),
            endpoint(Counting::new("b", false), 20),
        ]);
        assert_eq!(s.tick_period(), Duration::from_secs(20));
        assert_eq!(Scheduler::new(Vec::new()).tick_period(), DEFAULT_TICK);
        assert_eq!(
            Scheduler::new(vec![endpoint(Counting::new("c", false), 0)]).tick_period(),
            Duration::from_secs(1)
        );
    }

    #[tokio::test]
    async fn panicking_modem_does_not_stop_others() {
        let good = Counting::new("good", false);
        let bad = Counting::new("bad", true);
        let s = Scheduler::new(vec![endpoint(bad.clone(), 30), endpoint(good.clone(), 30)]);

        let reports = s.run_tick().await;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].port, "good");
        assert_eq!(bad.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(good.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_ticks_until_cancelled() {
        let modem = Counting::new("m", false);
        let s = Arc::new(Scheduler::new(vec![endpoint(modem.clone(), 10)]));
        let shutdown = CancellationToken::new();

        let task = {
            let s = Arc::clone(&s);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { s.run(shutdown).await })
        };

        // Immediate first tick, then one at 10s and one at 20s
        tokio::time::sleep(Duration::from_secs(25)).await;
        shutdown.cancel();
        task.await.unwrap();

        assert_eq!(modem.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancelled_before_start_runs_nothing() {
        let modem = Counting::new("m", false);
        let s = Scheduler::new(vec![endpoint(modem.clone(), 10)]);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        s.run(shutdown).await;

        assert_eq!(modem.fetches.load(Ordering::SeqCst), 0);
    }
}
