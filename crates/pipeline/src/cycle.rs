//! One poll cycle for one modem.
//!
//! `Idle → Fetching → Parsing → Reassembling → Dispatching → Deleting → Idle`
//!
//! A fetch or parse failure ends the cycle early with nothing forwarded and
//! nothing deleted. Messages are dispatched one after another; a message's
//! parts are deleted only when the modem's policy asks for it and at least
//! one forwarder delivered it.

use std::sync::Arc;
use std::time::Duration;

use smsfwd_config::{DaemonSettings, ModemConfig};
use smsfwd_core::error::{FeedError, ModemError};
use smsfwd_core::modem::ModemClient;
use smsfwd_forwarders::ForwarderEnv;
use smsfwd_modem::TomModemClient;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::parser::parse_feed;
use crate::reassembly::reassemble_detailed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Parsing,
    Reassembling,
    Dispatching,
    Deleting,
}

/// How a cycle ended.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Completed,
    FetchFailed(ModemError),
    MalformedFeed(FeedError),
}

impl CycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Everything a cycle did, for logs and `smsfwd once`.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub port: String,
    pub outcome: CycleOutcome,
    /// Records parsed from the feed
    pub parts: usize,
    /// Logical messages after reassembly
    pub messages: usize,
    /// Messages at least one forwarder delivered
    pub delivered: usize,
    /// Storage indices deleted
    pub deleted: Vec<i64>,
    /// Storage indices whose deletion failed
    pub delete_failures: Vec<i64>,
    /// Failed forwarder calls, across all messages
    pub forward_failures: usize,
    /// Multi-part groups dropped as incomplete
    pub incomplete_groups: usize,
}

impl CycleReport {
    fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            outcome: CycleOutcome::Completed,
            parts: 0,
            messages: 0,
            delivered: 0,
            deleted: Vec::new(),
            delete_failures: Vec::new(),
            forward_failures: 0,
            incomplete_groups: 0,
        }
    }
}

/// A modem plus the forwarders and policy that apply to it.
#[derive(Clone)]
pub struct ModemEndpoint {
    client: Arc<dyn ModemClient>,
    dispatcher: Dispatcher,
    poll_interval: Duration,
    delete_after_forward: bool,
}

impl std::fmt::Debug for ModemEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModemEndpoint")
            .field("port", &self.port())
            .field("dispatcher", &self.dispatcher)
            .field("poll_interval", &self.poll_interval)
            .field("delete_after_forward", &self.delete_after_forward)
            .finish()
    }
}

impl ModemEndpoint {
    pub fn new(
        client: Arc<dyn ModemClient>,
        dispatcher: Dispatcher,
        poll_interval: Duration,
        delete_after_forward: bool,
    ) -> Self {
        Self {
            client,
            dispatcher,
            poll_interval,
            delete_after_forward,
        }
    }

    /// Wire a configured modem to `tom_modem` and its forwarders.
    pub fn from_config(modem: &ModemConfig, settings: &DaemonSettings, env: &ForwarderEnv) -> Self {
        let client = TomModemClient::new(&modem.modem_port, &settings.tom_modem_bin).with_timeouts(
            Duration::from_secs(settings.fetch_timeout_secs),
            Duration::from_secs(settings.delete_timeout_secs),
        );
        let forwarders = smsfwd_forwarders::build_all(&modem.modem_port, &modem.apis, env);
        Self::new(
            Arc::new(client),
            Dispatcher::new(forwarders, Duration::from_secs(settings.forward_timeout_secs)),
            Duration::from_secs(modem.poll_interval),
            modem.delete_after_forward,
        )
    }

    pub fn port(&self) -> &str {
        self.client.port()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn delete_after_forward(&self) -> bool {
        self.delete_after_forward
    }

    fn enter(&self, state: CycleState) {
        debug!(modem = %self.port(), state = ?state, "Cycle state");
    }

    /// Run one full cycle. Never fails; problems end up in the report.
    pub async fn run_cycle(&self) -> CycleReport {
        let port = self.port();
        let mut report = CycleReport::new(port);

        self.enter(CycleState::Fetching);
        let feed = match self.client.fetch_feed().await {
            Ok(feed) => feed,
            Err(e) => {
                warn!(modem = %port, error = %e, "Failed to fetch SMS list");
                report.outcome = CycleOutcome::FetchFailed(e);
                self.enter(CycleState::Idle);
                return report;
            }
        };

        self.enter(CycleState::Parsing);
        let parts = match parse_feed(&feed) {
            Ok(parts) => parts,
            Err(e) => {
                warn!(modem = %port, error = %e, "Failed to parse SMS list");
                report.outcome = CycleOutcome::MalformedFeed(e);
                self.enter(CycleState::Idle);
                return report;
            }
        };
        report.parts = parts.len();

        self.enter(CycleState::Reassembling);
        let assembled = reassemble_detailed(&parts);
        report.messages = assembled.messages.len();
        report.incomplete_groups = assembled.incomplete.len();

        if !assembled.messages.is_empty() {
            info!(
                modem = %port,
                parts = report.parts,
                messages = report.messages,
                "Processing SMS messages"
            );
        }

        for message in &assembled.messages {
            self.enter(CycleState::Dispatching);
            let result = self.dispatcher.dispatch(message).await;
            report.forward_failures += result.failures.len();

            if !result.succeeded() {
                warn!(
                    modem = %port,
                    sender = %message.sender,
                    forwarders = self.dispatcher.len(),
                    "No forwarder delivered message"
                );
                continue;
            }
            report.delivered += 1;

            if !self.delete_after_forward {
                continue;
            }

            self.enter(CycleState::Deleting);
            for &index in &message.source_indices {
                match self.client.delete_message(index).await {
                    Ok(()) => {
                        info!(modem = %port, index, "Deleted SMS");
                        report.deleted.push(index);
                    }
                    Err(e) => {
                        warn!(modem = %port, index, error = %e, "Failed to delete SMS");
                        report.delete_failures.push(index);
                    }
                }
            }
        }

        self.enter(CycleState::Idle);
        report
    }
}
