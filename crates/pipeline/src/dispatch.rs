//! Forward dispatcher: one message, every forwarder of its modem.
//!
//! All forwarders run concurrently and independently; one failing never stops
//! another. Each call gets its own [`ForwardContext`] and its own timeout.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use smsfwd_core::error::ForwardError;
use smsfwd_core::forwarder::{ForwardContext, Forwarder};
use smsfwd_core::message::LogicalMessage;
use tracing::{info, warn};

/// One forwarder that did not deliver.
#[derive(Debug, Clone)]
pub struct ForwardFailure {
    pub forwarder: String,
    pub error: ForwardError,
}

/// Outcome of dispatching one message.
#[derive(Debug, Clone, Default)]
pub struct DispatchResult {
    /// Forwarders invoked
    pub attempted: usize,
    /// Forwarders that reported success
    pub delivered: usize,
    pub failures: Vec<ForwardFailure>,
}

impl DispatchResult {
    /// At least one forwarder delivered. This alone (with the modem's delete
    /// policy) decides whether the source parts are deleted.
    pub fn succeeded(&self) -> bool {
        self.delivered > 0
    }
}

/// The forwarders configured for one modem.
#[derive(Clone)]
pub struct Dispatcher {
    forwarders: Vec<Arc<dyn Forwarder>>,
    timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("forwarders", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(forwarders: Vec<Arc<dyn Forwarder>>, timeout: Duration) -> Self {
        Self {
            forwarders,
            timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.forwarders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forwarders.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.forwarders.iter().map(|f| f.name()).collect()
    }

    /// Hand `message` to every forwarder and collect the outcomes.
    pub async fn dispatch(&self, message: &LogicalMessage) -> DispatchResult {
        let calls = self.forwarders.iter().map(|forwarder| {
            let ctx = ForwardContext::from_message(message);
            let timeout = self.timeout;
            async move {
                let outcome = match tokio::time::timeout(timeout, forwarder.forward(&ctx)).await {
                    Ok(result) => result,
                    Err(_) => Err(ForwardError::Timeout {
                        forwarder: forwarder.name().to_string(),
                        timeout_secs: timeout.as_secs(),
                    }),
                };
                (forwarder.name(), outcome)
            }
        });

        let mut result = DispatchResult {
            attempted: self.forwarders.len(),
            ..DispatchResult::default()
        };

        for (name, outcome) in join_all(calls).await {
            match outcome {
                Ok(()) => {
                    info!(forwarder = %name, sender = %message.sender, "Message forwarded");
                    result.delivered += 1;
                }
                Err(error) => {
                    warn!(forwarder = %name, sender = %message.sender, error = %error, "Forward failed");
                    result.failures.push(ForwardFailure {
                        forwarder: name.to_string(),
                        error,
                    });
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the contexts it receives; fails when `ok` is false.
    struct Recording {
        name: &'static str,
        ok: bool,
        seen: Mutex<Vec<ForwardContext>>,
    }

    impl Recording {
        fn new(name: &'static str, ok: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                ok,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Forwarder for Recording {
        fn name(&self) -> &str {
            self.name
        }

        async fn forward(&self, ctx: &ForwardContext) -> Result<(), ForwardError> {
            self.seen.lock().unwrap().push(ctx.clone());
            if self.ok {
                Ok(())
            } else {
                Err(ForwardError::delivery(self.name, "rejected"))
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl Forwarder for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn forward(&self, _ctx: &ForwardContext) -> Result<(), ForwardError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn message() -> LogicalMessage {
        LogicalMessage {
            content: "Hello World".into(),
            sender: "B".into(),
            timestamp: 1_700_000_000,
            source_indices: vec![1, 2],
        }
    }

    fn dispatcher(forwarders: Vec<Arc<dyn Forwarder>>) -> Dispatcher {
        Dispatcher::new(forwarders, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn one_success_is_enough() {
        let good = Recording::new("good", true);
        let bad = Recording::new("bad", false);
        let result = dispatcher(vec![
            bad.clone() as Arc<dyn Forwarder>,
            good.clone() as Arc<dyn Forwarder>,
            bad.clone() as Arc<dyn Forwarder>,
        ])
        .dispatch(&message())
        .await;
        assert_eq!(result.attempted, 3);
        assert_eq!(result.delivered, 1);
        assert_eq!(result.failures.len(), 2);
        assert!(result.succeeded());
        // No short-circuit: the failing forwarder was called both times
        assert_eq!(bad.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn all_failing_is_not_success() {
        let bad = Recording::new("bad", false);
        let result = dispatcher(vec![bad.clone() as Arc<dyn Forwarder>, bad])
            .dispatch(&message())
            .await;
        assert_eq!(result.attempted, 2);
        assert!(!result.succeeded());
        assert_eq!(result.failures[0].forwarder, "bad");
    }

    #[tokio::test]
    async fn no_forwarders_is_not_success() {
        let result = dispatcher(Vec::new()).dispatch(&message()).await;
        assert_eq!(result.attempted, 0);
        assert!(!result.succeeded());
    }

    #[tokio::test]
    async fn each_forwarder_gets_message_fields() {
        let a = Recording::new("a", true);
        let b = Recording::new("b", true);
        dispatcher(vec![a.clone() as Arc<dyn Forwarder>, b.clone()])
            .dispatch(&message())
            .await;

        let seen_a = a.seen.lock().unwrap();
        let seen_b = b.seen.lock().unwrap();
        assert_eq!(seen_a[0].sender, "B");
        assert_eq!(seen_a[0].content, "Hello World");
        assert_eq!(seen_a[0].time, message().formatted_time());
        assert_eq!(*seen_a, *seen_b);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_forwarder_times_out() {
        let good = Recording::new("good", true);
        let forwarders: Vec<Arc<dyn Forwarder>> = vec![Arc::new(Stalled), good];
        let result = Dispatcher::new(forwarders, Duration::from_secs(2))
            .dispatch(&message())
            .await;
        assert!(result.succeeded());
        assert!(matches!(
            result.failures[0].error,
            ForwardError::Timeout { timeout_secs: 2, .. }
        ));
    }
}
