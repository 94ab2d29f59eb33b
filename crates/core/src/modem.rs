//! Modem trait: the abstraction over SMS storage on a cellular modem.
//!
//! A modem exposes its stored messages as a raw feed and lets the daemon
//! delete individual storage slots once their content has been delivered.

use async_trait::async_trait;

use crate::error::ModemError;

/// Access to one modem's SMS storage.
///
/// Implementations own the transport (AT tool, serial port, file) and must be
/// safe to share across tasks; the pipeline never holds mutable state on them.
#[async_trait]
pub trait ModemClient: Send + Sync {
    /// Port or handle identifying the modem (e.g. `/dev/ttyUSB2`).
    fn port(&self) -> &str;

    /// Retrieve the current message list as a raw payload.
    ///
    /// An empty payload is reported as [`ModemError::EmptyFeed`].
    async fn fetch_feed(&self) -> Result<String, ModemError>;

    /// Delete a single stored message by storage index.
    async fn delete_message(&self, index: i64) -> Result<(), ModemError>;
}
