//! # smsfwd Core
//!
//! Domain types, capability traits, and error definitions for the smsfwd
//! SMS forwarding daemon. Nothing here talks to a modem or the network; it
//! defines the model that every other crate implements against.
//!
//! Every external collaborator (modem access, delivery target) is a trait
//! here, with implementations in their own crates. The pipeline only ever
//! sees the traits, so tests run it against fake modems and forwarders.

pub mod error;
pub mod forwarder;
pub mod message;
pub mod modem;

// Re-export key types at crate root for ergonomics
pub use error::{FeedError, ForwardError, ModemError};
pub use forwarder::{ForwardContext, Forwarder};
pub use message::{GroupKey, LogicalMessage, MessagePart};
pub use modem::ModemClient;
