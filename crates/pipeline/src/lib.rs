//! # smsfwd Pipeline
//!
//! The poll cycle: fetch the modem's feed, parse it into parts, reassemble
//! multi-part messages, hand each message to every forwarder and, when the
//! modem's policy allows, delete what was delivered.
//!
//! ```text
//! Scheduler ─tick─▶ ModemEndpoint::run_cycle
//!                     fetch → parse_feed → reassemble → Dispatcher → delete
//! ```

pub mod cycle;
pub mod dispatch;
pub mod parser;
pub mod reassembly;
pub mod scheduler;

pub use cycle::{CycleOutcome, CycleReport, CycleState, ModemEndpoint};
pub use dispatch::{DispatchResult, Dispatcher, ForwardFailure};
pub use parser::parse_feed;
pub use reassembly::{IncompleteGroup, Reassembled, reassemble, reassemble_detailed};
pub use scheduler::Scheduler;
