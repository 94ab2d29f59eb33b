//! # smsfwd Modem
//!
//! [`ModemClient`](smsfwd_core::ModemClient) implementations.
//!
//! - [`TomModemClient`]: the `tom_modem` AT tool, one process per operation
//! - [`FeedFile`]: a captured feed on disk or stdin, read-only

pub mod feed_file;
pub mod tom_modem;

pub use feed_file::FeedFile;
pub use tom_modem::TomModemClient;
