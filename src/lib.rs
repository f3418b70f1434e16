//! Stream a prebuilt SQLite database over HTTP and query it in memory.
//!
//! The pipeline is [`loader::Loader`] → [`session::Session`] →
//! [`shaper`], with [`dataset::Dataset`] composing the three behind the
//! consumer-facing API.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod format;
pub mod format_csv;
pub mod format_detect;
pub mod loader;
pub mod masking;
pub mod output;
pub mod session;
pub mod shaper;
pub mod verbose;
