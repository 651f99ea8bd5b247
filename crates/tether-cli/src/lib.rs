//! Tether host tool
//!
//! Library half of the `tether` binary: the demo host types, the JSON-lines
//! transport and the subcommands, kept here so integration tests can drive
//! them without spawning a process.

pub mod commands;
pub mod host;
pub mod output;
pub mod transport;
