//! `facdir` crate (library surface).
//!
//! The primary entrypoint is the `facdir` binary (HTTP server + one-shot scrape).
//! The router lives here so it can be mounted and tested without the CLI.

pub use facdir_core as core;
pub use facdir_local as local;

pub mod http;
