//! WorkScan: submit business workflows to a remote analysis backend and review how much of
//! them can be automated.
//!
//! The library holds the submission flow, the backend client, task intake, and the result
//! views. The `workscan` binary adds the CLI and the TUI on top.

pub mod backend;
pub mod capture;
pub mod cli;
mod draft;
pub mod error;
pub mod export;
pub mod flow;
pub mod intake;
pub mod metrics;
pub mod model;
pub mod report;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
pub mod verification;
