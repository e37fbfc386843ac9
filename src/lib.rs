//! Household chore tracking: the chore lifecycle engine (completion with
//! recurrence rollover, sorting, filtering, statistics) plus a JSON-file
//! store and the command handlers behind the `choreboard` binary.

pub mod commands;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod stats;
pub mod storage;
pub mod tui;
pub mod views;
