//! `chfs-debt` library crate.
//!
//! The binary (`chfs`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - each stage (ingest, validation, features, estimation, reporting) can be
//!   driven on its own from tests or notebooks

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
pub mod validate;
