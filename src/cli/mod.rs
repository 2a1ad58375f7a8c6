// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for pose tracking.
//!
//! This module contains the command-line interface logic, including argument parsing,
//! console logging and the `track` command implementation.

// Modules
/// CLI arguments.
pub mod args;

/// Console logging macros and verbosity flag.
pub mod logging;

/// Tracking command.
pub mod track;
