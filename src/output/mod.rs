//! Output module for reporting on harvested posts
//!
//! This module handles:
//! - Loading post statistics from storage
//! - Printing them for the `--stats` mode

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
