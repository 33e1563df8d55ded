//! State tracking for the harvest loop

mod phase;

pub use phase::RunPhase;
