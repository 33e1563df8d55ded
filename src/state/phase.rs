use std::fmt;

/// Phases of the harvest loop
///
/// The loop never terminates on its own; it cycles through
/// `Selecting -> Scraping -> Cooling -> (Scraping | Idle) -> Selecting`
/// until a stop signal is observed between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Picking this run's forums and their order
    Selecting,

    /// Visiting one forum
    Scraping,

    /// Pausing between forums
    Cooling,

    /// Pausing between runs (also used when there is nothing to select)
    Idle,
}

impl RunPhase {
    /// Returns true if the loop may move from `self` to `next`
    ///
    /// `Selecting -> Idle` covers an empty forum list and a browser session
    /// that could not be opened. `Cooling -> Idle` ends a run.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Selecting, Scraping)
                | (Selecting, Idle)
                | (Scraping, Cooling)
                | (Cooling, Scraping)
                | (Cooling, Idle)
                | (Idle, Selecting)
        )
    }

    /// Returns true for the two sleeping phases
    pub fn is_pause(&self) -> bool {
        matches!(self, Self::Cooling | Self::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selecting => "selecting",
            Self::Scraping => "scraping",
            Self::Cooling => "cooling",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
