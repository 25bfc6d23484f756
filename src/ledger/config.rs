//! Ledger configuration options.

/// Ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Minimum deposit in token units.
    pub min_deposit: u128,
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Enable verbose logging.
    pub verbose: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_deposit: 1,
            max_events: 100_000,
            verbose: false,
        }
    }
}
