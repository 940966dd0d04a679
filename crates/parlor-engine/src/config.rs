//! Engine configuration.

use std::time::Duration;

/// Tunables for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a finished match waits for result-screen
    /// acknowledgements before it is reclaimed unconditionally.
    ///
    /// Default: 60 seconds.
    pub reclaim_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reclaim_timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reclaim_timeout() {
        assert_eq!(
            EngineConfig::default().reclaim_timeout,
            Duration::from_secs(60)
        );
    }
}
