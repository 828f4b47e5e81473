use log::{info, warn};

/// Thin wrapper over the `log` facade shared by pipeline stages.
pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }

    pub fn skip(&self, pixel: &str, reason: &str) {
        warn!("skipping pixel {}: {}", pixel, reason);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
