//! Test and helper mocks for throttle_core

/// A command source that never delivers; every read times out immediately.
/// Useful for exercising the stale-command failsafe.
pub struct NoopSource;

impl throttle_traits::CommandSource for NoopSource {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(timeout);
        Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "noop source timeout",
        )))
    }
}
