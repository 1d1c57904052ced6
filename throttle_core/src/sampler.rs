//! Background command sampling.
//!
//! Spawns a thread that owns the `CommandSource`, decodes each byte, stamps
//! it with the clock, and overwrites the command latch. The control loop never
//! waits on this thread; staleness is judged from the arrival stamps alone.
//!
//! Each `CommandSampler` spawns exactly one thread that is shut down and
//! joined when the sampler is dropped.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use throttle_traits::CommandSource;
use throttle_traits::clock::Clock;

use crate::hw_error::map_hw_error;
use crate::latch::{CommandSample, LatchWriter};

/// Pause after a read error that returned without blocking.
const ERROR_BACKOFF: Duration = Duration::from_millis(1);

pub struct CommandSampler {
    received: Arc<AtomicU64>,
    read_errors: Arc<AtomicU64>,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl CommandSampler {
    pub fn spawn<S, C>(mut source: S, mut latch: LatchWriter, timeout: Duration, clock: C) -> Self
    where
        S: CommandSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let received = Arc::new(AtomicU64::new(0));
        let received_clone = received.clone();
        let read_errors = Arc::new(AtomicU64::new(0));
        let read_errors_clone = read_errors.clone();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("command sampler received shutdown signal");
                    break;
                }

                match source.read(timeout) {
                    Ok(byte) => {
                        let sample = CommandSample::from_byte(byte, clock.now());
                        if let Err(e) = latch.publish(sample) {
                            tracing::debug!(error = %e, "command latch closed, exiting sampler");
                            break;
                        }
                        received_clone.fetch_add(1, Ordering::Relaxed);
                        tracing::trace!(byte, value = sample.value, "command sample");
                    }
                    Err(e) => {
                        // Timeouts are expected while the link is idle; the watchdog handles them.
                        let err = map_hw_error(&*e);
                        read_errors_clone.fetch_add(1, Ordering::Relaxed);
                        tracing::trace!(error = %err, "command read failed");
                        if shutdown_clone.load(Ordering::Relaxed) {
                            break;
                        }
                        clock.sleep(ERROR_BACKOFF);
                    }
                }
            }
            tracing::trace!("command sampler thread exiting cleanly");
        });

        Self {
            received,
            read_errors,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Number of samples published so far.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn read_errors(&self) -> u64 {
        self.read_errors.load(Ordering::Relaxed)
    }
}

impl Drop for CommandSampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits after its current read returns (bounded by the
        // source timeout) or immediately if it is between reads.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("command sampler thread joined");
                }
                Err(e) => {
                    tracing::warn!(?e, "command sampler thread panicked during shutdown");
                }
            }
        }
    }
}
