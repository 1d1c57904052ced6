//! Single-slot command latch between the asynchronous source and the loop.
//!
//! The slot is a `bounded(1)` channel with a replace-don't-queue policy: when
//! the slot is full the writer evicts the stale sample before sending. Value
//! and arrival time travel together as one `CommandSample`, so the reader can
//! never observe a value paired with another update's timestamp.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::error::ThrottleError;

/// One normalized command and the monotonic time it arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandSample {
    /// Normalized demand in [-1.0, 1.0].
    pub value: f32,
    pub arrival: Instant,
}

impl CommandSample {
    /// Build a sample, clamping `value` into [-1.0, 1.0]. NaN maps to 0.
    pub fn new(value: f32, arrival: Instant) -> Self {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(-1.0, 1.0)
        };
        Self { value, arrival }
    }

    /// Decode a raw transport byte: `byte / 128 - 1`, giving [-1.0, ~0.992].
    pub fn from_byte(byte: u8, arrival: Instant) -> Self {
        Self::new(decode_byte(byte), arrival)
    }
}

#[inline]
pub fn decode_byte(byte: u8) -> f32 {
    f32::from(byte) / 128.0 - 1.0
}

/// Create a connected writer/reader pair.
pub fn latch() -> (LatchWriter, LatchReader) {
    let (tx, rx) = xch::bounded(1);
    let reader_alive = Arc::new(AtomicBool::new(true));
    (
        LatchWriter {
            tx,
            evict: rx.clone(),
            reader_alive: reader_alive.clone(),
            last_arrival: None,
        },
        LatchReader {
            rx,
            current: None,
            reader_alive,
        },
    )
}

/// Producer half, owned by the command source thread.
pub struct LatchWriter {
    tx: xch::Sender<CommandSample>,
    evict: xch::Receiver<CommandSample>,
    reader_alive: Arc<AtomicBool>,
    last_arrival: Option<Instant>,
}

impl LatchWriter {
    /// Overwrite the latched command.
    ///
    /// Arrival times are forced non-decreasing. Fails only once the reader is gone.
    pub fn publish(&mut self, mut sample: CommandSample) -> Result<(), ThrottleError> {
        if !self.reader_alive.load(Ordering::Acquire) {
            return Err(ThrottleError::State("command latch reader dropped".into()));
        }
        if let Some(prev) = self.last_arrival
            && sample.arrival < prev
        {
            sample.arrival = prev;
        }
        self.last_arrival = Some(sample.arrival);

        let mut pending = sample;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return Ok(()),
                Err(xch::TrySendError::Full(s)) => {
                    // Single producer: after one eviction the slot is free.
                    let _ = self.evict.try_recv();
                    pending = s;
                }
                Err(xch::TrySendError::Disconnected(_)) => {
                    return Err(ThrottleError::State("command latch closed".into()));
                }
            }
        }
    }
}

/// Consumer half, owned by the control loop.
pub struct LatchReader {
    rx: xch::Receiver<CommandSample>,
    current: Option<CommandSample>,
    reader_alive: Arc<AtomicBool>,
}

impl LatchReader {
    /// Take any newer sample from the slot and return the latched command.
    ///
    /// `None` until the first sample has ever arrived.
    pub fn latest(&mut self) -> Option<CommandSample> {
        if let Some(s) = self.rx.try_iter().last() {
            self.current = Some(s);
        }
        self.current
    }

    /// The latched command without polling the slot.
    pub fn peek(&self) -> Option<CommandSample> {
        self.current
    }
}

impl Drop for LatchReader {
    fn drop(&mut self) {
        self.reader_alive.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn decode_matches_transport_mapping() {
        assert_eq!(decode_byte(0), -1.0);
        assert_eq!(decode_byte(128), 0.0);
        assert_eq!(decode_byte(200), 0.5625);
        assert!((decode_byte(255) - 0.992_187_5).abs() < 1e-7);
    }

    #[test]
    fn new_clamps_out_of_range_values() {
        let t = Instant::now();
        assert_eq!(CommandSample::new(1.7, t).value, 1.0);
        assert_eq!(CommandSample::new(-3.0, t).value, -1.0);
        assert_eq!(CommandSample::new(f32::NAN, t).value, 0.0);
    }

    #[test]
    fn last_writer_wins_without_queueing() {
        let (mut w, mut r) = latch();
        let t0 = Instant::now();
        assert_eq!(r.latest(), None);
        for (i, byte) in [10u8, 20, 30].into_iter().enumerate() {
            let at = t0 + Duration::from_millis(i as u64);
            w.publish(CommandSample::from_byte(byte, at)).unwrap();
        }
        let s = r.latest().unwrap();
        assert_eq!(s.value, decode_byte(30));
        assert_eq!(s.arrival, t0 + Duration::from_millis(2));
        // Nothing else queued behind it; the latch keeps the value.
        assert_eq!(r.latest(), Some(s));
        assert_eq!(r.peek(), Some(s));
    }

    #[test]
    fn arrival_never_moves_backwards() {
        let (mut w, mut r) = latch();
        let t0 = Instant::now() + Duration::from_secs(1);
        w.publish(CommandSample::new(0.1, t0)).unwrap();
        let earlier = t0 - Duration::from_millis(500);
        w.publish(CommandSample::new(0.2, earlier)).unwrap();
        let s = r.latest().unwrap();
        assert_eq!(s.value, 0.2);
        assert_eq!(s.arrival, t0);
    }

    #[test]
    fn publish_fails_after_reader_drop() {
        let (mut w, r) = latch();
        drop(r);
        assert!(w.publish(CommandSample::new(0.0, Instant::now())).is_err());
    }
}
