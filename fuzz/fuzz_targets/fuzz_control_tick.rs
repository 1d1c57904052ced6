#![no_main]
use libfuzzer_sys::fuzz_target;
use std::time::{Duration, Instant};
use throttle_core::{CommandSample, Throttle, TickStatus};

// Each step is 7 bytes: command byte, f32 rpm (le), advance ms, fresh flag.
const STEP: usize = 7;

fuzz_target!(|data: &[u8]| {
    let Ok(mut throttle) = Throttle::builder().build() else {
        return;
    };
    let mut now = Instant::now();
    let mut last: Option<CommandSample> = None;

    for step in data.chunks_exact(STEP) {
        let rpm = f32::from_le_bytes([step[1], step[2], step[3], step[4]]);
        now += Duration::from_millis(u64::from(step[5]) * 4);
        if step[6] & 1 == 1 {
            last = Some(CommandSample::from_byte(step[0], now));
        }
        let status = throttle.evaluate(now, last, || rpm.is_finite().then_some(rpm));
        match status {
            TickStatus::Driving { current_a } => {
                assert!(current_a.is_finite());
                assert!(current_a.abs() >= 1.0 || current_a == -1.0);
            }
            TickStatus::Braking { current_a } => assert!(current_a.is_finite()),
            TickStatus::Failsafe { current_a, .. } => assert_eq!(current_a, -10.0),
        }
    }
});
