use rstest::rstest;
use throttle_core::{BuildError, ControlCfg, CurrentCfg, SafetyCfg, Throttle};

fn build_err(control: ControlCfg, current: CurrentCfg, safety: SafetyCfg) -> &'static str {
    let err = Throttle::builder()
        .with_control(control)
        .with_current(current)
        .with_safety(safety)
        .build()
        .expect_err("build should fail");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => *msg,
        None => panic!("expected BuildError, got {err:?}"),
    }
}

#[test]
fn defaults_build() {
    let t = Throttle::builder().build().expect("defaults");
    assert_eq!(t.current_cfg().max_drive_a, 60.0);
    assert_eq!(t.safety_cfg().stale_timeout_ms, 500);
}

#[rstest]
#[case::hysteresis_one(ControlCfg { hysteresis: 1.0, ..ControlCfg::default() }, "hysteresis")]
#[case::hysteresis_negative(ControlCfg { hysteresis: -0.1, ..ControlCfg::default() }, "hysteresis")]
#[case::thresholds_inverted(
    ControlCfg { soft_rpm: 44_000.0, hard_rpm: 41_000.0, ..ControlCfg::default() },
    "soft_rpm"
)]
#[case::thresholds_equal(
    ControlCfg { soft_rpm: 41_000.0, hard_rpm: 41_000.0, ..ControlCfg::default() },
    "soft_rpm"
)]
fn rejects_control(#[case] control: ControlCfg, #[case] needle: &str) {
    let msg = build_err(control, CurrentCfg::default(), SafetyCfg::default());
    assert!(msg.contains(needle), "{msg}");
}

#[rstest]
#[case::max_zero(CurrentCfg { max_drive_a: 0.0, ..CurrentCfg::default() }, "max_drive_a")]
#[case::min_positive(CurrentCfg { min_drive_a: 5.0, ..CurrentCfg::default() }, "min_drive_a")]
#[case::floor_zero(CurrentCfg { authority_floor_a: 0.0, ..CurrentCfg::default() }, "authority_floor_a")]
#[case::floor_nan(CurrentCfg { authority_floor_a: f32::NAN, ..CurrentCfg::default() }, "authority_floor_a")]
#[case::floor_above_max(CurrentCfg { authority_floor_a: 80.0, ..CurrentCfg::default() }, "authority_floor_a")]
fn rejects_current(#[case] current: CurrentCfg, #[case] needle: &str) {
    let msg = build_err(ControlCfg::default(), current, SafetyCfg::default());
    assert!(msg.contains(needle), "{msg}");
}

#[rstest]
#[case::zero_timeout(SafetyCfg { stale_timeout_ms: 0, ..SafetyCfg::default() }, "stale_timeout_ms")]
#[case::positive_brake(SafetyCfg { safe_brake_a: 10.0, ..SafetyCfg::default() }, "safe_brake_a")]
fn rejects_safety(#[case] safety: SafetyCfg, #[case] needle: &str) {
    let msg = build_err(ControlCfg::default(), CurrentCfg::default(), safety);
    assert!(msg.contains(needle), "{msg}");
}
