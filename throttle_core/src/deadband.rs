/// Symmetric deadband around zero with unity-ish gain outside it.
///
/// `raw` is first scaled by `1 / (1 - h)`; results inside `[-h, h]` snap to
/// exactly zero and the rest are shifted toward zero by `h`. The output may
/// slightly exceed ±1 for inputs near full scale.
#[inline]
pub fn normalize(raw: f32, hysteresis: f32) -> f32 {
    let scaled = raw / (1.0 - hysteresis);
    if scaled > hysteresis {
        scaled - hysteresis
    } else if scaled < -hysteresis {
        scaled + hysteresis
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Deadband {
    hysteresis: f32,
}

impl Deadband {
    pub fn new(hysteresis: f32) -> Self {
        Self { hysteresis }
    }

    #[inline]
    pub fn normalize(&self, raw: f32) -> f32 {
        normalize(raw, self.hysteresis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_signals_snap_to_zero() {
        let db = Deadband::new(0.10);
        assert_eq!(db.normalize(0.0), 0.0);
        assert_eq!(db.normalize(0.05), 0.0);
        assert_eq!(db.normalize(-0.08), 0.0);
    }

    #[test]
    fn band_edge_rounds_to_within_epsilon_of_zero() {
        // 0.09 / 0.9 can land a hair outside 0.1 in f32, so the edge may leak a
        // sub-ulp residue instead of an exact zero.
        for raw in [0.09_f32, -0.09] {
            let out = normalize(raw, 0.10);
            assert!(out.abs() < 1e-6, "raw {raw} -> {out}");
            assert!(out == 0.0 || out.signum() == raw.signum(), "raw {raw} -> {out}");
        }
    }

    #[test]
    fn outside_band_shifts_toward_zero() {
        let db = Deadband::new(0.10);
        assert!((db.normalize(0.5625) - 0.525).abs() < 1e-6);
        assert!((db.normalize(-0.5625) + 0.525).abs() < 1e-6);
    }

    #[test]
    fn full_scale_may_exceed_unity() {
        let out = normalize(1.0, 0.10);
        assert!(out > 1.0 && out < 1.02, "got {out}");
    }

    #[test]
    fn zero_hysteresis_is_identity() {
        assert_eq!(normalize(0.3, 0.0), 0.3);
        assert_eq!(normalize(-0.7, 0.0), -0.7);
    }
}
