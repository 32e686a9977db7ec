//! Time-based tweens used by the intro animation and the arc transition.

/// Easing curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadraticInOut,
    QuinticInOut,
}

impl Easing {
    /// Map linear progress `k` in `[0, 1]` onto the curve.
    pub fn apply(self, k: f32) -> f32 {
        let k = k.clamp(0.0, 1.0);
        match self {
            Easing::Linear => k,
            Easing::QuadraticInOut => {
                if k < 0.5 {
                    2.0 * k * k
                } else {
                    1.0 - (-2.0 * k + 2.0).powi(2) / 2.0
                }
            }
            Easing::QuinticInOut => {
                if k < 0.5 {
                    16.0 * k.powi(5)
                } else {
                    1.0 - (-2.0 * k + 2.0).powi(5) / 2.0
                }
            }
        }
    }
}

/// A one-shot interpolation from `from` to `to` over `duration_ms`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration_ms: f32,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration_ms: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration_ms,
            easing,
        }
    }

    /// Value at `elapsed_ms` since the tween started. Holds `to` once finished.
    pub fn value_at(&self, elapsed_ms: f32) -> f32 {
        let progress = if self.duration_ms <= 0.0 {
            1.0
        } else {
            elapsed_ms / self.duration_ms
        };
        let k = self.easing.apply(progress);
        self.from + (self.to - self.from) * k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints_are_fixed() {
        for easing in [Easing::Linear, Easing::QuadraticInOut, Easing::QuinticInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn tween_clamps_past_duration() {
        let tween = Tween::new(0.0, 10.0, 100.0, Easing::Linear);
        assert_eq!(tween.value_at(50.0), 5.0);
        assert_eq!(tween.value_at(500.0), 10.0);
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let tween = Tween::new(1.0, 2.0, 0.0, Easing::QuadraticInOut);
        assert_eq!(tween.value_at(0.0), 2.0);
    }
}
