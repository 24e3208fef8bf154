use std::time::Duration;

/// Easing curve applied to tween progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    Linear,
    /// Quadratic ease-out, the default curve for pose and velocity tweens.
    #[default]
    Power1Out,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Time-based interpolation of a single scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    start: Duration,
    duration: Duration,
    ease: Ease,
}

impl Tween {
    pub fn new(from: f32, to: f32, start: Duration, duration: Duration, ease: Ease) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            ease,
        }
    }

    /// Value at `now`. Before the start it is `from`; once finished it is exactly `to`.
    pub fn sample(&self, now: Duration) -> f32 {
        if self.is_finished(now) {
            return self.to;
        }
        let elapsed = now.saturating_sub(self.start).as_secs_f32();
        let progress = elapsed / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * self.ease.apply(progress)
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        self.duration.is_zero() || now >= self.start + self.duration
    }

    pub fn target(&self) -> f32 {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::millis;

    #[test]
    fn linear_tween_interpolates_evenly() {
        let tween = Tween::new(1.0, 0.0, millis(1_000), millis(10_000), Ease::Linear);
        assert_eq!(tween.sample(millis(0)), 1.0);
        assert!((tween.sample(millis(6_000)) - 0.5).abs() < 1e-6);
        assert_eq!(tween.sample(millis(11_000)), 0.0);
        assert!(tween.is_finished(millis(11_000)));
    }

    #[test]
    fn ease_out_front_loads_progress() {
        let tween = Tween::new(0.0, 1.0, Duration::ZERO, millis(100), Ease::Power1Out);
        let halfway = tween.sample(millis(50));
        assert!((halfway - 0.75).abs() < 1e-6);
    }

    #[test]
    fn decaying_tween_never_overshoots_zero() {
        let tween = Tween::new(0.01, 0.0, Duration::ZERO, millis(100), Ease::Power1Out);
        let mut previous = tween.sample(Duration::ZERO);
        for ms in (0..=120).step_by(4) {
            let value = tween.sample(millis(ms));
            assert!(value >= 0.0);
            assert!(value <= previous);
            previous = value;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let tween = Tween::new(3.0, -3.0, millis(5), Duration::ZERO, Ease::Linear);
        assert_eq!(tween.sample(millis(0)), -3.0);
        assert_eq!(tween.target(), -3.0);
    }
}
