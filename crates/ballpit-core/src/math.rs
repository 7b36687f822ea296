//! Scalar filters and random helpers.

use std::collections::VecDeque;
use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

/// First-order low-pass filter.
///
/// `alpha` is the smoothing rate per second. With a 16 ms step and a
/// constant input of 1, the output after one second is roughly
/// 0.38 (alpha 0.5), 0.62 (alpha 1), 0.85 (alpha 2), 0.94 (alpha 3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPassFilter {
    pub x: f32,
    pub alpha: f32,
    pub gain: f32,
}

impl LowPassFilter {
    pub fn new(alpha: f32, gain: f32) -> Self {
        Self { x: 0.0, alpha, gain }
    }

    pub fn update(&mut self, input: f32, dt: f32) -> f32 {
        self.x += self.alpha * (self.gain * input - self.x) * dt;
        self.x
    }
}

/// Eases a value toward a movable target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothStep {
    pub x: f32,
    pub target: f32,
    pub alpha: f32,
}

impl SmoothStep {
    /// Starts at rest on `x`.
    pub fn new(alpha: f32, x: f32) -> Self {
        Self {
            x,
            target: x,
            alpha,
        }
    }

    pub fn update(&mut self, dt: f32) -> f32 {
        self.x += self.alpha * (self.target - self.x) * dt;
        self.x
    }
}

/// Impulse-driven value that decays back to zero: `d` scales the input
/// kick, `c` is the decay rate per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringDamper {
    pub x: f32,
    c: f32,
    d: f32,
}

impl SpringDamper {
    pub fn new(c: f32, d: f32, x: f32) -> Self {
        Self { x, c, d }
    }

    pub fn update(&mut self, input: f32, dt: f32) -> f32 {
        self.x += self.d * input - dt * self.c * self.x;
        self.x
    }
}

impl Default for SpringDamper {
    fn default() -> Self {
        Self::new(0.1, 1.0, 0.0)
    }
}

/// Mean of the last `size` samples.
#[derive(Debug, Clone, Default)]
pub struct MovingAverage {
    values: VecDeque<f64>,
    size: usize,
    sum: f64,
}

impl MovingAverage {
    pub fn new(size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(size),
            size: size.max(1),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f64) {
        while self.values.len() >= self.size {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.sum += value;
        self.values.push_back(value);
    }

    /// `None` until the first sample arrives.
    pub fn get(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }
}

/// Linear blend of `a` and `b`, `t` in `[0, 1]`.
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Piecewise-linear lookup over `(x, y)` points sorted by `x`. Clamps to the
/// first and last `y` outside the table; `None` for an empty table.
pub fn interpolate(x: f32, points: &[(f32, f32)]) -> Option<f32> {
    let (first, last) = (points.first()?, points.last()?);
    if x <= first.0 {
        return Some(first.1);
    }
    if x >= last.0 {
        return Some(last.1);
    }
    let i = points.iter().position(|p| p.0 >= x)?;
    let ((x0, y0), (x1, y1)) = (points[i - 1], points[i]);
    Some(mix(y0, y1, (x - x0) / (x1 - x0)))
}

/// Random helpers in the shape game code reaches for.
pub trait RngExt: Rng {
    /// Uniform in `[a, b)`; order of the bounds does not matter.
    fn rnd(&mut self, a: f32, b: f32) -> f32 {
        self.gen::<f32>() * (b - a) + a
    }

    /// Uniform integer between `a` and `b`, upper bound excluded.
    fn rndi(&mut self, a: i32, b: i32) -> i32 {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        if lo == hi {
            return lo;
        }
        self.gen_range(lo..hi)
    }

    /// Uniform in `[-a, a]`.
    fn rnda(&mut self, a: f32) -> f32 {
        self.gen::<f32>() * 2.0 * a - a
    }

    /// Random direction with length in `[a, b)`.
    fn rndv(&mut self, a: f32, b: f32) -> Vec2 {
        let len = self.rnd(a, b);
        Vec2::from_angle(self.rnda(PI)) * len
    }

    /// Random direction of length exactly `r`.
    fn rndring(&mut self, r: f32) -> Vec2 {
        Vec2::from_angle(self.rnda(PI)) * r
    }

    /// Random direction with length in `[0, r)`.
    fn rndball(&mut self, r: f32) -> Vec2 {
        self.rndv(0.0, r)
    }

    /// Uniform point in a `w` by `h` box centred on the origin.
    fn rndbox(&mut self, w: f32, h: f32) -> Vec2 {
        Vec2::new(self.rnda(w / 2.0), self.rnda(h / 2.0))
    }

    /// `a` perturbed by up to `error` (relative): `rnderr(1, 0.2)` is in
    /// `[0.8, 1.2)`.
    fn rnderr(&mut self, a: f32, error: f32) -> f32 {
        self.rnd(a * (1.0 - error), a * (1.0 + error))
    }
}

impl<R: Rng + ?Sized> RngExt for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn low_pass_converges_toward_input() {
        let mut filter = LowPassFilter::new(3.0, 1.0);
        for _ in 0..60 {
            filter.update(1.0, 1.0 / 60.0);
        }
        assert!(filter.x > 0.9 && filter.x < 1.0, "got {}", filter.x);
    }

    #[test]
    fn low_pass_decays_after_one_shot_impulse() {
        let mut filter = LowPassFilter::new(10.0, 1.0);
        let first = filter.update(1.0, 0.016);
        let second = filter.update(0.0, 0.016);
        assert!(first > 0.0);
        assert!(second < first);
    }

    #[test]
    fn smooth_step_reaches_target_asymptotically() {
        let mut s = SmoothStep::new(1.0, 0.0);
        s.target = 10.0;
        let a = s.update(0.5);
        let b = s.update(0.5);
        assert!((a - 5.0).abs() < 1e-5);
        assert!((b - 7.5).abs() < 1e-5);
    }

    #[test]
    fn spring_damper_kicks_then_decays() {
        let mut s = SpringDamper::new(2.0, 1.0, 0.0);
        assert_eq!(s.update(1.0, 0.1), 1.0);
        let after = s.update(0.0, 0.1);
        assert!((after - 0.8).abs() < 1e-6);
    }

    #[test]
    fn interpolate_clamps_and_blends() {
        let table = [(0.0, 10.0), (1.0, 20.0), (3.0, 0.0)];
        assert_eq!(interpolate(-1.0, &table), Some(10.0));
        assert_eq!(interpolate(5.0, &table), Some(0.0));
        assert_eq!(interpolate(0.5, &table), Some(15.0));
        assert_eq!(interpolate(2.0, &table), Some(10.0));
        assert_eq!(interpolate(1.0, &[]), None);
        assert_eq!(mix(2.0, 4.0, 0.25), 2.5);
    }

    #[test]
    fn moving_average_drops_oldest() {
        let mut avg = MovingAverage::new(2);
        assert_eq!(avg.get(), None);
        avg.push(1.0);
        avg.push(3.0);
        avg.push(5.0);
        assert_eq!(avg.get(), Some(4.0));
    }

    #[test]
    fn random_helpers_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let v = rng.rndbox(20.0, 10.0);
            assert!(v.x.abs() <= 10.0 && v.y.abs() <= 5.0);
            let a = rng.rnda(2.0);
            assert!((-2.0..=2.0).contains(&a));
            let i = rng.rndi(5, 2);
            assert!((2..5).contains(&i));
            let e = rng.rnderr(1.0, 0.2);
            assert!((0.79..1.21).contains(&e));
            assert!((rng.rndring(3.0).length() - 3.0).abs() < 1e-4);
            assert!(rng.rndball(1.5).length() <= 1.5 + 1e-4);
            let len = rng.rndv(1.0, 2.0).length();
            assert!((1.0 - 1e-4..2.0 + 1e-4).contains(&len));
        }
    }
}
