use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RGBA {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Add for RGBA {
    type Output = RGBA;

    fn add(self, other: RGBA) -> RGBA {
        RGBA {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
            a: self.a + other.a,
        }
    }
}

impl Sub for RGBA {
    type Output = RGBA;

    fn sub(self, other: RGBA) -> RGBA {
        RGBA {
            r: self.r - other.r,
            g: self.g - other.g,
            b: self.b - other.b,
            a: self.a - other.a,
        }
    }
}

// alpha is scaled too
impl Mul<f64> for RGBA {
    type Output = RGBA;
    fn mul(self, rhs: f64) -> RGBA {
        RGBA {
            r: self.r * rhs,
            g: self.g * rhs,
            b: self.b * rhs,
            a: self.a * rhs,
        }
    }
}

impl AddAssign for RGBA {
    fn add_assign(&mut self, other: RGBA) {
        *self = *self + other;
    }
}

// f64::min/max would swallow a NaN
fn clamp_channel(c: f64, m: f64) -> f64 {
    if c > m {
        m
    } else if c < 0.0 {
        0.0
    } else {
        c
    }
}

impl RGBA {
    pub fn zero() -> RGBA {
        Default::default()
    }
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> RGBA {
        RGBA { r, g, b, a }
    }
    /// Clamps every channel into `[0, m]` in place. NaN channels stay NaN.
    pub fn clamp(&mut self, m: f64) {
        self.r = clamp_channel(self.r, m);
        self.g = clamp_channel(self.g, m);
        self.b = clamp_channel(self.b, m);
        self.a = clamp_channel(self.a, m);
    }
    pub fn clamped(self, m: f64) -> RGBA {
        let mut c = self;
        c.clamp(m);
        c
    }
    pub fn is_zero(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0 && self.a == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_sub_are_componentwise() {
        let a = RGBA::new(0.5, 0.25, 0.125, 1.0);
        let b = RGBA::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(a + b, RGBA::new(1.5, 2.25, 3.125, 5.0));
        assert_eq!(b - a, RGBA::new(0.5, 1.75, 2.875, 3.0));
        let d = b - b;
        assert!(d.is_zero());
    }

    #[test]
    fn multiply_scales_alpha() {
        let c = RGBA::new(1.0, 0.5, 0.25, 1.0) * 0.5;
        assert_eq!(c, RGBA::new(0.5, 0.25, 0.125, 0.5));
    }

    #[test]
    fn clamp_bounds_channels() {
        let mut c = RGBA::new(-3.0, 0.5, 7.0, f64::MAX);
        c.clamp(1.0);
        assert_eq!(c, RGBA::new(0.0, 0.5, 1.0, 1.0));
    }

    #[test]
    fn clamp_is_idempotent() {
        let samples = [
            RGBA::new(-1.0, 2.0, 0.3, 0.9),
            RGBA::new(1e9, -1e9, 1.0, 0.0),
            RGBA::new(0.25, 0.5, 0.75, 1.0),
        ];
        for c in samples {
            let once = c.clamped(1.0);
            let twice = once.clamped(1.0);
            assert_eq!(once, twice);
            for ch in [once.r, once.g, once.b, once.a] {
                assert!((0.0..=1.0).contains(&ch));
            }
        }
    }

    #[test]
    fn clamp_to_other_max() {
        let mut c = RGBA::new(3.0, 1.5, -0.5, 2.0);
        c.clamp(2.0);
        assert_eq!(c, RGBA::new(2.0, 1.5, 0.0, 2.0));
    }

    #[test]
    fn clamp_keeps_nan() {
        let c = RGBA::new(f64::NAN, 2.0, 0.5, -1.0).clamped(1.0);
        assert!(c.r.is_nan());
        assert_eq!((c.g, c.b, c.a), (1.0, 0.5, 0.0));
    }
}
