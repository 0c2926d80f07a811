use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

pub type Float = f64;

/// Minimum distance from a ray origin for a hit to count. Keeps reflected
/// rays from re-hitting the surface they start on.
pub const EPSILON: Float = 1e-6;

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

pub type Point = Vec3;

impl Default for Vec3 {
    fn default() -> Self {
        Vec3::zero()
    }
}

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vec3: {{ x={:.3} y={:.3} z={:.3} }}",
            self.x, self.y, self.z
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Div<Float> for Vec3 {
    type Output = Vec3;
    fn div(self, rhs: Float) -> Vec3 {
        Vec3 {
            x: self.x / rhs,
            y: self.y / rhs,
            z: self.z / rhs,
        }
    }
}

impl Mul<Float> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: Float) -> Vec3 {
        Vec3 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        self * -1.0
    }
}

impl AddAssign<Vec3> for Vec3 {
    fn add_assign(&mut self, other: Vec3) {
        *self = *self + other;
    }
}

/// Column-major 3x3 rotation matrix, used to orient loaded meshes.
pub struct Matrix3 {
    mat: [Float; 9],
}

impl Matrix3 {
    pub fn identity() -> Matrix3 {
        Matrix3 {
            mat: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Vec3 {
    pub fn zero() -> Vec3 {
        Vec3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
    pub fn new(x: Float, y: Float, z: Float) -> Vec3 {
        Vec3 { x, y, z }
    }
    pub fn length(self) -> Float {
        self.dot(self).sqrt()
    }
    pub fn dot(self, rhs: Vec3) -> Float {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }
    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }
    /// Scales to unit length in place. A zero vector turns into NaNs; use
    /// `try_normalized` when the input may be degenerate.
    pub fn normalize(&mut self) {
        let len = self.length();
        self.x /= len;
        self.y /= len;
        self.z /= len;
    }
    pub fn normalized(self) -> Vec3 {
        let mut v = self;
        v.normalize();
        v
    }
    pub fn try_normalized(self) -> Option<Vec3> {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Some(self / len)
        } else {
            None
        }
    }
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
    /// Mirror `self` about `normal`: `v - 2 (v.n) n`. `normal` must be unit length.
    pub fn reflect(self, normal: Vec3) -> Vec3 {
        self - normal * self.dot(normal) * 2.0
    }
    pub fn multiply(self, matrix: &Matrix3) -> Vec3 {
        let v0 = [self.x, self.y, self.z];
        let mut v = [0.0; 3];
        for (i, vi) in v.iter_mut().enumerate() {
            for (j, v0j) in v0.iter().enumerate() {
                *vi += v0j * matrix.mat[i + j * 3];
            }
        }
        Vec3 {
            x: v[0],
            y: v[1],
            z: v[2],
        }
    }
    pub fn rotx(self, alpha: Float) -> Vec3 {
        let cos = alpha.cos();
        let sin = alpha.sin();
        let m = Matrix3 {
            mat: [1.0, 0.0, 0.0, 0.0, cos, sin, 0.0, -sin, cos],
        };
        self.multiply(&m)
    }
    pub fn roty(self, alpha: Float) -> Vec3 {
        let cos = alpha.cos();
        let sin = alpha.sin();
        let m = Matrix3 {
            mat: [cos, 0.0, -sin, 0.0, 1.0, 0.0, sin, 0.0, cos],
        };
        self.multiply(&m)
    }
    pub fn rotz(self, alpha: Float) -> Vec3 {
        let cos = alpha.cos();
        let sin = alpha.sin();
        let m = Matrix3 {
            mat: [cos, sin, 0.0, -sin, cos, 0.0, 0.0, 0.0, 1.0],
        };
        self.multiply(&m)
    }
}
