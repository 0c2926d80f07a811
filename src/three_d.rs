use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Ray;
use crate::RenderStats;
use crate::vec3::Float;
use crate::vec3::Point;
use crate::vec3::Vec3;

/// Default distance, in ray-parameter units, that hit points are pulled back
/// along the incoming ray.
pub const LAMBDA: Float = 1e6;

/// Below this fraction of `|e1| |e2| |dir|` the ray is treated as parallel to
/// the triangle's plane.
const DET_EPSILON: Float = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// Normal requested at a sphere's exact center.
    ZeroLengthNormal,
    /// Triangle with collinear or coincident vertices.
    DegenerateTriangle,
    /// Sphere radius that is not a positive finite number.
    InvalidRadius,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            GeometryError::ZeroLengthNormal => "zero-length normal",
            GeometryError::DegenerateTriangle => "triangle has no area",
            GeometryError::InvalidRadius => "sphere radius must be positive",
        };
        write!(f, "degenerate geometry: {what}")
    }
}

impl std::error::Error for GeometryError {}

pub trait Intersectable {
    /// Ray parameter of the first surface point in front of the ray origin,
    /// or `None` on a miss.
    fn intercept(&self, stats: &mut RenderStats, ray: &Ray) -> Option<Float>;

    fn get_normal(&self, point: Point) -> Result<Vec3, GeometryError>;

    /// Hit point with `bias` subtracted from the ray parameter first.
    fn intersection(&self, stats: &mut RenderStats, ray: &Ray, bias: Float) -> Option<Point> {
        self.intercept(stats, ray).map(|t| ray.at(t - bias))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Point,
    pub radius: Float,
}

impl Sphere {
    pub fn new(center: Point, radius: Float) -> Result<Sphere, GeometryError> {
        let sphere = Sphere { center, radius };
        sphere.validate()?;
        Ok(sphere)
    }
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.radius.is_finite() && self.radius > 0.0 && self.center.is_finite() {
            Ok(())
        } else {
            Err(GeometryError::InvalidRadius)
        }
    }
}

impl Intersectable for Sphere {
    fn intercept(&self, stats: &mut RenderStats, ray: &Ray) -> Option<Float> {
        stats.num_intersects_sphere += 1;

        let a = ray.dir.dot(ray.dir);
        if a == 0.0 {
            return None;
        }
        let v0 = ray.orig - self.center;
        let b = 2.0 * ray.dir.dot(v0);
        let c = v0.dot(v0) - self.radius * self.radius;

        // complex roots: the ray misses
        let delta = b * b - 4.0 * a * c;
        if delta.is_nan() || delta < 0.0 {
            return None;
        }
        let delta_sqrt = delta.sqrt();
        let mut t1 = (-b - delta_sqrt) / (2.0 * a);
        let mut t2 = (-b + delta_sqrt) / (2.0 * a);
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 < 0.0 {
            t1 = t2;
            if t1 < 0.0 {
                return None;
            }
        }
        Some(t1)
    }

    /// Exact even for points off the surface.
    fn get_normal(&self, point: Point) -> Result<Vec3, GeometryError> {
        (point - self.center)
            .try_normalized()
            .ok_or(GeometryError::ZeroLengthNormal)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Triangle {
    pub points: [Point; 3],
    /// Filled in at construction; `get_normal` recomputes from the edges.
    #[serde(default)]
    pub normal: Vec3,
}

impl Triangle {
    pub fn new(points: [Point; 3]) -> Result<Triangle, GeometryError> {
        let mut triangle = Triangle {
            points,
            normal: Vec3::zero(),
        };
        triangle.normal = triangle.get_normal(points[0])?;
        Ok(triangle)
    }
    fn edges(&self) -> (Vec3, Vec3) {
        (
            self.points[1] - self.points[0],
            self.points[2] - self.points[0],
        )
    }
}

impl Intersectable for Triangle {
    // Möller–Trumbore
    fn intercept(&self, stats: &mut RenderStats, ray: &Ray) -> Option<Float> {
        stats.num_intersects_triangle += 1;

        let (e1, e2) = self.edges();
        let pvec = ray.dir.cross(e2);
        let det = e1.dot(pvec);
        let scale = e1.length() * e2.length() * ray.dir.length();
        if det.is_nan() || det.abs() <= DET_EPSILON * scale {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.orig - self.points[0];
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let qvec = tvec.cross(e1);
        let v = ray.dir.dot(qvec) * inv_det;
        if !(0.0..=1.0).contains(&v) {
            return None;
        }
        if u + v >= 1.0 {
            return None;
        }
        let t = e2.dot(qvec) * inv_det;
        if t < 0.0 {
            return None;
        }
        Some(t)
    }

    /// Same for every point: winding `points[0] -> [1] -> [2]` picks the side.
    fn get_normal(&self, _point: Point) -> Result<Vec3, GeometryError> {
        let (e1, e2) = self.edges();
        e1.cross(e2)
            .try_normalized()
            .ok_or(GeometryError::DegenerateTriangle)
    }
}

/// Everything a scene can hold.
#[derive(Debug, Clone, Copy)]
pub enum Primitive {
    Sphere(Sphere),
    Triangle(Triangle),
}

impl Intersectable for Primitive {
    fn intercept(&self, stats: &mut RenderStats, ray: &Ray) -> Option<Float> {
        match self {
            Primitive::Sphere(s) => s.intercept(stats, ray),
            Primitive::Triangle(t) => t.intercept(stats, ray),
        }
    }
    fn get_normal(&self, point: Point) -> Result<Vec3, GeometryError> {
        match self {
            Primitive::Sphere(s) => s.get_normal(point),
            Primitive::Triangle(t) => t.get_normal(point),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(s: Sphere) -> Self {
        Primitive::Sphere(s)
    }
}

impl From<Triangle> for Primitive {
    fn from(t: Triangle) -> Self {
        Primitive::Triangle(t)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Sphere(s) => write!(f, "sphere {:?} radius={}", s.center, s.radius),
            Primitive::Triangle(t) => write!(
                f,
                "triangle {:?} {:?} {:?}",
                t.points[0], t.points[1], t.points[2]
            ),
        }
    }
}
