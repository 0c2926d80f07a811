pub mod camera;
pub mod color;
pub mod image;
pub mod render;
pub mod scene;
pub mod three_d;
pub mod vec3;

use vec3::Float;
use vec3::Point;
use vec3::Vec3;

pub use three_d::GeometryError;

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub orig: Point,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(orig: Point, dir: Vec3) -> Ray {
        Ray { orig, dir }
    }
    pub fn at(&self, t: Float) -> Point {
        self.orig + self.dir * t
    }
    /// Mirror ray leaving `point`, for a unit `normal`.
    pub fn get_reflection(&self, point: Point, normal: Vec3) -> Ray {
        Ray {
            orig: point,
            dir: self.dir.reflect(normal),
        }
    }
}

#[derive(Clone, Copy, Default, Debug)]
pub struct RenderStats {
    pub num_rays_sampling: u64,
    pub num_rays_reflection: u64,
    pub num_rays_hit_max_level: u64,
    pub num_intersects_sphere: u64,
    pub num_intersects_triangle: u64,
    pub num_degenerate: u64,
}

impl RenderStats {
    pub fn add(&mut self, other: RenderStats) {
        self.num_rays_sampling += other.num_rays_sampling;
        self.num_rays_reflection += other.num_rays_reflection;
        self.num_rays_hit_max_level += other.num_rays_hit_max_level;
        self.num_intersects_sphere += other.num_intersects_sphere;
        self.num_intersects_triangle += other.num_intersects_triangle;
        self.num_degenerate += other.num_degenerate;
    }
}

pub struct ProgressFunc {
    pub func: Box<dyn Fn(f32) + Send + Sync>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_at_walks_along_direction() {
        let ray = Ray::new(Point::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(ray.at(1.5), Point::new(1.0, 2.0, 6.0));
    }

    #[test]
    fn reflection_starts_at_hit_point() {
        let ray = Ray::new(Point::zero(), Vec3::new(1.0, -1.0, 0.0));
        let hit = Point::new(1.0, -1.0, 0.0);
        let normal = Vec3::new(0.0, 1.0, 0.0);
        let reflected = ray.get_reflection(hit, normal);
        assert_eq!(reflected.orig, hit);
        assert_eq!(reflected.dir, Vec3::new(1.0, 1.0, 0.0));
        assert!((reflected.dir.dot(normal) + ray.dir.dot(normal)).abs() < 1e-12);
        assert!((reflected.dir.length() - ray.dir.length()).abs() < 1e-12);
    }

    #[test]
    fn stats_add_sums_every_counter() {
        let mut a = RenderStats {
            num_rays_sampling: 4,
            num_intersects_sphere: 2,
            ..Default::default()
        };
        let b = RenderStats {
            num_rays_sampling: 1,
            num_rays_reflection: 3,
            num_rays_hit_max_level: 1,
            num_intersects_sphere: 5,
            num_intersects_triangle: 7,
            num_degenerate: 1,
        };
        a.add(b);
        assert_eq!(a.num_rays_sampling, 5);
        assert_eq!(a.num_rays_reflection, 3);
        assert_eq!(a.num_rays_hit_max_level, 1);
        assert_eq!(a.num_intersects_sphere, 7);
        assert_eq!(a.num_intersects_triangle, 7);
        assert_eq!(a.num_degenerate, 1);
    }
}
