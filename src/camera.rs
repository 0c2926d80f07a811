use crate::Ray;
use crate::vec3::Float;
use crate::vec3::Point;
use crate::vec3::Vec3;
use colored::Colorize;

/// Orthographic camera: one world unit per pixel, every primary ray leaves
/// the `pos.z` plane in direction `dir`.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub pos: Point,
    pub dir: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            pos: Point::zero(),
            dir: Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

impl Camera {
    // u, v: pixel coordinates, fractional part is the sub-pixel position
    pub fn get_ray(&self, u: Float, v: Float) -> Ray {
        Ray {
            orig: self.pos + Vec3::new(u, v, 0.0),
            dir: self.dir,
        }
    }
    pub fn display(&self) {
        let s = "camera:".green();
        let s_pos = format!("pos: {:?}", self.pos).dimmed();
        let s_dir = format!("dir: {:?}", self.dir).dimmed();
        log::info!("-- {s} {s_pos} {s_dir}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rays_look_down_z_from_pixel_plane() {
        let cam = Camera::default();
        let ray = cam.get_ray(3.25, 7.5);
        assert_eq!(ray.orig, Point::new(3.25, 7.5, 0.0));
        assert_eq!(ray.dir, Vec3::new(0.0, 0.0, 1.0));
    }
}
