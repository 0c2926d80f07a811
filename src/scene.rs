use colored::Colorize;
use std::fs;
use std::io;
use std::path::Path;

use crate::Ray;
use crate::RenderStats;
use crate::render::RenderConfig;
use crate::three_d::GeometryError;
use crate::three_d::Intersectable;
use crate::three_d::Primitive;
use crate::three_d::Sphere;
use crate::three_d::Triangle;
use crate::vec3::EPSILON;
use crate::vec3::Float;
use crate::vec3::Point;

/// Nearest surface along a ray.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    pub object: &'a Primitive,
    pub point: Point,
}

#[derive(Default, Debug, Clone)]
pub struct Scene {
    objects: Vec<Primitive>,
    pub num_spheres: u32,
    pub num_triangles: usize,
    pub num_triangles_in_all_objs: usize,
    pub num_objs: u32,
}

impl Scene {
    pub fn new() -> Scene {
        Default::default()
    }

    pub fn add(&mut self, object: impl Into<Primitive>) {
        self.objects.push(object.into());
    }

    pub fn objects(&self) -> &[Primitive] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Linear scan for the hit point closest to `ray.orig`. Hits within
    /// `EPSILON` of the origin are ignored so a reflected ray does not find
    /// the surface it leaves from.
    pub fn nearest_hit(&self, stats: &mut RenderStats, ray: &Ray, bias: Float) -> Option<Hit<'_>> {
        let mut nearest = None;
        let mut min_dist = Float::MAX;

        for object in &self.objects {
            let Some(point) = object.intersection(stats, ray, bias) else {
                continue;
            };
            let dist = (point - ray.orig).length();
            if dist > EPSILON && dist < min_dist {
                min_dist = dist;
                nearest = Some(Hit { object, point });
            }
        }
        nearest
    }
}

fn invalid_data(what: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, what)
}

fn geometry_error(name: &str, err: GeometryError) -> io::Error {
    invalid_data(format!("{name}: {err}"))
}

fn load_spheres(scene: &mut Scene, json: &serde_json::Value) -> io::Result<()> {
    loop {
        let s = format!("sphere.{}", scene.num_spheres);
        if json[&s].is_null() {
            break;
        }
        let sphere: Sphere = serde_json::from_value(json[&s].clone())?;
        sphere.validate().map_err(|e| geometry_error(&s, e))?;
        scene.add(sphere);
        scene.num_spheres += 1;
    }
    Ok(())
}

fn load_triangles(scene: &mut Scene, json: &serde_json::Value) -> io::Result<()> {
    loop {
        let s = format!("triangle.{}", scene.num_triangles);
        if json[&s].is_null() {
            break;
        }
        let raw: Triangle = serde_json::from_value(json[&s].clone())?;
        let triangle = Triangle::new(raw.points).map_err(|e| geometry_error(&s, e))?;
        scene.add(triangle);
        scene.num_triangles += 1;
    }
    Ok(())
}

fn load_mesh(scene: &mut Scene, json: &serde_json::Value, base_dir: &Path) -> io::Result<()> {
    loop {
        let name = format!("obj.{}.path", scene.num_objs);
        let Some(path) = json[&name].as_str() else {
            break;
        };
        let path = base_dir.join(path);
        let angle = |axis: &str| {
            json[&format!("obj.{}.rot{}", scene.num_objs, axis)]
                .as_f64()
                .unwrap_or(0.0)
        };
        let (angle_x, angle_y, angle_z) = (angle("x"), angle("y"), angle("z"));
        let (rad_x, rad_y, rad_z) = (
            angle_x.to_radians(),
            angle_y.to_radians(),
            angle_z.to_radians(),
        );

        let opt = tobj::LoadOptions {
            triangulate: true, // converts polygon into triangles
            ignore_lines: true,
            ignore_points: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj(&path, &opt)
            .map_err(|e| invalid_data(format!("{}: {e}", path.display())))?;

        let mut num_triangles_in_obj = 0;
        let mut num_skipped = 0;
        for m in &models {
            let mesh = &m.mesh;
            let n = mesh.indices.len() / 3;
            log::debug!(
                "-- model {} has {} triangles w/ {} vertices",
                m.name,
                n,
                mesh.positions.len() / 3
            );
            let vertex = |idx: u32| {
                let i = 3 * idx as usize;
                Point::new(
                    mesh.positions[i] as Float,
                    mesh.positions[i + 1] as Float,
                    mesh.positions[i + 2] as Float,
                )
                .rotx(rad_x)
                .roty(rad_y)
                .rotz(rad_z)
            };
            for face in mesh.indices.chunks_exact(3) {
                let points = [vertex(face[0]), vertex(face[1]), vertex(face[2])];
                match Triangle::new(points) {
                    Ok(triangle) => {
                        scene.add(triangle);
                        num_triangles_in_obj += 1;
                    }
                    Err(_) => num_skipped += 1,
                }
            }
        }
        if num_skipped > 0 {
            log::warn!("-- skipped {} malformed triangles", num_skipped);
        }
        log::info!(
            "-- loaded {} w/ {} triangles -- rotx={} roty={} rotz={}",
            path.display().to_string().green(),
            num_triangles_in_obj,
            angle_x,
            angle_y,
            angle_z
        );
        scene.num_triangles_in_all_objs += num_triangles_in_obj;
        scene.num_objs += 1;
    }
    Ok(())
}

fn load_resolution(cfg: &mut RenderConfig, json: &serde_json::Value) -> io::Result<()> {
    if cfg.res_x == 0 && cfg.res_y == 0 {
        if let Some(array) = json["resolution"].as_array() {
            let dim = |i: usize| {
                array
                    .get(i)
                    .and_then(|v| v.as_u64())
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| invalid_data("resolution must be [width, height]".to_owned()))
            };
            cfg.res_x = dim(0)?;
            cfg.res_y = dim(1)?;
        }
    }
    let res_str = format!("{}x{}", cfg.res_x, cfg.res_y).bold();
    let smp_str = format!(" w/ {}x{} samples", cfg.sampling, cfg.sampling).cyan();
    log::info!("-- img resolution: {}{}", res_str, smp_str);
    Ok(())
}

/// Builds a scene from an already parsed scene document. Mesh paths are
/// resolved against `base_dir`.
pub fn load_scene_json(json: &serde_json::Value, base_dir: &Path) -> io::Result<Scene> {
    let mut scene = Scene::new();

    load_spheres(&mut scene, json)?;
    load_triangles(&mut scene, json)?;
    load_mesh(&mut scene, json, base_dir)?;

    log::info!(
        "-- mesh={} triangles={} spheres={}",
        scene.num_objs,
        scene.num_triangles + scene.num_triangles_in_all_objs,
        scene.num_spheres,
    );
    for object in scene.objects() {
        log::trace!("{object}");
    }
    Ok(scene)
}

pub fn load_scene(cfg: &mut RenderConfig) -> io::Result<Scene> {
    if !cfg.scene_file.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("scene file {} not present", cfg.scene_file.display()),
        ));
    }
    log::info!(
        "loading scene file {}",
        cfg.scene_file.display().to_string().bold()
    );

    let data = fs::read_to_string(&cfg.scene_file)?;
    let json: serde_json::Value = serde_json::from_str(&data)?;

    load_resolution(cfg, &json)?;

    let base_dir = cfg
        .scene_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    load_scene_json(&json, &base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::three_d::LAMBDA;
    use crate::vec3::Vec3;
    use serde_json::json;
    use std::path::PathBuf;

    fn sphere(z: Float) -> Sphere {
        Sphere::new(Point::new(0.0, 0.0, z), 1.0).unwrap()
    }

    fn z_ray(orig_z: Float) -> Ray {
        Ray::new(Point::new(0.0, 0.0, orig_z), Vec3::new(0.0, 0.0, 1.0))
    }

    fn hit_center_z(hit: Hit<'_>) -> Float {
        match hit.object {
            Primitive::Sphere(s) => s.center.z,
            Primitive::Triangle(_) => panic!("expected a sphere"),
        }
    }

    #[test]
    fn nearest_hit_picks_closest() {
        let mut stats = RenderStats::default();
        for order in [[5.0, 10.0], [10.0, 5.0]] {
            let mut scene = Scene::new();
            scene.add(sphere(order[0]));
            scene.add(sphere(order[1]));
            let hit = scene.nearest_hit(&mut stats, &z_ray(0.0), 0.0).unwrap();
            assert_eq!(hit_center_z(hit), 5.0);
            assert_eq!(hit.point, Point::new(0.0, 0.0, 4.0));
        }
        assert_eq!(stats.num_intersects_sphere, 4);
    }

    #[test]
    fn nearest_hit_skips_own_origin() {
        let mut stats = RenderStats::default();
        let mut scene = Scene::new();
        scene.add(sphere(5.0));
        // starting on the surface, the only root found is the origin itself
        assert!(scene.nearest_hit(&mut stats, &z_ray(4.0), 0.0).is_none());
        assert!(scene.nearest_hit(&mut stats, &z_ray(6.0), 0.0).is_none());

        scene.add(sphere(10.0));
        let hit = scene.nearest_hit(&mut stats, &z_ray(6.0), 0.0).unwrap();
        assert_eq!(hit_center_z(hit), 10.0);
        assert_eq!(hit.point, Point::new(0.0, 0.0, 9.0));
    }

    #[test]
    fn lambda_ranks_by_biased_points() {
        let mut stats = RenderStats::default();
        let mut scene = Scene::new();
        scene.add(sphere(5.0));
        scene.add(sphere(10.0));
        // both hit points land ~1e6 behind the origin; the deeper surface
        // ends up closest
        let hit = scene.nearest_hit(&mut stats, &z_ray(0.0), LAMBDA).unwrap();
        assert_eq!(hit_center_z(hit), 10.0);
        assert_eq!(hit.point, Point::new(0.0, 0.0, 9.0 - LAMBDA));
    }

    #[test]
    fn empty_scene_has_no_hit() {
        let mut stats = RenderStats::default();
        let scene = Scene::new();
        assert!(scene.is_empty());
        assert!(scene.nearest_hit(&mut stats, &z_ray(0.0), LAMBDA).is_none());
    }

    #[test]
    fn loads_spheres_and_triangles() {
        let json = json!({
            "sphere.0": { "center": [1.0, 2.0, 3.0], "radius": 0.5 },
            "sphere.1": { "center": { "x": 0.0, "y": 0.0, "z": 9.0 }, "radius": 2.0 },
            "triangle.0": { "points": [[0, 0, 0], [1, 0, 0], [0, 1, 0]] },
            "sphere.3": { "center": [0, 0, 0], "radius": 1.0 },
        });
        let scene = load_scene_json(&json, Path::new(".")).unwrap();
        assert_eq!(scene.len(), 3);
        assert_eq!(scene.num_spheres, 2);
        assert_eq!(scene.num_triangles, 1);
        match scene.objects()[2] {
            Primitive::Triangle(t) => assert_eq!(t.normal, Vec3::new(0.0, 0.0, 1.0)),
            Primitive::Sphere(_) => panic!("expected a triangle"),
        }
    }

    #[test]
    fn rejects_degenerate_entries() {
        let bad_sphere = json!({ "sphere.0": { "center": [0, 0, 0], "radius": -1.0 } });
        let err = load_scene_json(&bad_sphere, Path::new(".")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let bad_triangle = json!({ "triangle.0": { "points": [[0, 0, 0], [1, 1, 1], [2, 2, 2]] } });
        let err = load_scene_json(&bad_triangle, Path::new(".")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let malformed = json!({ "sphere.0": { "radius": 1.0 } });
        assert!(load_scene_json(&malformed, Path::new(".")).is_err());
    }

    #[test]
    fn loads_obj_mesh() {
        let dir = std::env::temp_dir().join(format!("mirrortrace-mesh-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\nv 2 0 0\n\
                   f 1 2 3\nf 1 2 4\nf 1 2 5\n";
        fs::write(dir.join("tri.obj"), obj).unwrap();

        let json = json!({ "obj.0.path": "tri.obj", "obj.0.rotz": 90.0 });
        let scene = load_scene_json(&json, &dir).unwrap();
        // the last face is collinear and gets skipped
        assert_eq!(scene.num_objs, 1);
        assert_eq!(scene.num_triangles_in_all_objs, 2);
        assert_eq!(scene.len(), 2);
        match scene.objects()[0] {
            Primitive::Triangle(t) => {
                assert!((t.points[1] - Point::new(0.0, 1.0, 0.0)).length() < 1e-9);
            }
            Primitive::Sphere(_) => panic!("expected a triangle"),
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn resolution_comes_from_file_unless_set() {
        let json = json!({ "resolution": [32, 16] });
        let mut cfg = RenderConfig::default();
        load_resolution(&mut cfg, &json).unwrap();
        assert_eq!((cfg.res_x, cfg.res_y), (32, 16));

        let mut cfg = RenderConfig {
            res_x: 8,
            res_y: 8,
            ..Default::default()
        };
        load_resolution(&mut cfg, &json).unwrap();
        assert_eq!((cfg.res_x, cfg.res_y), (8, 8));
    }

    #[test]
    fn missing_scene_file_is_not_found() {
        let mut cfg = RenderConfig {
            scene_file: PathBuf::from("does/not/exist.json"),
            ..Default::default()
        };
        let err = load_scene(&mut cfg).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
