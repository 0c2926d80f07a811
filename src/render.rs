use colored::Colorize;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::GeometryError;
use crate::ProgressFunc;
use crate::Ray;
use crate::RenderStats;
use crate::camera::Camera;
use crate::color::RGBA;
use crate::image::Image;
use crate::scene::Scene;
use crate::three_d::Intersectable;
use crate::three_d::LAMBDA;
use crate::vec3::Float;

/// Knobs of the tracing engine itself.
#[derive(Debug, Clone, Copy)]
pub struct TracerConfig {
    /// Deepest recursion level that still reflects.
    pub max_depth: u32,
    /// Samples per pixel side; a pixel gets `sampling * sampling` rays.
    pub sampling: u32,
    /// Subtracted from the ray parameter of every hit.
    pub bias: Float,
}

impl Default for TracerConfig {
    fn default() -> Self {
        TracerConfig {
            max_depth: 6,
            sampling: 1,
            bias: LAMBDA,
        }
    }
}

/// Mirror-only tracer over a read-only scene.
///
/// Surfaces contribute no color of their own: a ray either escapes (black)
/// or bounces until `max_depth` is exceeded (black), so every traced value is
/// the clamped zero color. Degenerate geometry met on the way is returned as
/// an error instead.
pub struct RayTracer<'a> {
    scene: &'a Scene,
    camera: Camera,
    cfg: TracerConfig,
}

impl<'a> RayTracer<'a> {
    pub fn new(scene: &'a Scene, cfg: TracerConfig) -> Self {
        Self {
            scene,
            camera: Camera::default(),
            cfg,
        }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.cfg
    }

    pub fn trace_ray(
        &self,
        stats: &mut RenderStats,
        ray: &Ray,
        depth: u32,
    ) -> Result<RGBA, GeometryError> {
        let mut rad = RGBA::zero();

        let Some(hit) = self.scene.nearest_hit(stats, ray, self.cfg.bias) else {
            return Ok(rad);
        };
        if depth > self.cfg.max_depth {
            stats.num_rays_hit_max_level += 1;
            rad.clamp(1.0);
            return Ok(rad);
        }

        let normal = hit.object.get_normal(hit.point)?;
        stats.num_rays_reflection += 1;
        let reflected_ray = ray.get_reflection(hit.point, normal);

        rad += self.trace_ray(stats, &reflected_ray, depth + 1)?;
        rad.clamp(1.0);
        Ok(rad)
    }

    /// Color of pixel (x, y): jittered `sampling x sampling` grid of primary
    /// rays, averaged and clamped to `[0, 1]`.
    pub fn sample_pixel<R: Rng>(
        &self,
        stats: &mut RenderStats,
        rng: &mut R,
        x: u32,
        y: u32,
    ) -> Result<RGBA, GeometryError> {
        let camera = self.camera;
        supersample(self.cfg.sampling, x, y, rng, |u, v| {
            stats.num_rays_sampling += 1;
            self.trace_ray(stats, &camera.get_ray(u, v), 0)
        })
    }
}

/// Stratified sampling of pixel (x, y): one uniformly jittered position per
/// cell of an `n x n` grid, results averaged. `n == 0` counts as 1.
pub fn supersample<R, F>(
    n: u32,
    x: u32,
    y: u32,
    rng: &mut R,
    mut sample: F,
) -> Result<RGBA, GeometryError>
where
    R: Rng,
    F: FnMut(Float, Float) -> Result<RGBA, GeometryError>,
{
    let n = n.max(1);
    let step = 1.0 / n as Float;
    let mut c = RGBA::zero();

    for i in 0..n {
        for j in 0..n {
            let r1: Float = rng.gen_range(0.0..1.0);
            let r2: Float = rng.gen_range(0.0..1.0);
            let u = x as Float + (i as Float + r1) * step;
            let v = y as Float + (j as Float + r2) * step;
            c += sample(u, v)?;
        }
    }
    c = c * (step * step);
    c.clamp(1.0);
    Ok(c)
}

/// Independent, reproducible random stream for one pixel.
pub fn pixel_rng(seed: u64, res_x: u32, x: u32, y: u32) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(y as u64 * res_x as u64 + x as u64);
    rng
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub use_lines: bool,
    pub use_gamma: bool,
    pub reflection_max_depth: u32,
    pub sampling: u32,
    pub bias: Float,
    pub seed: u64,
    pub res_x: u32,
    pub res_y: u32,
    pub scene_file: PathBuf,
    pub image_file: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let tracer = TracerConfig::default();
        RenderConfig {
            use_lines: false,
            use_gamma: false,
            reflection_max_depth: tracer.max_depth,
            sampling: tracer.sampling,
            bias: tracer.bias,
            seed: 0,
            res_x: 0,
            res_y: 0,
            scene_file: PathBuf::from("scene.json"),
            image_file: PathBuf::from("pic.png"),
        }
    }
}

impl RenderConfig {
    pub fn tracer_config(&self) -> TracerConfig {
        TracerConfig {
            max_depth: self.reflection_max_depth,
            sampling: self.sampling,
            bias: self.bias,
        }
    }
    pub fn num_pixels(&self) -> u64 {
        self.res_x as u64 * self.res_y as u64
    }
}

/// Short human form of a counter: `999`, `1.50K`, `12.35M`.
pub fn format_count(n: u64) -> String {
    const UNITS: [(u64, &str); 4] = [
        (1_000_000_000_000, "T"),
        (1_000_000_000, "G"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];
    for (scale, unit) in UNITS {
        if n >= scale {
            return format!("{:.2}{unit}", n as Float / scale as Float);
        }
    }
    n.to_string()
}

fn percent(n: u64, of: u64) -> Float {
    100.0 * n as Float / of.max(1) as Float
}

/// Summary of a finished render: a throughput line, then one line per counter.
pub fn stats_report(stats: &RenderStats, num_pixels: u64, elapsed: Duration) -> Vec<String> {
    let num_rays = stats.num_rays_sampling + stats.num_rays_reflection;
    let secs = elapsed.as_secs_f64();
    let rays_per_sec = (num_rays as Float / secs.max(1e-9)) as u64;

    let mut lines = vec![format!(
        "{} pixels, {} rays in {secs:.2} sec ({} rays/sec)",
        format_count(num_pixels),
        format_count(num_rays),
        format_count(rays_per_sec)
    )];
    let primary = stats.num_rays_sampling;
    let counters = [
        ("primary rays", primary, None),
        ("reflections", stats.num_rays_reflection, None),
        ("depth limit", stats.num_rays_hit_max_level, Some(primary)),
        ("degenerate pixels", stats.num_degenerate, Some(num_pixels)),
        ("sphere tests", stats.num_intersects_sphere, None),
        ("triangle tests", stats.num_intersects_triangle, None),
    ];
    for (name, n, of) in counters {
        let mut line = format!("  {name:<18}{:>9}", format_count(n));
        if let Some(of) = of {
            line.push_str(&format!("  {:5.1}%", percent(n, of)));
        }
        lines.push(line);
    }
    lines
}

/// Renders a whole image, one `RayTracer::sample_pixel` call per pixel,
/// spread over the rayon pool.
pub struct RenderJob {
    scene: Scene,
    image: Arc<Mutex<Image>>,
    cfg: RenderConfig,
    progress_total: Mutex<usize>,
    progress_func: ProgressFunc,
    start_ts: Instant,
    total_stats: Mutex<RenderStats>,
}

impl RenderJob {
    pub fn new(cfg: RenderConfig, scene: Scene) -> Self {
        Self {
            scene,
            image: Arc::new(Mutex::new(Image::new(cfg.use_gamma, cfg.res_x, cfg.res_y))),
            cfg,
            progress_total: Mutex::new(0),
            progress_func: ProgressFunc {
                func: Box::new(|_| {}),
            },
            start_ts: Instant::now(),
            total_stats: Mutex::new(Default::default()),
        }
    }

    pub fn set_progress_func(&mut self, func: Box<dyn Fn(f32) + Send + Sync>) {
        self.progress_func.func = func;
    }

    fn report_progress(&self, v: u32) {
        let denom = self.cfg.num_pixels().max(1) as usize;
        let chunk = (denom / 128).max(1);
        let mut total = lock(&self.progress_total);
        let before = (*total).div_euclid(chunk);
        *total += v as usize;
        let after = (*total).div_euclid(chunk);
        if before != after || *total >= denom {
            let pct = *total as f32 / denom as f32;
            (self.progress_func.func)(pct.min(1.0));
        }
    }

    fn render_pixel_box(
        &self,
        tracer: &RayTracer<'_>,
        x0: u32,
        y0: u32,
        sz_x: u32,
        sz_y: u32,
        stats: &mut RenderStats,
    ) {
        let y_max = (y0 + sz_y).min(self.cfg.res_y);
        let x_max = (x0 + sz_x).min(self.cfg.res_x);
        let mut pixels = Vec::with_capacity((y_max - y0) as usize * (x_max - x0) as usize);

        for y in y0..y_max {
            for x in x0..x_max {
                let mut rng = pixel_rng(self.cfg.seed, self.cfg.res_x, x, y);
                let c = match tracer.sample_pixel(stats, &mut rng, x, y) {
                    Ok(c) => c,
                    Err(e) => {
                        log::warn!("pixel ({x}, {y}): {e}");
                        stats.num_degenerate += 1;
                        RGBA::zero()
                    }
                };
                pixels.push((x, y, c));
            }
        }

        let mut image = lock(&self.image);
        for (x, y, c) in pixels {
            image.push_pixel(x, y, c);
        }
    }

    fn render_image_lines(&self, tracer: &RayTracer<'_>, exit_req: &AtomicBool) {
        (0..self.cfg.res_y).into_par_iter().for_each(|y| {
            let mut stats: RenderStats = Default::default();

            if exit_req.load(Ordering::SeqCst) {
                self.report_progress(self.cfg.res_x);
                return;
            }
            self.render_pixel_box(tracer, 0, y, self.cfg.res_x, 1, &mut stats);
            self.report_progress(self.cfg.res_x);
            lock(&self.total_stats).add(stats);
        });
    }

    fn render_image_box(&self, tracer: &RayTracer<'_>, exit_req: &AtomicBool) {
        let step = 32;
        let ny = self.cfg.res_y.div_ceil(step);
        let nx = self.cfg.res_x.div_ceil(step);
        (0..ny * nx).into_par_iter().for_each(|v| {
            let mut stats: RenderStats = Default::default();
            let x = (v % nx) * step;
            let y = (v / nx) * step;
            let w = step.min(self.cfg.res_x - x);
            let h = step.min(self.cfg.res_y - y);

            if exit_req.load(Ordering::SeqCst) {
                self.report_progress(w * h);
                return;
            }
            self.render_pixel_box(tracer, x, y, step, step, &mut stats);
            self.report_progress(w * h);
            lock(&self.total_stats).add(stats);
        });
    }

    pub fn render_scene(&self, exit_req: Arc<AtomicBool>) {
        let tracer = RayTracer::new(&self.scene, self.cfg.tracer_config());
        log::debug!(
            "rendering {} objects, {:?}",
            self.scene.len(),
            tracer.config()
        );
        tracer.camera.display();

        if self.cfg.use_lines {
            self.render_image_lines(&tracer, &exit_req);
        } else {
            self.render_image_box(&tracer, &exit_req);
        }
        if exit_req.load(Ordering::SeqCst) {
            log::warn!("rendering interrupted, image is incomplete");
        }
    }

    pub fn stats(&self) -> RenderStats {
        *lock(&self.total_stats)
    }

    pub fn pixel(&self, x: u32, y: u32) -> RGBA {
        lock(&self.image).get_pixel(x, y)
    }

    pub fn print_stats(&self) {
        let lines = stats_report(&self.stats(), self.cfg.num_pixels(), self.start_ts.elapsed());
        for (i, line) in lines.iter().enumerate() {
            if i == 0 {
                println!("{}", line.bold());
            } else {
                println!("{line}");
            }
        }
    }

    pub fn save_image(&self) -> io::Result<()> {
        lock(&self.image).save_image(&self.cfg.image_file)
    }
}
