use clap::{Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::LevelFilter;

use mirrortrace::render::RenderConfig;
use mirrortrace::render::RenderJob;
use mirrortrace::scene::load_scene;
use mirrortrace::three_d::LAMBDA;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mirrortrace", about = "minimal mirror raytracer")]
struct Options {
    #[arg(long, default_value = "pic.png")]
    img_file: PathBuf,
    #[arg(short = 'l', long, default_value = "scene.json")]
    scene_file: PathBuf,
    /// Image width; 0 takes the scene's resolution
    #[arg(short = 'x', long, default_value_t = 0)]
    res_x: u32,
    /// Image height; 0 takes the scene's resolution
    #[arg(short = 'y', long, default_value_t = 0)]
    res_y: u32,
    /// Samples per pixel side
    #[arg(short = 's', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    sampling: u32,
    #[arg(long, default_value_t = 6)]
    reflection_max_depth: u32,
    /// Distance hit points are moved back along the ray
    #[arg(long, default_value_t = LAMBDA, allow_negative_numbers = true)]
    bias: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(short = 'g', long)]
    use_gamma: bool,
    /// Split the image in rows instead of 32x32 boxes
    #[arg(long)]
    use_lines: bool,
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

fn print_opt(opt: &Options) {
    log::info!(
        "use_gamma: {} sampling: {} max-depth: {} bias: {} seed: {}",
        opt.use_gamma,
        opt.sampling,
        opt.reflection_max_depth,
        opt.bias,
        opt.seed
    );
    let s = format!("num_threads: {}", rayon::current_num_threads()).red();
    log::info!("{s}");
}

fn main() -> io::Result<()> {
    let opt = Options::parse();

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(opt.log_level))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let exit_req = Arc::new(AtomicBool::new(false));
    let exit_req_clone = exit_req.clone();
    ctrlc::set_handler(move || exit_req_clone.store(true, Ordering::SeqCst))
        .map_err(io::Error::other)?;

    print_opt(&opt);

    let mut cfg = RenderConfig {
        use_lines: opt.use_lines,
        use_gamma: opt.use_gamma,
        reflection_max_depth: opt.reflection_max_depth,
        sampling: opt.sampling,
        bias: opt.bias,
        seed: opt.seed,
        res_x: opt.res_x,
        res_y: opt.res_y,
        scene_file: opt.scene_file,
        image_file: opt.img_file,
    };
    let scene = load_scene(&mut cfg)?;
    if cfg.res_x == 0 || cfg.res_y == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no resolution: pass -x/-y or set \"resolution\" in the scene",
        ));
    }

    let pb = ProgressBar::new(1000);
    pb.set_style(
        ProgressStyle::with_template("{elapsed_precise} [{bar:40.cyan/blue}] {percent}%")
            .map_err(io::Error::other)?
            .progress_chars("=> "),
    );

    let mut job = RenderJob::new(cfg, scene);
    let pb_clone = pb.clone();
    job.set_progress_func(Box::new(move |pct| {
        pb_clone.set_position((pct * 1000.0) as u64);
    }));

    job.render_scene(exit_req);
    pb.finish_and_clear();

    job.save_image()?;
    job.print_stats();

    Ok(())
}
