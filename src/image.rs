use crate::color::RGBA;
use colored::Colorize;
use ::image::{Rgba, RgbaImage};
use std::io;
use std::path::Path;
use std::time::Instant;

const GAMMA: f64 = 2.2;

pub struct Image {
    use_gamma: bool,
    res_x: u32,
    res_y: u32,
    pixels: Vec<RGBA>,
}

fn gamma_encode(linear: f64) -> f64 {
    linear.powf(1.0 / GAMMA)
}

fn pixel_index(res_x: u32, x: u32, y: u32) -> usize {
    y as usize * res_x as usize + x as usize
}

fn to_u8(c: f64) -> u8 {
    (255.0 * c).clamp(0.0, 255.0) as u8
}

impl Image {
    pub fn new(use_gamma: bool, res_x: u32, res_y: u32) -> Self {
        Self {
            use_gamma,
            res_x,
            res_y,
            pixels: vec![RGBA::zero(); res_x as usize * res_y as usize],
        }
    }
    pub fn push_pixel(&mut self, x: u32, y: u32, c: RGBA) {
        self.pixels[pixel_index(self.res_x, x, y)] = c;
    }
    pub fn get_pixel(&self, x: u32, y: u32) -> RGBA {
        self.pixels[pixel_index(self.res_x, x, y)]
    }
    /// 8-bit RGBA; gamma, when enabled, applies to the color channels only.
    pub fn to_rgba8(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.res_x, self.res_y);
        for (x, y, px) in img.enumerate_pixels_mut() {
            let c = self.get_pixel(x, y);
            let (mut rf, mut gf, mut bf) = (c.r, c.g, c.b);
            if self.use_gamma {
                rf = gamma_encode(rf);
                gf = gamma_encode(gf);
                bf = gamma_encode(bf);
            }
            *px = Rgba([to_u8(rf), to_u8(gf), to_u8(bf), to_u8(c.a)]);
        }
        img
    }
    pub fn save_image(&self, file: &Path) -> io::Result<()> {
        let start_time = Instant::now();

        self.to_rgba8().save(file).map_err(io::Error::other)?;

        let elapsed = start_time.elapsed();
        log::info!(
            "writing '{}' took {} sec",
            file.display().to_string().bold(),
            elapsed.as_millis() as f64 / 1000.0
        );
        Ok(())
    }
}
