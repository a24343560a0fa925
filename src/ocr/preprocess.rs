// Page image preprocessing.
//
// Scans and phone photos arrive small, noisy and unevenly lit. Every page is
// turned into grayscale, upscaled to a minimum working size, bilateral-filtered
// and contrast-equalized (CLAHE), then emitted as three variants that fail in
// different ways under OCR: a locally thresholded binary, a globally (Otsu)
// thresholded binary, and the equalized grayscale itself.

use std::fmt;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{adaptive_threshold, otsu_level};
use imageproc::filter::bilateral_filter;
use tracing::{debug, warn};

use crate::error::AnalysisError;

/// Pages smaller than this (in either dimension) are upscaled.
const MIN_HEIGHT: u32 = 800;
const MIN_WIDTH: u32 = 600;
/// Smallest upscale factor once upscaling kicks in.
const MIN_UPSCALE: f64 = 1.5;

/// CLAHE parameters: clip limit relative to a flat histogram, and tile grid.
const CLAHE_CLIP_LIMIT: f64 = 2.0;
const CLAHE_GRID: u32 = 8;

/// Bilateral filter window and sigmas (color, spatial).
const BILATERAL_WINDOW: u32 = 9;
const BILATERAL_SIGMA: f32 = 75.0;

/// Block radius for the local threshold (an 11x11 window).
const ADAPTIVE_BLOCK_RADIUS: u32 = 5;

/// The preprocessing variants, in the order OCR tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Adaptive,
    Otsu,
    Enhanced,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Adaptive, Variant::Otsu, Variant::Enhanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Adaptive => "adaptive",
            Variant::Otsu => "otsu",
            Variant::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One preprocessed rendition of a page.
pub struct PreparedImage {
    pub variant: Variant,
    pub image: GrayImage,
}

#[derive(Default)]
pub struct ImagePreprocessor {
    /// When set, every variant is also written here as
    /// `<stem>_<variant>.png` for inspection.
    debug_dir: Option<PathBuf>,
}

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug_dir(debug_dir: impl Into<PathBuf>) -> Self {
        Self {
            debug_dir: Some(debug_dir.into()),
        }
    }

    /// Decode `path` and produce all variants.
    pub fn process_file(&self, path: &Path) -> Result<Vec<PreparedImage>, AnalysisError> {
        let img = image::open(path).map_err(|source| AnalysisError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let variants = self.prepare(&img);

        if let Some(dir) = &self.debug_dir {
            let stem = file_stem(path);
            write_debug_images(dir, &stem, &variants);
        }

        Ok(variants)
    }

    /// Produce the variants for an already decoded page.
    pub fn prepare(&self, img: &DynamicImage) -> Vec<PreparedImage> {
        let gray = upscale(img.to_luma8());
        let denoised = denoise(&gray);
        let enhanced = clahe(&denoised, CLAHE_CLIP_LIMIT, CLAHE_GRID);

        let adaptive = adaptive_threshold(&enhanced, ADAPTIVE_BLOCK_RADIUS);
        let otsu = binarize(&enhanced, otsu_level(&enhanced));

        debug!(
            width = enhanced.width(),
            height = enhanced.height(),
            "Prepared preprocessing variants"
        );

        vec![
            PreparedImage {
                variant: Variant::Adaptive,
                image: adaptive,
            },
            PreparedImage {
                variant: Variant::Otsu,
                image: otsu,
            },
            PreparedImage {
                variant: Variant::Enhanced,
                image: enhanced,
            },
        ]
    }
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string())
}

fn write_debug_images(dir: &Path, stem: &str, variants: &[PreparedImage]) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "Could not create debug image directory");
        return;
    }
    for prepared in variants {
        let path = dir.join(format!("{stem}_{}.png", prepared.variant));
        if let Err(e) = prepared.image.save(&path) {
            warn!(path = %path.display(), error = %e, "Could not write debug image");
        }
    }
}

/// Upscale small pages so glyphs are large enough for OCR.
fn upscale(gray: GrayImage) -> GrayImage {
    let (w, h) = gray.dimensions();
    if h >= MIN_HEIGHT && w >= MIN_WIDTH {
        return gray;
    }
    let scale = scale_factor(w, h);
    let new_w = (w as f64 * scale).round() as u32;
    let new_h = (h as f64 * scale).round() as u32;
    debug!(from_w = w, from_h = h, to_w = new_w, to_h = new_h, "Upscaling page");
    imageops::resize(&gray, new_w, new_h, FilterType::CatmullRom)
}

/// max(800/h, 600/w, 1.5), for a page below the minimum size.
pub(crate) fn scale_factor(width: u32, height: u32) -> f64 {
    let by_height = MIN_HEIGHT as f64 / height.max(1) as f64;
    let by_width = MIN_WIDTH as f64 / width.max(1) as f64;
    by_height.max(by_width).max(MIN_UPSCALE)
}

/// Edge-preserving smoothing. Empty images pass through untouched.
pub(crate) fn denoise(gray: &GrayImage) -> GrayImage {
    if gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }
    bilateral_filter(gray, BILATERAL_WINDOW, BILATERAL_SIGMA, BILATERAL_SIGMA)
}

fn binarize(img: &GrayImage, level: u8) -> GrayImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel[0] = if pixel[0] > level { 255 } else { 0 };
    }
    out
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `grid` x `grid` set of tiles. Each tile gets its
/// own equalization table built from a clipped histogram: counts above
/// `clip_limit * tile_area / 256` are cut and the excess is spread evenly
/// over all bins. Output pixels bilinearly blend the tables of the four
/// nearest tile centres so tile borders do not show.
pub(crate) fn clahe(img: &GrayImage, clip_limit: f64, grid: u32) -> GrayImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let tiles_x = grid.clamp(1, w);
    let tiles_y = grid.clamp(1, h);
    let tile_w = w.div_ceil(tiles_x);
    let tile_h = h.div_ceil(tiles_y);

    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            luts[(ty * tiles_x + tx) as usize] = tile_lut(img, x0, y0, x1, y1, clip_limit);
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        let (ty0, ty1, ay) = neighbours(y, tile_h, tiles_y);
        for x in 0..w {
            let (tx0, tx1, ax) = neighbours(x, tile_w, tiles_x);
            let v = img.get_pixel(x, y)[0] as usize;
            let lut = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][v] as f64;

            let top = lut(tx0, ty0) * (1.0 - ax) + lut(tx1, ty0) * ax;
            let bottom = lut(tx0, ty1) * (1.0 - ax) + lut(tx1, ty1) * ax;
            let value = top * (1.0 - ay) + bottom * ay;
            out.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Equalization table for one tile with a clipped histogram.
fn tile_lut(img: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    let area = ((x1 - x0) * (y1 - y0)) as usize;
    if area == 0 {
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = i as u8;
        }
        return lut;
    }

    let mut hist = [0usize; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[img.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let limit = ((clip_limit * area as f64 / 256.0) as usize).max(1);
    let mut excess = 0;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }
    let bonus = excess / 256;
    let residual = excess % 256;
    for (i, count) in hist.iter_mut().enumerate() {
        *count += bonus + usize::from(i < residual);
    }

    let scale = 255.0 / area as f64;
    let mut cdf = 0;
    for (entry, count) in lut.iter_mut().zip(hist) {
        cdf += count;
        *entry = (cdf as f64 * scale).round().min(255.0) as u8;
    }
    lut
}

/// The two tile indices whose centres bracket `pos`, and the blend weight
/// toward the second.
fn neighbours(pos: u32, tile_size: u32, tiles: u32) -> (u32, u32, f64) {
    let f = (pos as f64 + 0.5) / tile_size as f64 - 0.5;
    let last = (tiles - 1) as f64;
    let f = f.clamp(0.0, last);
    let i0 = f.floor() as u32;
    let i1 = (i0 + 1).min(tiles - 1);
    (i0, i1, f - i0 as f64)
}
