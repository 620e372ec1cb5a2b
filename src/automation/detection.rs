use crate::error::HelperError;
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, integral_squared_image};
use rustfft::{num_complex::Complex, FftDirection, FftPlanner};
use std::path::Path;

// Patches with less spread than this are treated as flat and score 0
const MIN_PATCH_DEVIATION: f64 = 0.5;

/// Best placement of a template inside a larger image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    pub top_left: (u32, u32),
    /// Center of the matched area, in image pixels
    pub center: (u32, u32),
    /// Zero-mean normalized cross-correlation score (-1.0-1.0)
    pub score: f32,
}

impl TemplateMatch {
    pub fn meets(&self, threshold: f32) -> bool {
        self.score >= threshold
    }
}

/// Load a template image from disk as grayscale
pub fn load_template(path: &Path) -> Result<GrayImage, HelperError> {
    if !path.exists() {
        return Err(HelperError::TemplateMissing(path.to_path_buf()));
    }

    let template = image::open(path).map_err(|source| HelperError::TemplateUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(template.to_luma8())
}

/// Slide `template` over `screen` and return the highest scoring placement.
///
/// Scores are zero-mean normalized cross-correlation: both the template and each
/// screen patch have their mean removed, so a flat patch (or a flat template)
/// scores 0 instead of matching anything bright.
pub fn best_match(screen: &GrayImage, template: &GrayImage) -> Result<TemplateMatch, HelperError> {
    let (screen_w, screen_h) = screen.dimensions();
    let (template_w, template_h) = template.dimensions();

    if template_w == 0 || template_h == 0 || template_w > screen_w || template_h > screen_h {
        return Err(HelperError::TemplateDoesNotFit {
            template_w,
            template_h,
            screen_w,
            screen_h,
        });
    }

    let scores = zero_mean_ncc(screen, template);
    let out_w = (screen_w - template_w + 1) as usize;

    let mut best_index = 0;
    let mut best = f64::NEG_INFINITY;
    for (i, &score) in scores.iter().enumerate() {
        if score > best {
            best = score;
            best_index = i;
        }
    }

    let top_left = ((best_index % out_w) as u32, (best_index / out_w) as u32);
    Ok(TemplateMatch {
        top_left,
        center: (top_left.0 + template_w / 2, top_left.1 + template_h / 2),
        score: best as f32,
    })
}

/// Scores for every placement, row-major, `(W-w+1) x (H-h+1)`
fn zero_mean_ncc(screen: &GrayImage, template: &GrayImage) -> Vec<f64> {
    let (screen_w, screen_h) = screen.dimensions();
    let (template_w, template_h) = template.dimensions();
    let out_w = screen_w - template_w + 1;
    let out_h = screen_h - template_h + 1;

    let n = (template_w * template_h) as f64;
    let template_mean = template.pixels().map(|p| p.0[0] as f64).sum::<f64>() / n;
    let template_ssd: f64 = template
        .pixels()
        .map(|p| {
            let d = p.0[0] as f64 - template_mean;
            d * d
        })
        .sum();

    if template_ssd < MIN_PATCH_DEVIATION {
        return vec![0.0; (out_w * out_h) as usize];
    }

    // The template is zero-mean, so sum(I * T') already equals sum((I - mean_I) * T')
    let cross = cross_correlate(screen, template, template_mean);
    let sums: Image<Luma<u64>> = integral_image(screen);
    let squares: Image<Luma<u64>> = integral_squared_image(screen);

    let mut scores = Vec::with_capacity((out_w * out_h) as usize);
    for y in 0..out_h {
        for x in 0..out_w {
            let sum = window_sum(&sums, x, y, template_w, template_h) as f64;
            let sum_sq = window_sum(&squares, x, y, template_w, template_h) as f64;
            let patch_ssd = sum_sq - sum * sum / n;

            let score = if patch_ssd < MIN_PATCH_DEVIATION {
                0.0
            } else {
                let c = cross[(y * screen_w + x) as usize];
                (c / (template_ssd * patch_ssd).sqrt()).clamp(-1.0, 1.0)
            };
            scores.push(score);
        }
    }
    scores
}

/// Sum of the `w x h` window at (x, y) from an integral image with a zero first row/column
fn window_sum(integral: &Image<Luma<u64>>, x: u32, y: u32, w: u32, h: u32) -> u64 {
    let at = |x: u32, y: u32| integral.get_pixel(x, y).0[0];
    (at(x + w, y + h) + at(x, y)) - (at(x + w, y) + at(x, y + h))
}

/// sum over (i, j) of screen(x+i, y+j) * (template(i, j) - mean), for every (x, y).
/// Computed in the frequency domain; indices past the valid placements wrap and are ignored.
fn cross_correlate(screen: &GrayImage, template: &GrayImage, template_mean: f64) -> Vec<f64> {
    let (w, h) = screen.dimensions();
    let (w, h) = (w as usize, h as usize);

    let mut image: Vec<Complex<f64>> = screen
        .pixels()
        .map(|p| Complex::new(p.0[0] as f64, 0.0))
        .collect();
    let mut kernel = vec![Complex::new(0.0, 0.0); w * h];
    for (x, y, p) in template.enumerate_pixels() {
        kernel[y as usize * w + x as usize] = Complex::new(p.0[0] as f64 - template_mean, 0.0);
    }

    let mut planner = FftPlanner::new();
    fft_2d(&mut planner, &mut image, w, h, FftDirection::Forward);
    fft_2d(&mut planner, &mut kernel, w, h, FftDirection::Forward);

    for (a, b) in image.iter_mut().zip(&kernel) {
        *a *= b.conj();
    }

    fft_2d(&mut planner, &mut image, w, h, FftDirection::Inverse);

    // rustfft leaves the inverse unnormalized
    let scale = (w * h) as f64;
    image.into_iter().map(|c| c.re / scale).collect()
}

fn fft_2d(
    planner: &mut FftPlanner<f64>,
    data: &mut Vec<Complex<f64>>,
    width: usize,
    height: usize,
    direction: FftDirection,
) {
    // Rows, then columns via a transpose
    planner.plan_fft(width, direction).process(data);
    let mut columns = transpose(data, width, height);
    planner.plan_fft(height, direction).process(&mut columns);
    *data = transpose(&columns, height, width);
}

fn transpose(data: &[Complex<f64>], width: usize, height: usize) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::default(); data.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = data[y * width + x];
        }
    }
    out
}

/// Crop a `2*half_w` x `2*half_h` region centered on `center`, clipped to the image bounds
pub fn region_around(
    image: &RgbImage,
    center: (u32, u32),
    half_w: u32,
    half_h: u32,
) -> Option<RgbImage> {
    let (width, height) = image.dimensions();
    let (cx, cy) = (center.0.min(width), center.1.min(height));

    let left = cx.saturating_sub(half_w);
    let top = cy.saturating_sub(half_h);
    let right = cx.saturating_add(half_w).min(width);
    let bottom = cy.saturating_add(half_h).min(height);

    if right <= left || bottom <= top {
        return None;
    }

    Some(imageops::crop_imm(image, left, top, right - left, bottom - top).to_image())
}
