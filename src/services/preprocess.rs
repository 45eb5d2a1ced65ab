// Canonical preprocessing ahead of recognition
//
// Pure functions, no I/O: luma grayscale followed by local adaptive
// binarization. The threshold is computed per pixel from a
// Gaussian-weighted neighborhood mean, so it tracks local illumination
// gradients instead of a single global cut.

use image::{DynamicImage, GrayImage, Luma};

/// Side length of the square neighborhood the local threshold is
/// computed over.
const BLOCK_SIZE: usize = 11;

/// Constant subtracted from the local mean before thresholding.
const BIAS: f32 = 2.0;

/// Gaussian sigma matching an 11-tap kernel (0.3 * ((n - 1) * 0.5 - 1) + 0.8).
const SIGMA: f32 = 2.0;

/// Convert to grayscale and binarize. Output is a strictly two-level
/// (0/255) raster with the same dimensions as the input.
pub fn binarize(image: &DynamicImage) -> GrayImage {
    adaptive_threshold(&image.to_luma8())
}

/// Local adaptive binarization: white where the pixel exceeds its
/// Gaussian neighborhood mean minus the bias, black otherwise. Borders
/// are handled by edge replication.
fn adaptive_threshold(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let w = width as usize;
    let h = height as usize;
    let kernel = gaussian_kernel();
    let radius = (BLOCK_SIZE / 2) as isize;

    // Separable convolution: horizontal pass first
    let mut rows = vec![0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = clamp_index(x as isize + k as isize - radius, w);
                acc += weight * gray.get_pixel(sx as u32, y as u32)[0] as f32;
            }
            rows[y * w + x] = acc;
        }
    }

    // Vertical pass completes the local mean, then threshold in place
    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        for x in 0..w {
            let mut mean = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = clamp_index(y as isize + k as isize - radius, h);
                mean += weight * rows[sy * w + x];
            }
            let value = gray.get_pixel(x as u32, y as u32)[0] as f32;
            let pixel = if value > mean - BIAS { 255u8 } else { 0u8 };
            out.put_pixel(x as u32, y as u32, Luma([pixel]));
        }
    }

    out
}

fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

fn gaussian_kernel() -> [f32; BLOCK_SIZE] {
    let mut kernel = [0f32; BLOCK_SIZE];
    let center = (BLOCK_SIZE / 2) as f32;
    let mut sum = 0f32;
    for (i, weight) in kernel.iter_mut().enumerate() {
        let d = i as f32 - center;
        *weight = (-d * d / (2.0 * SIGMA * SIGMA)).exp();
        sum += *weight;
    }
    for weight in kernel.iter_mut() {
        *weight /= sum;
    }
    kernel
}
