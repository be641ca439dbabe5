//! Per-pixel visual-importance maps (§4.5).
//!
//! Two interchangeable backends share one trait, the same shape the
//! payload-encryption strategy pair (`PayloadEncryption`/
//! `EncryptedHashStrategy`) used for pluggable algorithms behind a narrow
//! interface. The embedder treats a map from either backend, or the
//! uniform fallback, identically: a monotone preference signal that only
//! ever scales per-site strength, never which sites are chosen (§4.6).

use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;

use crate::image::{Image, YChannel};

/// An H×W map of importance values in `[0, 1]`, one entry per usable pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct SaliencyMap {
    height: usize,
    width: usize,
    values: Vec<f32>,
}

impl SaliencyMap {
    pub fn uniform(height: usize, width: usize, value: f32) -> Self {
        SaliencyMap { height, width, values: vec![value; height * width] }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.width + col]
    }

    /// Average value over the 8x8 block at `(block_y, block_x)`, the
    /// granularity the embedder actually biases strength at (§4.6).
    pub fn block_mean(&self, block_y: usize, block_x: usize) -> f32 {
        let base_row = block_y * 8;
        let base_col = block_x * 8;
        let mut sum = 0f32;
        for r in 0..8 {
            for c in 0..8 {
                sum += self.get(base_row + r, base_col + c);
            }
        }
        sum / 64.0
    }
}

/// Produces a saliency map for an image. The codec never depends on which
/// realization produced the map (§4.5).
pub trait SaliencyBackend {
    fn detect(&self, image: &Image) -> SaliencyMap;
}

/// Classical backend: a blend of gradient magnitude, spectral-residual
/// saliency, and edge density, normalized to `[0, 1]` (§4.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct Classical;

impl SaliencyBackend for Classical {
    fn detect(&self, image: &Image) -> SaliencyMap {
        let y = image.y_channel();
        let gradient = gradient_magnitude(&y);
        let spectral = spectral_residual(&y);
        let edges = edge_density(&gradient, 8);

        let h = y.height();
        let w = y.width();
        let mut blended = vec![0f32; h * w];
        for i in 0..blended.len() {
            blended[i] = 0.4 * gradient[i] + 0.4 * spectral[i] + 0.2 * edges[i];
        }
        normalize_to_unit_range(&mut blended);

        SaliencyMap { height: h, width: w, values: blended }
    }
}

/// Deep backend: wraps an externally-supplied model, e.g. a neural
/// saliency network running behind a synchronous façade (§5: the deep
/// backend owns its own thread/executor if it needs one).
pub struct Deep<F>
where
    F: Fn(&Image) -> SaliencyMap,
{
    model: F,
}

impl<F> Deep<F>
where
    F: Fn(&Image) -> SaliencyMap,
{
    pub fn new(model: F) -> Self {
        Deep { model }
    }
}

impl<F> SaliencyBackend for Deep<F>
where
    F: Fn(&Image) -> SaliencyMap,
{
    fn detect(&self, image: &Image) -> SaliencyMap {
        (self.model)(image)
    }
}

/// Uniform fallback (all `0.5`), used when no saliency backend is
/// configured (§4.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl SaliencyBackend for Uniform {
    fn detect(&self, image: &Image) -> SaliencyMap {
        SaliencyMap::uniform(image.usable_height(), image.usable_width(), 0.5)
    }
}

/// Sobel gradient magnitude, normalized to `[0, 1]` by its own max.
fn gradient_magnitude(y: &YChannel) -> Vec<f32> {
    let h = y.height();
    let w = y.width();
    let mut out = vec![0f32; h * w];

    let sobel_x = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
    let sobel_y = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

    for row in 0..h {
        for col in 0..w {
            let mut gx = 0f32;
            let mut gy = 0f32;
            for (dr, srow) in sobel_x.iter().enumerate() {
                for (dc, &kx) in srow.iter().enumerate() {
                    let r = clamp_index(row as isize + dr as isize - 1, h);
                    let c = clamp_index(col as isize + dc as isize - 1, w);
                    let sample = y.get(r, c);
                    gx += kx * sample;
                    gy += sobel_y[dr][dc] * sample;
                }
            }
            out[row * w + col] = (gx * gx + gy * gy).sqrt();
        }
    }

    normalize_to_unit_range(&mut out);
    out
}

fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Spectral residual saliency (Hou & Zhang, 2007): subtract a locally
/// smoothed log-amplitude spectrum from itself, reconstruct through the
/// inverse FFT, and square the magnitude.
fn spectral_residual(y: &YChannel) -> Vec<f32> {
    let h = y.height();
    let w = y.width();

    let mut spectrum: Vec<Complex32> = (0..h * w)
        .map(|i| Complex32::new(y.get(i / w, i % w), 0.0))
        .collect();
    fft_2d(&mut spectrum, h, w, false);

    let log_amplitude: Vec<f32> = spectrum.iter().map(|c| c.norm().max(1e-6).ln()).collect();
    let smoothed = box_blur(&log_amplitude, h, w, 3);

    let mut residual_spectrum: Vec<Complex32> = spectrum
        .iter()
        .zip(log_amplitude.iter())
        .zip(smoothed.iter())
        .map(|((c, &log_amp), &smooth)| {
            let residual = log_amp - smooth;
            let phase = c.arg();
            Complex32::from_polar(residual.exp(), phase)
        })
        .collect();
    fft_2d(&mut residual_spectrum, h, w, true);

    let mut saliency: Vec<f32> = residual_spectrum.iter().map(|c| c.norm_sqr()).collect();
    let smoothed_saliency = box_blur(&saliency, h, w, 5);
    saliency.copy_from_slice(&smoothed_saliency);
    normalize_to_unit_range(&mut saliency);
    saliency
}

/// Separable row-then-column 2D FFT (or inverse, scaled) over a
/// row-major `h x w` buffer, using `rustfft` for each 1-D pass.
fn fft_2d(buffer: &mut [Complex32], h: usize, w: usize, inverse: bool) {
    let mut planner = FftPlanner::<f32>::new();
    let row_fft = if inverse { planner.plan_fft_inverse(w) } else { planner.plan_fft_forward(w) };
    for row in buffer.chunks_mut(w) {
        row_fft.process(row);
    }

    let mut column = vec![Complex32::new(0.0, 0.0); h];
    let col_fft = if inverse { planner.plan_fft_inverse(h) } else { planner.plan_fft_forward(h) };
    for col in 0..w {
        for row in 0..h {
            column[row] = buffer[row * w + col];
        }
        col_fft.process(&mut column);
        for row in 0..h {
            buffer[row * w + col] = column[row];
        }
    }

    if inverse {
        let scale = 1.0 / (h * w) as f32;
        for value in buffer.iter_mut() {
            *value *= scale;
        }
    }
}

fn box_blur(values: &[f32], h: usize, w: usize, radius: usize) -> Vec<f32> {
    let mut out = vec![0f32; values.len()];
    let r = radius as isize;
    for row in 0..h {
        for col in 0..w {
            let mut sum = 0f32;
            let mut count = 0f32;
            for dr in -r..=r {
                for dc in -r..=r {
                    let rr = row as isize + dr;
                    let cc = col as isize + dc;
                    if rr >= 0 && rr < h as isize && cc >= 0 && cc < w as isize {
                        sum += values[rr as usize * w + cc as usize];
                        count += 1.0;
                    }
                }
            }
            out[row * w + col] = sum / count;
        }
    }
    out
}

/// Coarse edge density: fraction of pixels in each `block x block` window
/// whose gradient magnitude exceeds a fixed threshold.
fn edge_density(gradient_map: &[f32], block: usize) -> Vec<f32> {
    // `gradient_map` is already normalized to [0, 1]; a pixel counts as an
    // edge once it clears the top third of that range.
    const EDGE_THRESHOLD: f32 = 0.33;

    let len = gradient_map.len();
    let side = (len as f32).sqrt() as usize;
    let mut out = vec![0f32; len];

    for row in 0..side {
        for col in 0..side {
            let block_row = row / block * block;
            let block_col = col / block * block;
            let mut edge_count = 0f32;
            let mut total = 0f32;
            for r in block_row..(block_row + block).min(side) {
                for c in block_col..(block_col + block).min(side) {
                    total += 1.0;
                    if gradient_map[r * side + c] > EDGE_THRESHOLD {
                        edge_count += 1.0;
                    }
                }
            }
            out[row * side + col] = edge_count / total;
        }
    }
    out
}

fn normalize_to_unit_range(values: &mut [f32]) {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if range <= f32::EPSILON {
        values.fill(0.5);
        return;
    }
    for value in values.iter_mut() {
        *value = (*value - min) / range;
    }
}
