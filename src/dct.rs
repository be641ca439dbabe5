//! The 8x8 type-II DCT and the mid-frequency bit primitives (§3, §4.6, §4.7).
//!
//! This is a fixed, small, exactly-8x8 transform with a specific orthonormal
//! JPEG-style scaling, so it is hand-rolled as a direct-form transform
//! (precomputed cosine basis) rather than routed through a generic FFT
//! planner — the same way a CRC or a block cipher is hand-rolled rather
//! than expressed through a generic polynomial-transform crate.

use std::f32::consts::PI;

/// One 8x8 block of pixel or coefficient values.
pub type Block = [[f32; 8]; 8];

/// Standard JPEG zig-zag traversal order, mapping a zig-zag index (0 = DC)
/// to its `(row, col)` position in an 8x8 block.
const ZIGZAG: [(usize, usize); 64] = [
    (0, 0), (0, 1), (1, 0), (2, 0), (1, 1), (0, 2), (0, 3), (1, 2),
    (2, 1), (3, 0), (4, 0), (3, 1), (2, 2), (1, 3), (0, 4), (0, 5),
    (1, 4), (2, 3), (3, 2), (4, 1), (5, 0), (6, 0), (5, 1), (4, 2),
    (3, 3), (2, 4), (1, 5), (0, 6), (0, 7), (1, 6), (2, 5), (3, 4),
    (4, 3), (5, 2), (6, 1), (7, 0), (7, 1), (6, 2), (5, 3), (4, 4),
    (3, 5), (2, 6), (1, 7), (2, 7), (3, 6), (4, 5), (5, 4), (6, 3),
    (7, 2), (7, 3), (6, 4), (5, 5), (4, 6), (3, 7), (4, 7), (5, 6),
    (6, 5), (7, 4), (7, 5), (6, 6), (5, 7), (6, 7), (7, 6), (7, 7),
];

/// Number of positions in the mid-frequency set `M` (§4.6, glossary).
pub const MID_FREQUENCY_COUNT: usize = 15;

/// The fixed mid-frequency coefficient set: zig-zag indices 6..20 inclusive,
/// excluding DC (index 0) and the highest AC frequencies.
pub fn mid_frequency_set() -> [(usize, usize); MID_FREQUENCY_COUNT] {
    let mut set = [(0usize, 0usize); MID_FREQUENCY_COUNT];
    set.copy_from_slice(&ZIGZAG[6..21]);
    set
}

/// `basis[k][n] = alpha(k) * cos((2n+1) * k * pi / 16)`, the orthonormal
/// 1-D DCT-II matrix for N=8. `basis * basis^T == I`, which is what makes
/// [`forward`]/[`inverse`] exact inverses of each other.
fn basis() -> [[f32; 8]; 8] {
    let mut m = [[0f32; 8]; 8];
    for (k, row) in m.iter_mut().enumerate() {
        let alpha = if k == 0 { (1.0 / 8.0f32).sqrt() } else { (2.0 / 8.0f32).sqrt() };
        for (n, cell) in row.iter_mut().enumerate() {
            *cell = alpha * (((2 * n + 1) as f32 * k as f32 * PI) / 16.0).cos();
        }
    }
    m
}

/// Forward type-II DCT of an 8x8 block: `F = basis * f * basis^T`.
pub fn forward(block: &Block) -> Block {
    let basis = basis();
    let mut out = [[0f32; 8]; 8];
    for (u, out_row) in out.iter_mut().enumerate() {
        for (v, out_cell) in out_row.iter_mut().enumerate() {
            let mut acc = 0f32;
            for (x, row) in block.iter().enumerate() {
                for (y, &value) in row.iter().enumerate() {
                    acc += basis[u][x] * value * basis[v][y];
                }
            }
            *out_cell = acc;
        }
    }
    out
}

/// Inverse type-II DCT: `f = basis^T * F * basis`, exact up to floating
/// point rounding since `basis` is orthonormal.
pub fn inverse(coeffs: &Block) -> Block {
    let basis = basis();
    let mut out = [[0f32; 8]; 8];
    for (x, out_row) in out.iter_mut().enumerate() {
        for (y, out_cell) in out_row.iter_mut().enumerate() {
            let mut acc = 0f32;
            for (u, row) in coeffs.iter().enumerate() {
                for (v, &value) in row.iter().enumerate() {
                    acc += basis[u][x] * value * basis[v][y];
                }
            }
            *out_cell = acc;
        }
    }
    out
}

/// Writes one bit into DCT coefficient `pos`: `+strength` for `1`,
/// `-strength` for `0` (§4.7).
pub fn embed_bit(coeffs: &mut Block, pos: (usize, usize), bit: bool, strength: f32) {
    coeffs[pos.0][pos.1] = if bit { strength } else { -strength };
}

/// Reads one bit from DCT coefficient `pos`: `1` iff the coefficient is
/// positive. No threshold other than sign (§4.7).
pub fn extract_bit(coeffs: &Block, pos: (usize, usize)) -> bool {
    coeffs[pos.0][pos.1] > 0.0
}
