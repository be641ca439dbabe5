//! Deterministic embedding site selection (§4.6).
//!
//! The ordered site list is a pure function of `(H, W, n_bits)`: it does
//! not depend on the key, the pixel content, or the saliency map, so the
//! extractor can regenerate it from image dimensions alone. Saliency only
//! ever modulates per-site strength at embed time (§4.6, open question #1,
//! `SPEC_FULL.md` §9) — it never reaches this module.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::dct::{mid_frequency_set, MID_FREQUENCY_COUNT};

/// A specific `(block_y, block_x, coef_y, coef_x)` embedding position
/// (§3). `coef_y`/`coef_x` are the row/col of one coefficient inside the
/// named 8x8 block, drawn from the fixed mid-frequency set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmbeddingSite {
    pub block_y: usize,
    pub block_x: usize,
    pub coef_y: usize,
    pub coef_x: usize,
}

/// Fixed global seed for the site permutation. Part of the wire format:
/// changing this value changes every site order this crate has ever
/// produced, so it is never derived from the key or the image.
const SITE_PERMUTATION_SEED: [u8; 32] = *b"rastermark.site-selector.v1.seed";

/// Total number of embedding sites a `(usable_height, usable_width)` image
/// offers: `15` mid-frequency coefficients per 8x8 block.
pub fn capacity(usable_height: usize, usable_width: usize) -> usize {
    (usable_height / 8) * (usable_width / 8) * MID_FREQUENCY_COUNT
}

/// Produces the first `n_bits` entries of the deterministic site
/// permutation for a `(usable_height, usable_width)` image.
///
/// Returns `None` when the image doesn't have `n_bits` sites available;
/// callers decide what that means for them — a hard `PayloadTooLarge` at
/// embed time (§4.8), or a silent skip of one ladder entry at extract time
/// (§4.9 step 2).
pub fn select_sites(
    usable_height: usize,
    usable_width: usize,
    n_bits: usize,
) -> Option<Vec<EmbeddingSite>> {
    let blocks_tall = usable_height / 8;
    let blocks_wide = usable_width / 8;
    let total_sites = capacity(usable_height, usable_width);

    if n_bits > total_sites {
        return None;
    }

    let mid_frequency = mid_frequency_set();
    let mut all_sites = Vec::with_capacity(total_sites);
    for block_y in 0..blocks_tall {
        for block_x in 0..blocks_wide {
            for &(coef_y, coef_x) in &mid_frequency {
                all_sites.push(EmbeddingSite { block_y, block_x, coef_y, coef_x });
            }
        }
    }

    let mut rng = ChaCha20Rng::from_seed(SITE_PERMUTATION_SEED);
    all_sites.shuffle(&mut rng);

    all_sites.truncate(n_bits);
    Some(all_sites)
}
