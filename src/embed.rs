//! Embedder orchestration: payload -> image (§4.8).

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::bitcodec;
use crate::config::EmbedConfig;
use crate::crypto;
use crate::dct;
use crate::ecc::ReedSolomon;
use crate::error::RastermarkError;
use crate::image::{psnr, Image, YChannel};
use crate::length_ladder;
use crate::payload::{self, PayloadFields};
use crate::saliency::{Classical, SaliencyBackend, SaliencyMap, Uniform};
use crate::site_selector::{self, EmbeddingSite};

/// Domain separation tag for the AEAD nonce derivation (§4.3). Part of the
/// wire format: changing it changes every ciphertext this crate has ever
/// produced for a given key.
pub const DOMAIN_TAG: &[u8] = b"rastermark.v1";

/// Adaptive strength search ladder, as a multiplier of `cfg.strength`
/// (§4.8 step 6).
const STRENGTH_LADDER: [f32; 5] = [0.7, 0.85, 1.0, 1.15, 1.3];

/// How much a site's local saliency can boost its embedding strength,
/// `alpha` in `strength * (1 + alpha * saliency)` (§4.7).
const SALIENCY_ALPHA: f32 = 0.5;

/// Result metadata from a successful embed (§4.8).
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedInfo {
    pub bits_embedded: usize,
    pub strength_used: f32,
    pub psnr_db: f64,
    pub n_sites: usize,
}

pub struct Embedder;

impl Embedder {
    /// Embeds `fields`, encrypted under `key`, into `image`. See §4.8 for
    /// the full orchestration; fails with `ImageTooSmall` or
    /// `PayloadTooLarge` before ever touching a pixel if the image can't
    /// carry the encoded payload, or `InvalidKey` if `key` is not 32 bytes.
    pub fn embed(
        image: &Image,
        fields: &PayloadFields,
        key: &[u8],
        cfg: &EmbedConfig,
    ) -> Result<(Image, EmbedInfo), RastermarkError> {
        image.check_min_size()?;

        let bits = Self::build_encoded_bits(fields, key, cfg)?;
        debug!(n_bits = bits.len(), "encoded payload bits built");

        let usable_height = image.usable_height();
        let usable_width = image.usable_width();
        let capacity = site_selector::capacity(usable_height, usable_width);
        if bits.len() > capacity {
            return Err(RastermarkError::PayloadTooLarge {
                needed_bits: bits.len(),
                available_bits: capacity,
            });
        }

        let sites = site_selector::select_sites(usable_height, usable_width, bits.len())
            .ok_or_else(|| RastermarkError::PayloadTooLarge {
                needed_bits: bits.len(),
                available_bits: capacity,
            })?;

        let saliency = if cfg.use_saliency {
            Classical.detect(image)
        } else {
            Uniform.detect(image)
        };

        let y = image.y_channel();

        let (watermarked, strength_used, psnr_db) = if cfg.adaptive_strength {
            Self::search_adaptive_strength(image, &y, &sites, &bits, &saliency, cfg)
        } else {
            let y_out = embed_bits_into_y(&y, &sites, &bits, &saliency, cfg.strength, cfg.use_saliency);
            let out = image.replace_y_channel(&y_out);
            let p = psnr(image, &out);
            (out, cfg.strength, p)
        };

        debug!(strength_used, psnr_db, "embed complete");

        Ok((
            watermarked,
            EmbedInfo {
                bits_embedded: bits.len(),
                strength_used,
                psnr_db,
                n_sites: sites.len(),
            },
        ))
    }

    /// §3's encoded-payload formula: canonical JSON -> Reed-Solomon ->
    /// AEAD -> MSB-first bit packing.
    ///
    /// Before Reed-Solomon, the JSON is wrapped in a 2-byte length prefix
    /// and padded with trailing zero bytes (protected by the same parity
    /// as the real payload) until the final embedded size lands exactly on
    /// [`length_ladder`]'s schedule. Without this, the total size would be
    /// whatever length Reed-Solomon's own block accounting happens to
    /// produce, which essentially never coincides with an extractor ladder
    /// entry, and the watermark would never be found (§4.9 step 1, format
    /// contract note).
    fn build_encoded_bits(
        fields: &PayloadFields,
        key: &[u8],
        cfg: &EmbedConfig,
    ) -> Result<Vec<bool>, RastermarkError> {
        let json = payload::build(fields);
        let mut wrapped = Vec::with_capacity(2 + json.len());
        wrapped.extend_from_slice(&(json.len() as u16).to_be_bytes());
        wrapped.extend_from_slice(&json);

        let rs = ReedSolomon::new(cfg.ecc_symbols);

        // Bounded search for a small amount of padding that lands on a
        // ladder entry. A payload already past `DEFAULT_MAX_PAYLOAD_BYTES`
        // has no ladder entry to find regardless of padding; give up and
        // let the unaligned, oversized encoding fall through to the
        // capacity check in `embed()`, which rejects it as `PayloadTooLarge`.
        const MAX_PAD_SEARCH: usize = 128;
        let mut rs_encoded = rs.encode(&wrapped);
        for pad_extra in 0..=MAX_PAD_SEARCH {
            let total = rs_encoded.len() + crypto::TAG_LEN;
            if length_ladder::contains(total, length_ladder::DEFAULT_MAX_PAYLOAD_BYTES) {
                break;
            }
            let mut candidate = wrapped.clone();
            candidate.resize(candidate.len() + pad_extra + 1, 0u8);
            rs_encoded = rs.encode(&candidate);
        }

        let (ciphertext, tag) = crypto::encrypt(key, DOMAIN_TAG, &rs_encoded)
            .map_err(|e| RastermarkError::InvalidKey(e.to_string()))?;
        let mut embedded = ciphertext;
        embedded.extend_from_slice(&tag);

        Ok(bitcodec::unpack_bits(&embedded))
    }

    /// Tries every strength in [`STRENGTH_LADDER`] times `cfg.strength`,
    /// keeping the one whose PSNR is closest to `cfg.target_psnr`. Ties are
    /// broken toward the lower strength by iterating the ladder in
    /// ascending order and only replacing the current best on a strict
    /// improvement (§4.8 step 6).
    fn search_adaptive_strength(
        original: &Image,
        y: &YChannel,
        sites: &[EmbeddingSite],
        bits: &[bool],
        saliency: &SaliencyMap,
        cfg: &EmbedConfig,
    ) -> (Image, f32, f64) {
        let mut best: Option<(Image, f32, f64)> = None;

        for &multiplier in &STRENGTH_LADDER {
            let strength = cfg.strength * multiplier;
            let y_out = embed_bits_into_y(y, sites, bits, saliency, strength, cfg.use_saliency);
            let candidate = original.replace_y_channel(&y_out);
            let candidate_psnr = psnr(original, &candidate);
            trace!(strength, candidate_psnr, "adaptive strength candidate");

            let candidate_distance = (candidate_psnr - cfg.target_psnr).abs();
            let replace = match &best {
                None => true,
                Some((_, _, best_psnr)) => candidate_distance < (best_psnr - cfg.target_psnr).abs(),
            };
            if replace {
                best = Some((candidate, strength, candidate_psnr));
            }
        }

        best.expect("STRENGTH_LADDER is non-empty")
    }
}

/// Embeds `bits` at `sites` into a copy of `y`, grouping sites by block so
/// each block is DCT-transformed exactly once regardless of how many bits
/// it carries.
fn embed_bits_into_y(
    y: &YChannel,
    sites: &[EmbeddingSite],
    bits: &[bool],
    saliency: &SaliencyMap,
    base_strength: f32,
    use_saliency: bool,
) -> YChannel {
    let mut y = y.clone();

    let mut by_block: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for (i, site) in sites.iter().enumerate() {
        by_block.entry((site.block_y, site.block_x)).or_default().push(i);
    }

    for ((block_y, block_x), indices) in by_block {
        let block = y.read_block(block_y, block_x);
        let mut coeffs = dct::forward(&block);

        let strength = if use_saliency {
            base_strength * (1.0 + SALIENCY_ALPHA * saliency.block_mean(block_y, block_x))
        } else {
            base_strength
        };

        for &i in &indices {
            let site = sites[i];
            dct::embed_bit(&mut coeffs, (site.coef_y, site.coef_x), bits[i], strength);
        }

        let pixels = dct::inverse(&coeffs);
        y.write_block(block_y, block_x, &pixels);
    }

    y
}
