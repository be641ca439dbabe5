//! Extractor orchestration: image -> payload via blind length search
//! (§4.9, the hardest part of the core).
//!
//! The embedder stores no length prefix in the image, so the extractor
//! must recover the encoded size `S` from the image alone, by trying a
//! fixed ladder of candidate sizes and letting the AEAD tag be the
//! correctness oracle. A trial's failure is always local: it is discarded
//! and the next ladder entry is tried (§7). Only `ImageUnreadable` and
//! `InvalidKey` escape as errors; absence of a valid watermark is the
//! ordinary [`ExtractOutcome::NotDetected`] value.

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::bitcodec;
use crate::config::ExtractConfig;
use crate::crypto;
use crate::dct;
use crate::ecc::ReedSolomon;
use crate::embed::DOMAIN_TAG;
use crate::error::{RastermarkError, TrialError};
use crate::image::Image;
use crate::length_ladder;
use crate::payload::{self, PayloadFields};
use crate::site_selector::{self, EmbeddingSite};

/// Outcome of an extraction attempt. `NotDetected` is a normal value, not
/// an error (§7): the only errors this module's public entry points can
/// return are `ImageUnreadable` (surfaced by [`Image::new`] before this
/// module ever runs) and `InvalidKey` (wrong key length).
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractOutcome {
    Detected { fields: PayloadFields, confidence: f64 },
    NotDetected,
}

pub struct Extractor;

impl Extractor {
    /// Fails only with `InvalidKey` (wrong key length, checked once up
    /// front rather than per ladder trial) or the image-shape errors
    /// [`extract_checked`] already surfaces; absence of a watermark is the
    /// ordinary [`ExtractOutcome::NotDetected`] value, not an error (§7).
    pub fn extract(image: &Image, key: &[u8], cfg: &ExtractConfig) -> Result<ExtractOutcome, RastermarkError> {
        crypto::validate_key(key).map_err(|e| RastermarkError::InvalidKey(e.to_string()))?;

        let usable_height = image.usable_height();
        let usable_width = image.usable_width();
        let capacity = site_selector::capacity(usable_height, usable_width);

        for total_bytes in length_ladder::sizes(cfg.max_payload_bytes) {
            let n_bits = 8 * total_bytes;
            if n_bits > capacity {
                trace!(total_bytes, capacity, "ladder entry skipped: exceeds capacity");
                continue;
            }

            let Some(sites) = site_selector::select_sites(usable_height, usable_width, n_bits) else {
                continue;
            };

            match try_decode(image, &sites, total_bytes, key, cfg.ecc_symbols) {
                Ok((fields, confidence)) => {
                    debug!(total_bytes, confidence, "watermark detected");
                    return Ok(ExtractOutcome::Detected { fields, confidence });
                }
                Err(_) => continue,
            }
        }

        debug!("ladder exhausted, no watermark detected");
        Ok(ExtractOutcome::NotDetected)
    }
}

/// One trial at a fixed candidate total size `S` (§4.9 step 2). Returns
/// the recovered fields and a confidence score, or a [`TrialError`] that
/// the caller discards before moving to the next ladder entry.
fn try_decode(
    image: &Image,
    sites: &[EmbeddingSite],
    total_bytes: usize,
    key: &[u8],
    ecc_symbols: usize,
) -> Result<(PayloadFields, f64), TrialError> {
    let y = image.y_channel();
    let bits = extract_bits_from_y(&y, sites);
    let bytes = bitcodec::pack_bits(&bits);

    let tag_start = total_bytes - crypto::TAG_LEN;
    let ciphertext = &bytes[..tag_start];
    let mut tag = [0u8; crypto::TAG_LEN];
    tag.copy_from_slice(&bytes[tag_start..total_bytes]);

    let rs_encoded = crypto::decrypt(key, DOMAIN_TAG, ciphertext, &tag)
        .map_err(|_| TrialError::CryptoAuthFail)?;

    let rs = ReedSolomon::new(ecc_symbols);
    let (wrapped, errors_corrected) = rs.decode(&rs_encoded).map_err(|_| TrialError::EccUnrecoverable)?;

    // Strip the embedder's 2-byte length prefix + alignment padding
    // (`build_encoded_bits` in `embed.rs`) to recover the exact JSON bytes.
    if wrapped.len() < 2 {
        return Err(TrialError::PayloadInvalid("wrapped payload shorter than length prefix".into()));
    }
    let json_len = u16::from_be_bytes([wrapped[0], wrapped[1]]) as usize;
    let json_bytes = wrapped
        .get(2..2 + json_len)
        .ok_or_else(|| TrialError::PayloadInvalid("length prefix exceeds decoded payload".into()))?;

    let fields = payload::parse(json_bytes).map_err(|e| TrialError::PayloadInvalid(e.to_string()))?;

    let confidence = confidence_from_errors(errors_corrected, ecc_symbols);
    Ok((fields, confidence))
}

/// Confidence derived from ECC errors corrected (§4.9 step 2: "confidence
/// derived from (ECC errors corrected, PSNR-equivalent signal)"). The
/// extractor has no access to the original image, so there is no PSNR
/// signal available here; confidence is based solely on how much of the
/// parity budget the decode consumed.
fn confidence_from_errors(errors_corrected: usize, ecc_symbols: usize) -> f64 {
    let max_correctable = ecc_symbols / 2;
    if max_correctable == 0 {
        return 1.0;
    }
    (1.0 - errors_corrected as f64 / max_correctable as f64).clamp(0.0, 1.0)
}

/// Reads `bits` back out of the Y channel's DCT coefficients at `sites`,
/// grouping by block exactly as the embedder does (§4.7 "extract one
/// bit").
fn extract_bits_from_y(y: &crate::image::YChannel, sites: &[EmbeddingSite]) -> Vec<bool> {
    let mut bits = vec![false; sites.len()];

    let mut by_block: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for (i, site) in sites.iter().enumerate() {
        by_block.entry((site.block_y, site.block_x)).or_default().push(i);
    }

    for ((block_y, block_x), indices) in by_block {
        let block = y.read_block(block_y, block_x);
        let coeffs = dct::forward(&block);
        for &i in &indices {
            let site = sites[i];
            bits[i] = dct::extract_bit(&coeffs, (site.coef_y, site.coef_x));
        }
    }

    bits
}

/// Fatal entry point: validates the image shape before any extraction
/// attempt, so this module's API only errors on `ImageUnreadable` or
/// `InvalidKey` (§7).
pub fn extract_checked(
    height: usize,
    width: usize,
    rgb_bytes: Vec<u8>,
    key: &[u8],
    cfg: &ExtractConfig,
) -> Result<ExtractOutcome, RastermarkError> {
    let image = Image::new(height, width, rgb_bytes)?;
    if image.height() < crate::image::MIN_DIMENSION || image.width() < crate::image::MIN_DIMENSION {
        warn!("image below minimum dimension, reporting NotDetected rather than an error");
        return Ok(ExtractOutcome::NotDetected);
    }
    Extractor::extract(&image, key, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbedConfig;
    use crate::embed::Embedder;
    use crate::payload::PayloadBuilder;

    fn solid_gray(h: usize, w: usize, value: u8) -> Image {
        Image::new(h, w, vec![value; h * w * 3]).unwrap()
    }

    #[test]
    fn happy_path_round_trip() {
        let image = solid_gray(512, 512, 128);
        let fields = PayloadBuilder::new()
            .copyright("© Acme 2025")
            .ai_generated(false)
            .build();
        let key = [0u8; 32];

        let (watermarked, _) = Embedder::embed(&image, &fields, &key, &EmbedConfig::default()).unwrap();
        let outcome = Extractor::extract(&watermarked, &key, &ExtractConfig::default()).unwrap();

        match outcome {
            ExtractOutcome::Detected { fields: recovered, .. } => assert_eq!(recovered, fields),
            ExtractOutcome::NotDetected => panic!("expected watermark to be detected"),
        }
    }

    #[test]
    fn wrong_key_is_not_detected() {
        let image = solid_gray(512, 512, 128);
        let fields = PayloadBuilder::new().author("a").build();
        let key = [1u8; 32];
        let mut other_key = key;
        other_key[0] ^= 0xFF;

        let (watermarked, _) = Embedder::embed(&image, &fields, &key, &EmbedConfig::default()).unwrap();
        let outcome = Extractor::extract(&watermarked, &other_key, &ExtractConfig::default()).unwrap();
        assert_eq!(outcome, ExtractOutcome::NotDetected);
    }

    #[test]
    fn tampered_pixel_is_not_detected() {
        let image = solid_gray(512, 512, 128);
        let fields = PayloadBuilder::new().author("a").build();
        let key = [2u8; 32];

        let (watermarked, _) = Embedder::embed(&image, &fields, &key, &EmbedConfig::default()).unwrap();
        let mut tampered_bytes = watermarked.as_rgb_bytes().to_vec();
        tampered_bytes[0] ^= 0x01;
        let tampered = Image::new(watermarked.height(), watermarked.width(), tampered_bytes).unwrap();

        let outcome = Extractor::extract(&tampered, &key, &ExtractConfig::default()).unwrap();
        assert_eq!(outcome, ExtractOutcome::NotDetected);
    }

    #[test]
    fn length_ladder_matches_documented_shape() {
        let ladder = length_ladder::sizes(2000);
        assert_eq!(*ladder.first().unwrap(), 100);
        assert_eq!(*ladder.last().unwrap(), 2000);
        assert!(ladder.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn embedder_always_lands_on_a_ladder_entry() {
        // Regression test for the alignment padding in `embed.rs`: without
        // it, the embedded size almost never coincides with a ladder tick
        // and round-trip extraction silently fails.
        let image = solid_gray(512, 512, 128);
        for copyright in ["", "a", "short notice", &"x".repeat(97)] {
            let fields = PayloadBuilder::new().copyright(copyright).build();
            let key = [7u8; 32];
            let (watermarked, _) =
                Embedder::embed(&image, &fields, &key, &EmbedConfig::default()).unwrap();
            let outcome = Extractor::extract(&watermarked, &key, &ExtractConfig::default()).unwrap();
            assert!(matches!(outcome, ExtractOutcome::Detected { .. }), "failed for {copyright:?}");
        }
    }

    #[test]
    fn rejects_wrong_length_key() {
        let image = solid_gray(512, 512, 128);
        let key = [0u8; 32];
        let fields = PayloadBuilder::new().author("a").build();
        let (watermarked, _) = Embedder::embed(&image, &fields, &key, &EmbedConfig::default()).unwrap();

        let short_key = [0u8; 16];
        let result = Extractor::extract(&watermarked, &short_key, &ExtractConfig::default());
        assert!(matches!(result, Err(RastermarkError::InvalidKey(_))));
    }
}
