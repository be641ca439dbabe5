//! Mandatory-embedding policy layer (§9).
//!
//! The core [`embed::Embedder`] is a library function: it returns a
//! `Result` and lets the caller decide what to do with a failure. Some
//! integrations — an image-generation pipeline that is contractually
//! required to never emit unwatermarked output — need the stronger
//! guarantee that there is no code path returning an image without a
//! watermark attached. This module is exactly that guarantee and nothing
//! else: it adds no codec logic of its own, it just refuses to let an
//! `embed()` failure become a silent pass-through.

use tracing::{error, info};

use crate::config::EmbedConfig;
use crate::embed::{EmbedInfo, Embedder};
use crate::error::RastermarkError;
use crate::image::Image;
use crate::payload::PayloadFields;

/// Embeds `fields` into `image`, or fails loudly. There is no fallback
/// that returns the original, unwatermarked image: a caller that cannot
/// tolerate an `Err` here must not call this function speculatively on
/// content it intends to ship regardless of the outcome.
pub fn embed_or_fail(
    image: &Image,
    fields: &PayloadFields,
    key: &[u8],
    cfg: &EmbedConfig,
) -> Result<(Image, EmbedInfo), RastermarkError> {
    match Embedder::embed(image, fields, key, cfg) {
        Ok((watermarked, info)) => {
            info!(psnr_db = info.psnr_db, bits = info.bits_embedded, "mandatory watermark embedded");
            Ok((watermarked, info))
        }
        Err(e) => {
            error!(error = %e, "mandatory watermark embedding failed, refusing to emit image");
            Err(e)
        }
    }
}
