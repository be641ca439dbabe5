//! rastermark - Frequency-Domain Image Watermarking Library
//!
//! This library embeds encrypted, error-corrected provenance metadata into
//! the DCT mid-frequency coefficients of an image's luma channel, in a way
//! that survives moderate JPEG recompression and resizing, and recovers it
//! without needing to know the embedded payload's length up front.
//!
//! The pipeline, end to end:
//!
//! 1. [`payload`] builds a canonical, compact JSON document from a typed
//!    field set plus arbitrary `custom_*` extensions.
//! 2. [`ecc`] protects that document with Reed-Solomon parity.
//! 3. [`crypto`] seals the result with an encrypt-then-MAC AEAD construction.
//! 4. [`site_selector`] and [`dct`] choose where in the image's frequency
//!    domain each bit lives, and [`embed`] writes them in, optionally
//!    scaling per-site strength by [`saliency`].
//! 5. [`extract`] reverses the process, trying a bounded ladder of
//!    candidate sizes ([`length_ladder`]) since no length is ever stored in
//!    the image itself.
//!
//! [`policy`] wraps [`embed::Embedder::embed`] for callers (e.g. a content
//! pipeline) that must never emit an image without a watermark attached.
//! [`config`] collects the tunable parameters of the above as two small,
//! `Default`-able structs with named presets.

pub mod bitcodec;
pub mod config;
pub mod crypto;
pub mod dct;
pub mod ecc;
pub mod embed;
pub mod error;
pub mod extract;
pub mod image;
pub mod length_ladder;
pub mod payload;
pub mod policy;
pub mod saliency;
pub mod site_selector;

pub use config::{EmbedConfig, ExtractConfig};
pub use embed::{EmbedInfo, Embedder};
pub use error::RastermarkError;
pub use extract::{ExtractOutcome, Extractor};
pub use image::Image;
pub use payload::{PayloadBuilder, PayloadFields};
pub use policy::embed_or_fail;
