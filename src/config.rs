//! Embed/extract configuration (§6) plus named presets.
//!
//! The presets below are not named in the distilled spec but are grounded
//! on `original_source/sdk/config.py`'s `TruthMarkConfig.from_preset`,
//! reimplemented here as plain associated functions rather than a runtime
//! registry, since the preset set is small and fixed.

/// Options recognized by [`crate::embed::Embedder::embed`] (§6).
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedConfig {
    /// Base DCT modification magnitude.
    pub strength: f32,
    /// Target used by the adaptive strength search, in dB.
    pub target_psnr: f64,
    /// Enable the strength ladder (§4.8 step 6).
    pub adaptive_strength: bool,
    /// Let saliency modulate per-site strength (§4.6).
    pub use_saliency: bool,
    /// Reed-Solomon parity symbols per 255-byte block.
    pub ecc_symbols: usize,
    /// Stamp the payload with the current time if the caller didn't set
    /// `timestamp` explicitly.
    pub include_timestamp: bool,
    /// Generate a random `truthmark_id` if the caller didn't set one.
    pub include_truthmark_id: bool,
    /// Compute and attach a perceptual fingerprint of the cover image.
    pub include_fingerprint: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        EmbedConfig {
            strength: 15.0,
            target_psnr: 42.0,
            adaptive_strength: true,
            use_saliency: true,
            ecc_symbols: 32,
            include_timestamp: false,
            include_truthmark_id: false,
            include_fingerprint: false,
        }
    }
}

impl EmbedConfig {
    /// The default configuration, named explicitly for symmetry with
    /// [`Self::high_quality`] and [`Self::robust`].
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Favors invisibility over robustness: lower base strength, a higher
    /// PSNR target.
    pub fn high_quality() -> Self {
        EmbedConfig {
            strength: 10.0,
            target_psnr: 46.0,
            ..Self::default()
        }
    }

    /// Favors surviving lossy transformations over invisibility: higher
    /// base strength, a lower PSNR target, a larger ECC parity budget.
    pub fn robust() -> Self {
        EmbedConfig {
            strength: 22.0,
            target_psnr: 38.0,
            ecc_symbols: 48,
            ..Self::default()
        }
    }
}

/// Options recognized by [`crate::extract::Extractor::extract`] (§6).
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    /// Must match the value used at embed time.
    pub ecc_symbols: usize,
    /// Upper bound on `S` for the blind length-search ladder (§4.9).
    pub max_payload_bytes: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            ecc_symbols: 32,
            max_payload_bytes: 2000,
        }
    }
}

impl ExtractConfig {
    pub fn balanced() -> Self {
        Self::default()
    }

    pub fn high_quality() -> Self {
        Self::default()
    }

    pub fn robust() -> Self {
        ExtractConfig {
            ecc_symbols: 48,
            ..Self::default()
        }
    }
}
