//! Crate-wide error taxonomy.
//!
//! Mirrors the three-way split the format layer this crate grew out of:
//! input errors (caller bug), recoverable absence (a normal value, not an
//! error — see [`crate::extract::ExtractOutcome`]), and internal invariant
//! violations that should never occur in production.

use thiserror::Error;

/// Top-level error type returned by the public `embed`/`extract` surface.
#[derive(Debug, Error)]
pub enum RastermarkError {
    /// The cover image has fewer than 64 rows/columns, or fewer 8x8 blocks
    /// than the payload requires after ECC and the AEAD tag are applied.
    #[error("image is too small to carry the requested payload: {0}")]
    ImageTooSmall(String),

    /// The payload, after Reed-Solomon and the 32-byte tag, does not fit in
    /// the available mid-frequency coefficients of the cover image.
    #[error("payload too large for this cover image: {needed_bits} bits needed, {available_bits} available")]
    PayloadTooLarge {
        needed_bits: usize,
        available_bits: usize,
    },

    /// The caller supplied image data that cannot be interpreted (wrong
    /// dimensions, truncated buffer).
    #[error("image is unreadable: {0}")]
    ImageUnreadable(String),

    /// The caller's key is the wrong length or otherwise unusable.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A codec invariant was violated. Should never happen; if it does, it
    /// is a bug in this crate, not a caller mistake.
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Local failure reasons used only inside the extractor's blind length
/// search (§4.9). These never escape as [`RastermarkError`]: every trial
/// failure is discarded and the next ladder entry is tried (§7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum TrialError {
    #[error("AEAD tag did not verify")]
    CryptoAuthFail,

    #[error("Reed-Solomon block had more errors than the parity budget can correct")]
    EccUnrecoverable,

    #[error("decoded bytes are not a valid canonical payload: {0}")]
    PayloadInvalid(String),
}
