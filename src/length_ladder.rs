//! The blind length-search ladder (§4.9 step 1), and the embedder-side
//! alignment that makes it usable.
//!
//! The extractor has no out-of-band length metadata, so it must guess the
//! total embedded size `S` (ciphertext plus the 32-byte tag) from a fixed
//! step schedule: finer near small sizes, coarser further out. The spec is
//! explicit that "the step schedule must match between embedder and
//! extractor; it is part of the format contract" — which only makes sense
//! if the embedder also lands on a ladder entry. `Embedder` (in
//! `embed.rs`) pads the pre-ECC plaintext with a handful of extra zero
//! bytes, protected by the same Reed-Solomon parity as the real payload,
//! until the resulting `S` falls on this ladder.
//!
//! This is not a length channel: the extractor never reads `S` out of the
//! image, it still tries every ladder entry and treats a successful AEAD
//! tag check as the only signal that it guessed right. The padding just
//! controls which entry the embedder happens to aim for.

/// Upper bound on `S` used by the embedder to choose its padding target,
/// matching [`crate::config::ExtractConfig`]'s default `max_payload_bytes`.
/// An embedder and extractor configured with different bounds will simply
/// fail to agree on sizes above the smaller one — same as mismatched
/// `ecc_symbols` (§6).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 2000;

/// Whether `size` lands exactly on a ladder tick within `max_payload_bytes`.
pub fn contains(size: usize, max_payload_bytes: usize) -> bool {
    if size > max_payload_bytes {
        return false;
    }
    if (100..=500).contains(&size) {
        (size - 100) % 4 == 0
    } else if (500..=1000).contains(&size) {
        (size - 500) % 20 == 0
    } else if (1000..=2000).contains(&size) {
        (size - 1000) % 50 == 0
    } else {
        false
    }
}

/// Materializes the full ladder: 100..=500 step 4, 500..=1000 step 20,
/// 1000..=2000 step 50, bounded by `max_payload_bytes`. ~150 entries at the
/// default bound (§4.9: "the ladder has ≈150 entries").
pub fn sizes(max_payload_bytes: usize) -> Vec<usize> {
    let mut sizes = Vec::with_capacity(150);

    let mut s = 100;
    while s <= 500 {
        sizes.push(s);
        s += 4;
    }
    s = 500;
    while s <= 1000 {
        sizes.push(s);
        s += 20;
    }
    s = 1000;
    while s <= 2000 {
        sizes.push(s);
        s += 50;
    }

    sizes.retain(|&s| s <= max_payload_bytes);
    sizes
}
