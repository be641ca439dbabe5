//! Authenticated encryption for the payload layer (§4.3).
//!
//! Produces `(ciphertext, tag)` with `ciphertext.len() == plaintext.len()`
//! and a detached 32-byte tag, encrypt-then-MAC: raw ChaCha20 for
//! confidentiality, HMAC-SHA256 for integrity. The teacher's
//! `chacha20poly1305` bundles a 16-byte Poly1305 tag into the ciphertext,
//! which satisfies neither property, so this builds the same guarantee from
//! lower-level RustCrypto pieces (see `DESIGN.md`).
//!
//! The nonce is never transmitted: both sides derive it as
//! `SHA-256(key || domain_tag)[..12]`, so the same `(key, domain_tag)` pair
//! always produces the same keystream. Encrypting two different plaintexts
//! under the same key and domain tag would reuse that keystream; callers
//! must vary the domain tag (or the key) whenever that can happen.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const TAG_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("authentication tag did not verify")]
    TagMismatch,
    #[error("key must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

struct SubKeys {
    enc_key: [u8; KEY_LEN],
    mac_key: [u8; KEY_LEN],
}

/// Rejects a master key of the wrong length before it ever reaches
/// `Hkdf::new`, which accepts any input length and would otherwise derive
/// usable-looking subkeys from, say, an empty or truncated key.
pub(crate) fn validate_key(key: &[u8]) -> Result<(), CryptoError> {
    if key.len() != KEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    Ok(())
}

/// Splits the caller's master key into independent encryption and MAC
/// subkeys via HKDF-SHA256, so a forgery attempt against the MAC can't leak
/// information usable against the cipher.
fn derive_subkeys(master_key: &[u8]) -> SubKeys {
    let hk = Hkdf::<Sha256>::new(None, master_key);

    let mut enc_key = [0u8; KEY_LEN];
    hk.expand(b"rastermark-enc", &mut enc_key)
        .expect("32 bytes is a valid HKDF output length for SHA-256");

    let mut mac_key = [0u8; KEY_LEN];
    hk.expand(b"rastermark-mac", &mut mac_key)
        .expect("32 bytes is a valid HKDF output length for SHA-256");

    SubKeys { enc_key, mac_key }
}

/// Deterministic nonce: `SHA-256(key || domain_tag)[..12]`. No nonce is ever
/// stored alongside the ciphertext (§4.3, open question #2).
fn derive_nonce(master_key: &[u8], domain_tag: &[u8]) -> [u8; NONCE_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(master_key);
    hasher.update(domain_tag);
    let digest = hasher.finalize();

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&digest[..NONCE_LEN]);
    nonce
}

/// Encrypts `plaintext`, returning ciphertext of the same length plus a
/// detached 32-byte tag covering the ciphertext and `domain_tag`.
pub fn encrypt(
    master_key: &[u8],
    domain_tag: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN]), CryptoError> {
    validate_key(master_key)?;

    let sub = derive_subkeys(master_key);
    let nonce = derive_nonce(master_key, domain_tag);

    let mut ciphertext = plaintext.to_vec();
    let mut cipher = ChaCha20::new(&sub.enc_key.into(), &nonce.into());
    cipher.apply_keystream(&mut ciphertext);

    let tag = compute_tag(&sub.mac_key, domain_tag, &ciphertext);
    Ok((ciphertext, tag))
}

/// Verifies `tag` and decrypts `ciphertext`. Fails closed: a tag mismatch
/// never returns partial plaintext.
pub fn decrypt(
    master_key: &[u8],
    domain_tag: &[u8],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Vec<u8>, CryptoError> {
    validate_key(master_key)?;

    let sub = derive_subkeys(master_key);

    let expected_tag = compute_tag(&sub.mac_key, domain_tag, ciphertext);
    if !constant_time_eq(&expected_tag, tag) {
        return Err(CryptoError::TagMismatch);
    }

    let nonce = derive_nonce(master_key, domain_tag);
    let mut plaintext = ciphertext.to_vec();
    let mut cipher = ChaCha20::new(&sub.enc_key.into(), &nonce.into());
    cipher.apply_keystream(&mut plaintext);

    Ok(plaintext)
}

fn compute_tag(mac_key: &[u8; KEY_LEN], domain_tag: &[u8], ciphertext: &[u8]) -> [u8; TAG_LEN] {
    let mut mac = HmacSha256::new_from_slice(mac_key).expect("HMAC accepts any key length");
    mac.update(domain_tag);
    mac.update(ciphertext);
    let result = mac.finalize().into_bytes();

    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&result);
    tag
}

/// Constant-time tag comparison; a timing-variable comparison here would
/// reopen the forgery surface HMAC is meant to close.
fn constant_time_eq(a: &[u8; TAG_LEN], b: &[u8]) -> bool {
    if b.len() != TAG_LEN {
        return false;
    }
    let mut diff = 0u8;
    for i in 0..TAG_LEN {
        diff |= a[i] ^ b[i];
    }
    diff == 0
}
