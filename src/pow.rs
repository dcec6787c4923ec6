//! Hash primitive and proof-of-work formula.
//!
//! Every constant here is part of the wire contract: changing one changes
//! what a peer on the other side of a TCP connection will accept.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

pub const FORMAT_BYTES: usize = 16; // ["","","","",""]
pub const VERSION_BYTES: usize = 1;
pub const TIMESTAMP_BYTES: usize = 14;
pub const NONCE_BYTES: usize = 10;
pub const CHECKSUM_BYTES: usize = 12;
pub const POW_BYTES: usize = 8; // hex chars

pub const OVERHEAD_BYTES: usize =
    FORMAT_BYTES + TIMESTAMP_BYTES + NONCE_BYTES + VERSION_BYTES + CHECKSUM_BYTES;
pub const MIN_MESSAGE_BYTES: usize = 8 + OVERHEAD_BYTES;
pub const MAX_PAYLOAD_BYTES: usize = 128;
pub const MAX_MESSAGE_BYTES: usize = MAX_PAYLOAD_BYTES + OVERHEAD_BYTES;
pub const MIN_MESSAGE_AGE_SECS: i64 = 10;

/// `2^(4*POW_BYTES) - 1`. Coincides with `POW_MAX` — the target and the
/// default `required_pow` watermark are the same value.
pub const POW_TARGET: u32 = 0xFFFF_FFFF;
/// `2^32 - 1`, both the clamp ceiling for `current_pow` and the default
/// `required_pow` watermark.
pub const POW_MAX: u32 = 0xFFFF_FFFF;

pub const NONCE_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// First [`CHECKSUM_BYTES`] hex characters of SHA-256(payload).
pub fn checksum(payload: &[u8]) -> String {
    sha256_hex(payload)[..CHECKSUM_BYTES].to_string()
}

/// `|T - H|` where `H` is the first 8 hex chars of
/// SHA256(timestamp_str ∥ nonce ∥ checksum) read as an integer.
pub fn initial_pow(timestamp_str: &str, nonce: &str, checksum: &str) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(timestamp_str.as_bytes());
    hasher.update(nonce.as_bytes());
    hasher.update(checksum.as_bytes());
    let digest_hex = hex::encode(hasher.finalize());
    let h = u32::from_str_radix(&digest_hex[..POW_BYTES], 16)
        .expect("first 8 hex chars of a hex digest always parse as u32");
    if h >= POW_TARGET {
        h - POW_TARGET
    } else {
        POW_TARGET - h
    }
}

fn size_factor(frame_bytes: usize) -> f64 {
    frame_bytes.max(MIN_MESSAGE_BYTES) as f64 / MIN_MESSAGE_BYTES as f64
}

fn age_factor(now: DateTime<Utc>, timestamp: DateTime<Utc>) -> f64 {
    let age_secs = (now - timestamp).num_milliseconds() as f64 / 1000.0;
    age_secs.max(MIN_MESSAGE_AGE_SECS as f64) / MIN_MESSAGE_AGE_SECS as f64
}

/// `min(2^32 - 1, floor(initial_pow * size_factor * age_factor))`.
pub fn current_pow(
    initial_pow: u32,
    frame_bytes: usize,
    now: DateTime<Utc>,
    timestamp: DateTime<Utc>,
) -> u32 {
    let scaled = initial_pow as f64 * size_factor(frame_bytes) * age_factor(now, timestamp);
    let scaled = scaled.floor();
    if scaled >= POW_MAX as f64 {
        POW_MAX
    } else {
        scaled as u32
    }
}
