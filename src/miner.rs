//! Nonce search: enumerates the 10-character nonce space in
//! lexicographic order over `abc...xyzABC...XYZ0123456789` until one yields
//! an `initial_pow` strictly below the caller's threshold.

use chrono::{DateTime, Utc};

use crate::error::PowUnreachable;
use crate::message::Message;
use crate::pow::{self, NONCE_ALPHABET, NONCE_BYTES};

struct NonceIter {
    indices: Option<[u8; NONCE_BYTES]>,
}

impl NonceIter {
    fn new() -> Self {
        Self {
            indices: Some([0; NONCE_BYTES]),
        }
    }
}

impl Iterator for NonceIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let idx = self.indices?;
        let candidate: String = idx
            .iter()
            .map(|&i| NONCE_ALPHABET[i as usize] as char)
            .collect();

        let mut next_idx = idx;
        let mut carry = true;
        for pos in (0..NONCE_BYTES).rev() {
            if !carry {
                break;
            }
            if (next_idx[pos] as usize) + 1 < NONCE_ALPHABET.len() {
                next_idx[pos] += 1;
                carry = false;
            } else {
                next_idx[pos] = 0;
            }
        }
        self.indices = if carry { None } else { Some(next_idx) };
        Some(candidate)
    }
}

/// Mines `message` in place: sets `nonce` and `initial_pow` on the first
/// candidate with `initial_pow < required_pow`, refreshes `current_pow`
/// against `utc_now`, and returns the number of candidates tried
/// (including the winner). Fails with [`PowUnreachable`] if the whole
/// 62^10 space is exhausted.
pub fn mine(
    message: &mut Message,
    required_pow: u32,
    utc_now: Option<DateTime<Utc>>,
) -> Result<u64, PowUnreachable> {
    let timestamp_str = message
        .timestamp_str
        .clone()
        .expect("set_timestamp must run before mining");
    let checksum = message
        .checksum
        .clone()
        .expect("set_payload must run before mining");

    let mut tries: u64 = 0;
    for candidate in NonceIter::new() {
        tries += 1;
        let initial = pow::initial_pow(&timestamp_str, &candidate, &checksum);
        if initial < required_pow {
            message.nonce = Some(candidate);
            message.initial_pow = Some(initial);
            message.update_pow(utc_now.unwrap_or_else(Utc::now));
            return Ok(tries);
        }
    }
    Err(PowUnreachable)
}
