//! Verifier: the only place an untrusted frame is trusted.
//!
//! Checks run in a fixed order, returning on first failure.
//! Only on success are the output message's fields populated.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::VerifyError;
use crate::message::Message;
use crate::pow;

const PREFIX: &str = "[\"0\",\"";
const SUFFIX: &str = "\"]";

/// Verifies `s` against `required_pow` and the instant `now` (wall clock if
/// `None`). Returns a fully populated [`Message`] on success.
pub fn verify(s: &str, required_pow: u32, now: Option<DateTime<Utc>>) -> Result<Message, VerifyError> {
    let bytes = s.as_bytes();
    let now = now.unwrap_or_else(Utc::now);

    // 1. minimum length
    if bytes.len() < pow::OVERHEAD_BYTES {
        return Err(VerifyError::TooShort {
            actual: bytes.len(),
            min: pow::OVERHEAD_BYTES,
        });
    }

    // 2. framing
    if !s.starts_with(PREFIX) {
        return Err(VerifyError::WrongVersion);
    }
    if !s.ends_with(SUFFIX) {
        return Err(VerifyError::WrongPayloadFraming);
    }

    let d_start = 5 + pow::VERSION_BYTES;
    let d_end = d_start + pow::TIMESTAMP_BYTES;
    let timestamp_str = std::str::from_utf8(&bytes[d_start..d_end]).map_err(|_| VerifyError::WrongDatetime)?;

    // 3. timestamp is 14 ASCII digits
    if timestamp_str.len() != pow::TIMESTAMP_BYTES || !timestamp_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VerifyError::WrongDatetime);
    }

    // 4. not future-dated (lexicographic compare, same as the canonical format)
    let now_str = now.format("%Y%m%d%H%M%S").to_string();
    if timestamp_str > now_str.as_str() {
        return Err(VerifyError::DatetimeInFuture);
    }

    let n_start = 3 + d_end;
    let n_end = n_start + pow::NONCE_BYTES;
    let c_start = 3 + n_end;
    let c_end = c_start + pow::CHECKSUM_BYTES;
    let nonce = std::str::from_utf8(&bytes[n_start..n_end]).map_err(|_| VerifyError::WrongDatetime)?;
    let checksum = std::str::from_utf8(&bytes[c_start..c_end]).map_err(|_| VerifyError::WrongDatetime)?;

    // 5. initial PoW against the upper bound
    let initial = pow::initial_pow(timestamp_str, nonce, checksum);
    if initial > required_pow {
        return Err(VerifyError::InsufficientPow(required_pow));
    }

    // 6. timestamp parses as a real calendar instant
    let naive = NaiveDateTime::parse_from_str(timestamp_str, "%Y%m%d%H%M%S")
        .map_err(|_| VerifyError::WrongDatetime)?;
    let timestamp_obj = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);

    // 7. checksum matches the payload
    let p_start = 3 + c_end;
    let p_end = bytes.len() - 2;
    let payload = std::str::from_utf8(&bytes[p_start..p_end]).map_err(|_| VerifyError::WrongChecksum)?;
    let checksum_reference = pow::checksum(payload.as_bytes());
    if checksum != checksum_reference {
        return Err(VerifyError::WrongChecksum);
    }

    // 8. current PoW against the same upper bound
    let current = pow::current_pow(initial, bytes.len(), now, timestamp_obj);
    if current > required_pow {
        return Err(VerifyError::InsufficientPow(required_pow));
    }

    Ok(Message {
        version: '0',
        timestamp_obj: Some(timestamp_obj),
        timestamp_str: Some(timestamp_str.to_string()),
        nonce: Some(nonce.to_string()),
        payload: Some(payload.to_string()),
        checksum: Some(checksum.to_string()),
        initial_pow: Some(initial),
        current_pow: Some(current),
    })
}
