//! Error kinds for the codec, verifier, miner and CLI surfaces.

use thiserror::Error;

/// Rejection produced by [`crate::verify`]. The `Display` text is the exact
/// diagnostic line (without trailing `\n`) written back on the wire; callers
/// append `"\n"` when writing a reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Message too short: {actual}<{min}")]
    TooShort { actual: usize, min: usize },
    #[error("Wrong format/version")]
    WrongVersion,
    #[error("Wrong format/payload")]
    WrongPayloadFraming,
    #[error("Wrong format/datetime")]
    WrongDatetime,
    #[error("Datetime in future")]
    DatetimeInFuture,
    #[error("Required PoW: 0x{0:08x}")]
    InsufficientPow(u32),
    #[error("Wrong checksum")]
    WrongChecksum,
}

/// Failure of the nonce search over the full 62^10 space.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("couldn't reach target proof of work")]
pub struct PowUnreachable;

/// Payload exceeds [`crate::message::MAX_PAYLOAD_BYTES`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("payload too large: {0} bytes")]
pub struct PayloadTooLarge(pub usize);

/// CLI argument validation failure, surfaced by both binaries as
/// `eprintln!` + non-zero exit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--duration must be > 0")]
    NonPositiveDuration,
    #[error("--mem must be > 0")]
    NonPositiveMem,
    #[error("couldn't parse --pow: {0}")]
    BadPow(String),
    #[error("couldn't parse --current-time: {0}")]
    BadCurrentTime(String),
    #[error("couldn't parse --message-time: {0}")]
    BadMessageTime(String),
}
