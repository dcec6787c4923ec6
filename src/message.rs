//! Version-0 message: the sole entity of the wire protocol.

use chrono::{DateTime, Utc};

use crate::error::PayloadTooLarge;
use crate::pow;

/// `["0","YYYYMMDDhhmmss","<10-char nonce>","<12 hex checksum>","<payload>"]`
///
/// Fields are `Option` because a message is built up in stages:
/// constructed empty, stamped, paid, mined, and only then
/// does every field hold a value. Stored messages are mutated only via
/// [`Message::update_pow`] — everything else is fixed once mining succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: char,
    pub timestamp_obj: Option<DateTime<Utc>>,
    pub timestamp_str: Option<String>,
    pub nonce: Option<String>,
    pub payload: Option<String>,
    pub checksum: Option<String>,
    pub initial_pow: Option<u32>,
    pub current_pow: Option<u32>,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl Message {
    pub fn new() -> Self {
        Self {
            version: '0',
            timestamp_obj: None,
            timestamp_str: None,
            nonce: None,
            payload: None,
            checksum: None,
            initial_pow: None,
            current_pow: None,
        }
    }

    /// Stamps the message with `utc_now` (defaults to the wall clock).
    /// Decreases achievable PoW significantly if called after `set_payload`.
    pub fn set_timestamp(&mut self, utc_now: Option<DateTime<Utc>>) {
        let ts = utc_now.unwrap_or_else(Utc::now);
        self.timestamp_str = Some(ts.format("%Y%m%d%H%M%S").to_string());
        self.timestamp_obj = Some(ts);
    }

    /// Fixes the payload and its checksum. Must run after `set_timestamp`.
    /// If no nonce has been mined yet, seeds it with `"aaaa...a"` so
    /// `initial_pow` is at least well-defined before mining.
    pub fn set_payload(&mut self, payload: impl Into<String>) -> Result<(), PayloadTooLarge> {
        let payload = payload.into();
        if payload.len() > pow::MAX_PAYLOAD_BYTES {
            return Err(PayloadTooLarge(payload.len()));
        }
        self.checksum = Some(pow::checksum(payload.as_bytes()));
        if self.nonce.is_none() {
            self.nonce = Some("a".repeat(pow::NONCE_BYTES));
        }
        let timestamp_str = self
            .timestamp_str
            .as_deref()
            .expect("set_timestamp must run before set_payload");
        let nonce = self.nonce.as_deref().unwrap();
        let checksum = self.checksum.as_deref().unwrap();
        self.initial_pow = Some(pow::initial_pow(timestamp_str, nonce, checksum));
        self.payload = Some(payload);
        Ok(())
    }

    /// The exact wire frame. Panics if the message hasn't been stamped and
    /// paid yet — every call site only reaches here after both have run.
    pub fn wire(&self) -> String {
        format!(
            "[\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"]",
            self.version,
            self.timestamp_str.as_deref().expect("timestamp not set"),
            self.nonce.as_deref().expect("nonce not set"),
            self.checksum.as_deref().expect("checksum not set"),
            self.payload.as_deref().expect("payload not set"),
        )
    }

    /// Refreshes `current_pow` against `utc_now`. Called after mining and
    /// again whenever a stored message is re-evaluated (see `Store::worst`).
    pub fn update_pow(&mut self, utc_now: DateTime<Utc>) {
        let frame_len = self.wire().len();
        let initial = self.initial_pow.expect("initial_pow not set");
        let timestamp = self.timestamp_obj.expect("timestamp not set");
        self.current_pow = Some(pow::current_pow(initial, frame_len, utc_now, timestamp));
    }
}
