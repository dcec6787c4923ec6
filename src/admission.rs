//! Admission engine: verification already happened by the time
//! [`Admission::admit`] is called — this is eviction, the watermark, and the
//! reserved control payloads.

use chrono::{DateTime, Utc};

use crate::message::Message;
use crate::pow;
use crate::store::Store;

/// What the connection handler should write back, and whether the process
/// should terminate afterwards (`__exit__` in test mode).
pub enum AdmissionOutcome {
    Reply(String),
    Exit(String),
}

pub struct Admission {
    store: Store,
    required_pow: u32,
    max_storage: usize,
    /// Mirrors the Python server's `utc_now != None`: sigils a synthetic
    /// clock is configured, which also unlocks `__exit__`/`__memory__`.
    test_mode: bool,
}

impl Admission {
    pub fn new(max_storage: usize, test_mode: bool) -> Self {
        Self {
            store: Store::new(),
            required_pow: pow::POW_MAX,
            max_storage,
            test_mode,
        }
    }

    pub fn required_pow(&self) -> u32 {
        self.required_pow
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Handles one message that has already passed [`crate::verify::verify`]
    /// against `self.required_pow()`.
    pub fn admit(&mut self, message: Message, now: DateTime<Utc>) -> AdmissionOutcome {
        match message.payload.as_deref() {
            Some("__info__") => {
                return AdmissionOutcome::Reply(format!(
                    "Required pow: 0x{:08x}\n",
                    self.required_pow
                ));
            }
            Some("__messages__") => {
                let mut reply = String::new();
                for stored in self.store.iter() {
                    reply.push_str(&stored.wire());
                    reply.push('\n');
                }
                return AdmissionOutcome::Reply(reply);
            }
            Some("__exit__") => {
                return if self.test_mode {
                    AdmissionOutcome::Exit("Exiting...\n".to_string())
                } else {
                    AdmissionOutcome::Reply("Ignoring __exit__\n".to_string())
                };
            }
            Some("__memory__") => {
                return if self.test_mode {
                    AdmissionOutcome::Reply(format!(
                        "Total memory used by messages: {}\n",
                        self.store.used_bytes()
                    ))
                } else {
                    AdmissionOutcome::Reply("Ignoring __memory__\n".to_string())
                };
            }
            _ => {}
        }

        let wire_len = message.wire().len();
        while !self.store.is_empty() && wire_len + self.store.used_bytes() > self.max_storage {
            let (worst_initial, worst_current) =
                self.store.worst(now).expect("non-empty store always has a worst message");
            let newcomer_current = message
                .current_pow
                .expect("verify() always populates current_pow on success");
            if newcomer_current > worst_current {
                return AdmissionOutcome::Reply(format!("Required pow: 0x{:08x}\n", worst_current));
            }
            self.store.remove(worst_initial);
        }

        let current = message
            .current_pow
            .expect("verify() always populates current_pow on success");
        self.store.insert(message);
        // Watermark only ever widens, even after eviction frees room (see DESIGN.md).
        self.required_pow = self.required_pow.max(current);
        AdmissionOutcome::Reply("ok\n".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner;
    use chrono::TimeZone;

    fn mined(payload: &str, ts: DateTime<Utc>, required_pow: u32) -> Message {
        let mut m = Message::new();
        m.set_timestamp(Some(ts));
        m.set_payload(payload).unwrap();
        miner::mine(&mut m, required_pow, Some(ts)).unwrap();
        m
    }

    /// Builds a message with an explicit `current_pow` instead of going
    /// through the miner, so the relative ordering `admit()` depends on in
    /// the eviction tests below doesn't hinge on real hash outputs.
    fn crafted(payload: &str, ts: DateTime<Utc>, current_pow: u32) -> Message {
        let mut m = Message::new();
        m.set_timestamp(Some(ts));
        m.set_payload(payload).unwrap();
        m.initial_pow = Some(current_pow);
        m.current_pow = Some(current_pow);
        m
    }

    #[test]
    fn admits_first_message_and_replies_ok() {
        let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let mut engine = Admission::new(128, true);
        let m = mined("first", ts, pow::POW_MAX);
        match engine.admit(m, ts) {
            AdmissionOutcome::Reply(s) => assert_eq!(s, "ok\n"),
            AdmissionOutcome::Exit(_) => panic!("unexpected exit"),
        }
        assert_eq!(engine.store().len(), 1);
    }

    #[test]
    fn watermark_only_ever_widens() {
        let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let mut engine = Admission::new(128, true);
        let before = engine.required_pow();
        let m = mined("a", ts, pow::POW_MAX);
        engine.admit(m, ts);
        assert!(engine.required_pow() >= before);
    }

    #[test]
    fn eviction_makes_room_for_a_stronger_message() {
        let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let mut engine = Admission::new(70, true);
        let weak = crafted("0123456789", ts, 5_000_000);
        engine.admit(weak, ts);
        assert_eq!(engine.store().len(), 1);

        let strong = crafted("b", ts, 10);
        match engine.admit(strong, ts) {
            AdmissionOutcome::Reply(s) => assert_eq!(s, "ok\n"),
            AdmissionOutcome::Exit(_) => panic!("unexpected exit"),
        }
        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.store().iter().next().unwrap().payload.as_deref(), Some("b"));
    }

    #[test]
    fn weaker_newcomer_is_rejected_without_evicting() {
        let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let mut engine = Admission::new(70, true);
        let resident = crafted("resident", ts, 10);
        engine.admit(resident, ts);

        let weak = crafted("0123456789012345678", ts, 5_000_000);
        match engine.admit(weak, ts) {
            AdmissionOutcome::Reply(s) => assert_eq!(s, "Required pow: 0x0000000a\n"),
            AdmissionOutcome::Exit(_) => panic!("unexpected exit"),
        }
        assert_eq!(engine.store().len(), 1);
        assert_eq!(
            engine.store().iter().next().unwrap().payload.as_deref(),
            Some("resident")
        );
    }

    #[test]
    fn info_reports_required_pow_without_storing() {
        let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let mut engine = Admission::new(128, true);
        let info = mined("__info__", ts, pow::POW_MAX);
        match engine.admit(info, ts) {
            AdmissionOutcome::Reply(s) => assert_eq!(s, format!("Required pow: 0x{:08x}\n", pow::POW_MAX)),
            AdmissionOutcome::Exit(_) => panic!("unexpected exit"),
        }
        assert!(engine.store().is_empty());
    }

    #[test]
    fn exit_is_ignored_outside_test_mode() {
        let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let mut engine = Admission::new(128, false);
        let m = mined("__exit__", ts, pow::POW_MAX);
        match engine.admit(m, ts) {
            AdmissionOutcome::Reply(s) => assert_eq!(s, "Ignoring __exit__\n"),
            AdmissionOutcome::Exit(_) => panic!("must not exit outside test mode"),
        }
    }

    #[test]
    fn exit_terminates_in_test_mode() {
        let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let mut engine = Admission::new(128, true);
        let m = mined("__exit__", ts, pow::POW_MAX);
        match engine.admit(m, ts) {
            AdmissionOutcome::Exit(s) => assert_eq!(s, "Exiting...\n"),
            AdmissionOutcome::Reply(_) => panic!("expected exit in test mode"),
        }
    }
}
