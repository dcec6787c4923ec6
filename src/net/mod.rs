//! Transport: the server's clock abstraction and its connection handler.

pub mod connection;

use chrono::{DateTime, Utc};

/// The server's notion of "now". `Fixed` backs `--current-time` and also
/// unlocks the `__exit__`/`__memory__` control payloads — the two are the
/// same flag in the CLI surface, so they're the same variant here.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    Live,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Live => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    pub fn is_test_mode(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}
