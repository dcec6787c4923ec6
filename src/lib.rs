//! p2pim: proof-of-work rate-limited peer-to-peer instant messaging core.
//!
//! Three tightly coupled concerns, one module each: [`message`] (codec) +
//! [`pow`] (hash primitive and PoW formula), [`verify`] (admission rules),
//! [`miner`] (nonce search), and [`store`] + [`admission`] (the bounded,
//! self-evicting server state). [`net`] is the thin I/O shell around all of
//! it. Argument parsing, process startup and logging live in the two
//! binaries, not in the library.

pub mod admission;
pub mod error;
pub mod message;
pub mod miner;
pub mod net;
pub mod pow;
pub mod store;
pub mod verify;

pub use admission::{Admission, AdmissionOutcome};
pub use message::Message;
pub use net::Clock;
pub use store::Store;
