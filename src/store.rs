//! Bounded store keyed by `initial_pow`.
//!
//! Collisions on `initial_pow` are treated as duplicates: the later writer
//! overwrites, matching a Rust `HashMap`'s own insert semantics directly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::message::Message;

#[derive(Debug, Default)]
pub struct Store {
    messages: HashMap<u32, Message>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            messages: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Sum of wire-frame lengths of every stored message.
    pub fn used_bytes(&self) -> usize {
        self.messages.values().map(|m| m.wire().len()).sum()
    }

    /// Recomputes `current_pow` of every stored message against `now`, then
    /// returns the `(initial_pow, current_pow)` pair with the largest
    /// `current_pow` — the weakest resident. Ties broken by iteration order.
    pub fn worst(&mut self, now: DateTime<Utc>) -> Option<(u32, u32)> {
        let mut worst: Option<(u32, u32)> = None;
        for (initial, message) in self.messages.iter_mut() {
            message.update_pow(now);
            let current = message.current_pow.expect("update_pow just set this");
            if worst.map(|(_, wc)| current > wc).unwrap_or(true) {
                worst = Some((*initial, current));
            }
        }
        worst
    }

    pub fn insert(&mut self, message: Message) {
        let key = message.initial_pow.expect("only validated messages are stored");
        self.messages.insert(key, message);
    }

    pub fn remove(&mut self, initial_pow: u32) -> Option<Message> {
        self.messages.remove(&initial_pow)
    }

    pub fn get(&self, initial_pow: u32) -> Option<&Message> {
        self.messages.get(&initial_pow)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }
}
