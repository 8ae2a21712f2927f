//! Bounded rolling conversation window for the annotation stage.

use std::collections::VecDeque;

use chat_client::Message;

/// The fixed preamble plus the last N (user, assistant) exchanges.
///
/// Invariant: entry length (preamble + exchanges) never exceeds N+1.
pub struct RollingContext {
    preamble: Message,
    exchanges: VecDeque<(String, String)>,
    max_exchanges: usize,
}

impl RollingContext {
    pub fn new(preamble: impl Into<String>, max_exchanges: usize) -> Self {
        Self {
            preamble: Message::system(preamble),
            exchanges: VecDeque::new(),
            max_exchanges,
        }
    }

    /// The full message list for one generation call: preamble, retained
    /// exchanges in order, then the new user turn.
    pub fn messages_with(&self, user_turn: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2 * self.exchanges.len() + 2);
        messages.push(self.preamble.clone());
        for (user, assistant) in &self.exchanges {
            messages.push(Message::user(user.clone()));
            messages.push(Message::assistant(assistant.clone()));
        }
        messages.push(Message::user(user_turn.to_string()));
        messages
    }

    /// Record a completed exchange, evicting the oldest past the bound.
    pub fn record(&mut self, user_turn: String, assistant_turn: String) {
        self.exchanges.push_back((user_turn, assistant_turn));
        while self.exchanges.len() > self.max_exchanges {
            self.exchanges.pop_front();
        }
    }

    /// Entry count: the preamble plus one entry per retained exchange.
    pub fn len(&self) -> usize {
        1 + self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the preamble is always present
    }
}
