//! Deterministic, append-only ledger event log.
//!
//! Keepers emit events describing what they did; the balance reconciler
//! scans the `coin_spent` / `coin_received` events appended during a native
//! action to project ledger-side coin movements back into the VM balance
//! view. The log is truncatable so a rolled-back call leaves no events
//! behind.

/// Canonical event kind emitted when coins leave an account.
pub const EVENT_COIN_SPENT: &str = "coin_spent";
/// Canonical event kind emitted when coins arrive at an account.
pub const EVENT_COIN_RECEIVED: &str = "coin_received";

pub const ATTR_SPENDER: &str = "spender";
pub const ATTR_RECEIVER: &str = "receiver";
pub const ATTR_AMOUNT: &str = "amount";

/// A single key-value attribute on a ledger event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// A typed ledger event with string attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<Attribute>,
}

impl Event {
    pub fn new<K, V>(kind: &str, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind: kind.to_owned(),
            attributes: attributes
                .into_iter()
                .map(|(key, value)| Attribute {
                    key: key.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }

    /// First attribute value with the given key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }
}

/// Append-only event log for one transaction.
#[derive(Debug, Default)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every event appended after `len`, used on rollback.
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }
}
