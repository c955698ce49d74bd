//! Session-scoped counters.
//!
//! Counters are registered by name up front and then bumped through the
//! returned [`CounterId`]. A `Metrics` value belongs to one session
//! ([`Explorer`](crate::explorer::Explorer)); nothing here is process-global.
use std::fmt;

/// Handle returned by [`Metrics::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterId(usize);

#[derive(Debug, Clone)]
struct Counter {
    name: &'static str,
    value: u64,
}

/// Named monotonically increasing counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    counters: Vec<Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a counter. Registering an existing name returns the id that
    /// was handed out the first time.
    pub fn register(&mut self, name: &'static str) -> CounterId {
        if let Some(pos) = self.counters.iter().position(|c| c.name == name) {
            return CounterId(pos);
        }
        self.counters.push(Counter { name, value: 0 });
        CounterId(self.counters.len() - 1)
    }

    pub fn increment(&mut self, id: CounterId) {
        self.add(id, 1);
    }

    pub fn add(&mut self, id: CounterId, n: u64) {
        if let Some(counter) = self.counters.get_mut(id.0) {
            counter.value = counter.value.saturating_add(n);
        }
    }

    /// Current value of the counter registered as `name`.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.counters
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }

    pub fn value(&self, id: CounterId) -> u64 {
        self.counters.get(id.0).map(|c| c.value).unwrap_or(0)
    }

    /// `(name, value)` pairs in registration order.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        self.counters.iter().map(|c| (c.name, c.value)).collect()
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .counters
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}
