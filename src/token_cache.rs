//! Bounded cache of highlighted lines keyed by (content, language).
//!
//! Eviction is strict FIFO by insertion order: a hit does not move the entry,
//! so the oldest inserted line is always the next to go regardless of how
//! often it is read.

use crate::models::TokenSpan;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Capacity used when nothing else is configured
pub const DEFAULT_CAPACITY: usize = 500;

/// Insertion-order record of an entry
#[derive(Debug)]
struct CacheKey {
    language: String,
    content: String,
}

/// Entries are grouped by language; lookups borrow both halves of the key.
pub struct TokenCache {
    capacity: usize,
    entries: HashMap<String, HashMap<String, Arc<[TokenSpan]>>>,
    order: VecDeque<CacheKey>,
}

impl TokenCache {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        TokenCache {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Exact-match lookup. Never reorders entries.
    pub fn get(&self, content: &str, language: &str) -> Option<Arc<[TokenSpan]>> {
        self.entries.get(language)?.get(content).cloned()
    }

    /// Insert tokens for a line.
    ///
    /// Replacing an existing key keeps its original insertion position. A new
    /// key evicts the oldest entry once the cache is full.
    pub fn put(&mut self, content: &str, language: &str, tokens: Arc<[TokenSpan]>) {
        if let Some(existing) = self
            .entries
            .get_mut(language)
            .and_then(|by_content| by_content.get_mut(content))
        {
            *existing = tokens;
            return;
        }

        while self.order.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.remove(&oldest);
        }

        self.order.push_back(CacheKey {
            language: language.to_string(),
            content: content.to_string(),
        });
        self.entries
            .entry(language.to_string())
            .or_default()
            .insert(content.to_string(), tokens);
    }

    fn remove(&mut self, key: &CacheKey) {
        if let Some(by_content) = self.entries.get_mut(&key.language) {
            by_content.remove(&key.content);
            if by_content.is_empty() {
                self.entries.remove(&key.language);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Every entry has exactly one slot in the insertion order.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
