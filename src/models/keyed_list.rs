use serde::{Deserialize, Serialize};

/// Item stored in a [`KeyedList`].
///
/// The key is what the list deduplicates on: a catalog movie ID for
/// watchlist/watched entries, a user ID for community ratings.
pub trait Keyed {
    type Key: PartialEq + ?Sized;

    fn key(&self) -> &Self::Key;
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Replaced,
}

/// Ordered, owned container with explicit upsert-by-key operations.
///
/// Backs every embedded sub-collection in the document model (watchlist,
/// watched history, community ratings, chat history) so that duplicate
/// handling is decided by the caller rather than by ad hoc array splicing.
/// Serializes transparently as a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyedList<T> {
    items: Vec<T>,
}

impl<T> Default for KeyedList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> KeyedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// The `n` most recent items, oldest first.
    pub fn last_n(&self, n: usize) -> &[T] {
        let start = self.items.len().saturating_sub(n);
        &self.items[start..]
    }

    /// Appends and evicts from the front until at most `max` items remain.
    pub fn push_bounded(&mut self, item: T, max: usize) {
        self.items.push(item);
        if self.items.len() > max {
            let excess = self.items.len() - max;
            self.items.drain(..excess);
        }
    }
}

impl<T: Keyed> KeyedList<T> {
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.get(key).is_some()
    }

    /// Appends only if no item with the same key exists.
    ///
    /// Returns `false` (list unchanged) on a duplicate key.
    pub fn insert_new(&mut self, item: T) -> bool {
        if self.contains(item.key()) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Replaces the item with the same key in place, or appends.
    pub fn upsert(&mut self, item: T) -> Upserted {
        match self.items.iter().position(|existing| existing.key() == item.key()) {
            Some(index) => {
                self.items[index] = item;
                Upserted::Replaced
            }
            None => {
                self.items.push(item);
                Upserted::Inserted
            }
        }
    }

    /// Removes every item matching `key`. Idempotent: absent keys are a no-op.
    pub fn remove(&mut self, key: &T::Key) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.key() != key);
        self.items.len() != before
    }
}

impl<T> From<Vec<T>> for KeyedList<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<'a, T> IntoIterator for &'a KeyedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
