//! Immutable ordered catalog of image references shown in rotation.

use rand::Rng;

/// The fixed ordered list of image references for one session.
///
/// References are opaque strings (relative paths in practice); the catalog
/// trusts them as-is and only deals in ordering and indexing.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<String>,
}

impl Catalog {
    #[must_use]
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }

    /// Number of references contained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    /// Normalize a signed index into `[0, len)`.
    ///
    /// Wraps via modulo; a negative remainder resolves to the LAST element,
    /// so `-1` maps to `len - 1` and so does `-7` with `len == 5`.
    /// Returns `None` when the catalog is empty.
    #[must_use]
    pub fn normalize(&self, raw: i64) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        let len = self.items.len() as i64;
        let rem = raw % len;
        let index = if rem < 0 { len - 1 } else { rem };
        Some(index as usize)
    }

    /// Pick a uniformly random starting index, or `None` when empty.
    #[must_use]
    pub fn random_start<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.items.is_empty() {
            None
        } else {
            Some(rng.random_range(0..self.items.len()))
        }
    }

    /// Borrow the internal list (read-only).
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.items
    }
}
