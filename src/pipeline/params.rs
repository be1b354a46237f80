//! Request parameters: a key to multi-value mapping.

use std::collections::HashMap;

/// Parameters gathered from the matched path and submitted form values.
///
/// Values accumulate: merging appends under the same key and never
/// overwrites, so path-derived values keep their position ahead of
/// form-submitted ones.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Params {
    values: HashMap<String, Vec<String>>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// First value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values for a key, in insertion order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map_or(&[], Vec::as_slice)
    }

    /// Append every value of `other`, preserving existing values.
    pub fn merge(&mut self, other: Params) {
        for (key, values) in other.values {
            self.values.entry(key).or_default().extend(values);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}
