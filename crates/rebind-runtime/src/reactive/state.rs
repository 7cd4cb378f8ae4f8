#![forbid(unsafe_code)]

//! Plain state bags.
//!
//! A [`State`] is what callers hand to a binding and what
//! [`StateHandle::snapshot`](super::StateHandle::snapshot) hands back. Field
//! order is insertion order, which is also the order `watch` enumerates
//! fields in.

use indexmap::IndexMap;

use super::value::Value;

/// Ordered mapping from field name to [`Value`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    fields: IndexMap<String, Value>,
}

impl State {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or overwrite a field, returning the previous value. Overwriting
    /// keeps the field's original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for State {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl IntoIterator for State {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_preserved() {
        let state = State::new().with("price", 1000).with("qty", 10).with("label", "x");
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["price", "qty", "label"]);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut state = State::new().with("a", 1).with("b", 2);
        assert_eq!(state.insert("a", 3), Some(Value::from(1)));
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(state.get("a"), Some(&Value::from(3)));
    }

    #[test]
    fn from_iterator() {
        let state: State = [("x", 1), ("y", 2)].into_iter().collect();
        assert_eq!(state.len(), 2);
        assert!(state.contains("y"));
        assert!(!state.contains("z"));
    }

    #[test]
    fn equality_is_order_insensitive() {
        let a = State::new().with("x", 1).with("y", 2);
        let b = State::new().with("y", 2).with("x", 1);
        assert_eq!(a, b);
    }
}
