//! [`NoneOneOrMany<T>`]: zero, one, or several items.
//!
//! Where [`super::one_or_many::OneOrMany`] forbids the empty case, this type
//! allows it — used for things like a recommendation's `tags`, which are
//! genuinely optional.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum NoneOneOrMany<T> {
    #[default]
    None,
    One(T),
    Many(Vec<T>),
}

impl<T> NoneOneOrMany<T> {
    pub fn len(&self) -> usize {
        match self {
            NoneOneOrMany::None => 0,
            NoneOneOrMany::One(_) => 1,
            NoneOneOrMany::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            NoneOneOrMany::None => vec![],
            NoneOneOrMany::One(item) => vec![item],
            NoneOneOrMany::Many(items) => items,
        }
    }
}

impl<T> From<Option<T>> for NoneOneOrMany<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(item) => NoneOneOrMany::One(item),
            None => NoneOneOrMany::None,
        }
    }
}

impl<T> From<Vec<T>> for NoneOneOrMany<T> {
    fn from(value: Vec<T>) -> Self {
        NoneOneOrMany::Many(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_none_and_empty() {
        let value: NoneOneOrMany<i32> = NoneOneOrMany::default();
        assert!(value.is_empty());
        assert_eq!(value.len(), 0);
    }

    #[test]
    fn into_vec_flattens_every_variant() {
        assert_eq!(NoneOneOrMany::<i32>::None.into_vec(), Vec::<i32>::new());
        assert_eq!(NoneOneOrMany::One(1).into_vec(), vec![1]);
        assert_eq!(NoneOneOrMany::Many(vec![1, 2]).into_vec(), vec![1, 2]);
    }
}
