//! Identifying attributes of remote objects.
//!
//! A sweep only needs enough of a remote object to delete it: a single id for
//! most resource types, a parent and child id for nested ones. [`Identity`]
//! types carry those fields and render them as [`Attributes`] for logging and
//! error reporting.
use crate::{self as sweep};

/// An ordered mapping of attribute names to values.
///
/// Insertion order is preserved, and setting an existing name replaces its
/// value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Attributes {
    inner: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets an attribute, replacing any previous value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.inner.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.inner.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

impl core::fmt::Display for Attributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(
            &self
                .inner
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// The identifying fields of one remote object.
///
/// This trait can be derived for structs with named fields. Each field
/// becomes an attribute named after the field, unless renamed with
/// `#[identity(rename = "...")]` or left out with `#[identity(skip)]`.
pub trait Identity: core::fmt::Debug + Send + Sync + 'static {
    fn attributes(&self) -> Attributes;
}

/// Identity of resource types addressed by a single `id`.
#[derive(Clone, Debug, PartialEq, Eq, sweep::Identity)]
pub struct Id {
    pub id: String,
}

impl Id {
    pub fn new(id: impl Into<String>) -> Self {
        Id { id: id.into() }
    }
}
