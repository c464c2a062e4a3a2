//! Ordered, unique class labels.

use std::fmt::Debug;

use crate::error::{MethodError, Result};

/// The label set of a classification method.
///
/// Order is fixed at construction and defines the one-hot index of each
/// label.
///
/// # Example
///
/// ```
/// use ml_methods::Classes;
///
/// let classes = Classes::new(vec!["cat", "dog", "bird"]).ok();
/// assert_eq!(classes.as_ref().and_then(|c| c.index_of(&"dog")), Some(1));
/// assert!(Classes::new(vec!["cat", "cat"]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classes<C> {
    labels: Vec<C>,
}

impl<C: PartialEq + Debug> Classes<C> {
    /// Creates a class set.
    ///
    /// # Errors
    ///
    /// Returns an error if `labels` is empty or contains a duplicate.
    pub fn new(labels: Vec<C>) -> Result<Self> {
        if labels.is_empty() {
            return Err(MethodError::EmptyClasses);
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(MethodError::duplicate_class(label));
            }
        }
        Ok(Self { labels })
    }

    /// Index of `label`, if present.
    #[must_use]
    pub fn index_of(&self, label: &C) -> Option<usize> {
        self.labels.iter().position(|c| c == label)
    }

    /// Index of `label`.
    ///
    /// # Errors
    ///
    /// Returns [`MethodError::UnknownClass`] if `label` is not a class.
    pub fn require(&self, label: &C) -> Result<usize> {
        self.index_of(label)
            .ok_or_else(|| MethodError::unknown_class(label))
    }

    /// Returns `true` if `label` is a class.
    #[must_use]
    pub fn contains(&self, label: &C) -> bool {
        self.labels.contains(label)
    }
}

impl<C> Classes<C> {
    /// Number of classes (never 0).
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if there are no classes; never true once constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.labels.get(index)
    }

    /// Labels in index order.
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.labels
    }

    /// Iterates labels in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.labels.iter()
    }
}

impl<'a, C> IntoIterator for &'a Classes<C> {
    type Item = &'a C;
    type IntoIter = std::slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}
