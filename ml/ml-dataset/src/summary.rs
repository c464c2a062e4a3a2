//! Label distribution summary.

use serde::{Deserialize, Serialize};

/// Per-label counts for a dataset.
///
/// Labels are kept in first-appearance order. Useful for spotting class
/// imbalance before training.
///
/// # Example
///
/// ```
/// use ml_dataset::LabelSummary;
///
/// let summary = LabelSummary::from_labels(["cat", "dog", "cat", "cat"]);
/// assert_eq!(summary.total_samples, 4);
/// assert_eq!(summary.count(&"cat"), 3);
/// assert_eq!(summary.majority(), Some(&"cat"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSummary<L> {
    /// Total number of samples.
    pub total_samples: usize,

    /// `(label, count)` pairs in first-appearance order.
    pub counts: Vec<(L, usize)>,
}

impl<L> Default for LabelSummary<L> {
    fn default() -> Self {
        Self {
            total_samples: 0,
            counts: Vec::new(),
        }
    }
}

impl<L: PartialEq> LabelSummary<L> {
    /// Counts labels.
    #[must_use]
    pub fn from_labels(labels: impl IntoIterator<Item = L>) -> Self {
        let mut summary = Self::default();
        for label in labels {
            summary.total_samples += 1;
            match summary.counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, count)) => *count += 1,
                None => summary.counts.push((label, 1)),
            }
        }
        summary
    }

    /// Count for `label`, zero if absent.
    #[must_use]
    pub fn count(&self, label: &L) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |(_, count)| *count)
    }

    /// Fraction of samples carrying `label`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self, label: &L) -> f32 {
        if self.total_samples == 0 {
            return 0.0;
        }
        self.count(label) as f32 / self.total_samples as f32
    }
}

impl<L> LabelSummary<L> {
    /// Returns true if the dataset is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_samples == 0
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn num_labels(&self) -> usize {
        self.counts.len()
    }

    /// Most frequent label; the earliest one on ties.
    #[must_use]
    pub fn majority(&self) -> Option<&L> {
        let mut best: Option<&(L, usize)> = None;
        for entry in &self.counts {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(label, _)| label)
    }

    /// Smallest count divided by largest count, in `[0, 1]`.
    ///
    /// 1.0 means perfectly balanced; 0.0 for an empty summary.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn balance_ratio(&self) -> f32 {
        let max = self.counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
        let min = self.counts.iter().map(|(_, c)| *c).min().unwrap_or(0);
        if max == 0 {
            0.0
        } else {
            min as f32 / max as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_empty() {
        let summary: LabelSummary<&str> = LabelSummary::from_labels([]);
        assert!(summary.is_empty());
        assert_eq!(summary.majority(), None);
        assert!(summary.balance_ratio().abs() < 1e-6);
    }

    #[test]
    fn summary_counts_in_order() {
        let summary = LabelSummary::from_labels(["dog", "cat", "dog", "bird"]);

        assert_eq!(summary.num_labels(), 3);
        assert_eq!(summary.counts[0], ("dog", 2));
        assert_eq!(summary.counts[2], ("bird", 1));
        assert_eq!(summary.count(&"fish"), 0);
        assert!((summary.fraction(&"dog") - 0.5).abs() < 1e-6);
    }

    #[test]
    fn summary_majority_tie_prefers_first() {
        let summary = LabelSummary::from_labels([2, 1, 1, 2]);
        assert_eq!(summary.majority(), Some(&2));
    }

    #[test]
    fn summary_balance_ratio() {
        let summary = LabelSummary::from_labels(["a", "a", "a", "a", "b"]);
        assert!((summary.balance_ratio() - 0.25).abs() < 1e-6);

        let balanced = LabelSummary::from_labels(["a", "b"]);
        assert!((balanced.balance_ratio() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn summary_serialization() {
        let summary = LabelSummary::from_labels([String::from("cat"), String::from("dog")]);
        let json = serde_json::to_string(&summary);
        assert!(json.is_ok());

        let parsed: std::result::Result<LabelSummary<String>, _> =
            serde_json::from_str(&json.unwrap_or_default());
        assert_eq!(parsed.ok(), Some(summary));
    }
}
