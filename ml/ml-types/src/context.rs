//! Encoding context.

use serde::{Deserialize, Serialize};

/// The mode an encoding runs in.
///
/// Only [`Context::Training`] turns on stochastic augmentation. Validation
/// and inference encode deterministically.
///
/// # Example
///
/// ```
/// use ml_types::Context;
///
/// let ctx = Context::default();
/// assert_eq!(ctx, Context::Inference);
/// assert!(!ctx.augments());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Context {
    /// Training: augmentations active.
    Training,

    /// Validation: deterministic encoding, targets available.
    Validation,

    /// Inference: deterministic encoding, no targets.
    #[default]
    Inference,
}

impl Context {
    /// Returns `true` if stochastic augmentation applies in this context.
    #[must_use]
    pub const fn augments(&self) -> bool {
        matches!(self, Self::Training)
    }

    /// Returns the context name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Validation => "validation",
            Self::Inference => "inference",
        }
    }

    /// All contexts, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Training, Self::Validation, Self::Inference];
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_augments() {
        assert!(Context::Training.augments());
        assert!(!Context::Validation.augments());
        assert!(!Context::Inference.augments());
    }

    #[test]
    fn context_display() {
        assert_eq!(format!("{}", Context::Training), "training");
        assert_eq!(format!("{}", Context::Validation), "validation");
    }

    #[test]
    fn context_serialization() {
        let ctx = Context::Validation;
        let json = serde_json::to_string(&ctx);
        assert!(json.is_ok());

        let parsed: std::result::Result<Context, _> =
            serde_json::from_str(&json.unwrap_or_default());
        assert_eq!(parsed.unwrap_or_default(), ctx);
    }
}
