//! Expected-versus-actual comparison helpers shared by every scenario.

use std::fmt::Debug;

use docket_store::Document;

use crate::error::ConformanceError;

/// Expected and actual sequences produced by one scenario, compared in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPair<T> {
    pub expected: Vec<T>,
    pub actual: Vec<T>,
}

impl<T: PartialEq + Debug> ComparisonPair<T> {
    pub fn new(expected: Vec<T>, actual: Vec<T>) -> Self {
        Self { expected, actual }
    }

    /// Fail with both sequences printed unless they are element-wise equal.
    pub fn assert_equal(&self, context: &str) -> Result<(), ConformanceError> {
        if self.expected == self.actual {
            return Ok(());
        }
        let detail = if self.expected.len() != self.actual.len() {
            format!(
                "{context} (length {} vs {})",
                self.expected.len(),
                self.actual.len()
            )
        } else {
            let index = self
                .expected
                .iter()
                .zip(&self.actual)
                .position(|(e, a)| e != a)
                .unwrap_or_default();
            format!("{context} (first difference at index {index})")
        };
        Err(ConformanceError::Assertion {
            context: detail,
            expected: format!("{:?}", self.expected),
            actual: format!("{:?}", self.actual),
        })
    }
}

impl<T: Document> ComparisonPair<T> {
    /// Order both sides by identity, for results whose storage order is
    /// unspecified.
    pub fn ordered_by_identity(mut self) -> Self {
        self.expected.sort_by_key(|document| document.id());
        self.actual.sort_by_key(|document| document.id());
        self
    }
}

pub(crate) fn ensure_eq<V: PartialEq + Debug>(
    context: &str,
    expected: V,
    actual: V,
) -> Result<(), ConformanceError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConformanceError::Assertion {
            context: context.to_string(),
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_sequences_pass() {
        assert!(ComparisonPair::new(vec![1, 2, 3], vec![1, 2, 3])
            .assert_equal("numbers")
            .is_ok());
    }

    #[test]
    fn order_matters() {
        let err = ComparisonPair::new(vec![1, 2], vec![2, 1])
            .assert_equal("numbers")
            .unwrap_err();
        match err {
            ConformanceError::Assertion {
                context,
                expected,
                actual,
            } => {
                assert!(context.contains("index 0"), "{context}");
                assert_eq!(expected, "[1, 2]");
                assert_eq!(actual, "[2, 1]");
            }
            other => panic!("expected assertion failure, got {other:?}"),
        }
    }

    #[test]
    fn length_mismatch_is_reported() {
        let err = ComparisonPair::new(vec![1], vec![])
            .assert_equal("numbers")
            .unwrap_err();
        assert!(err.to_string().contains("length 1 vs 0"), "{err}");
    }

    #[test]
    fn ensure_eq_formats_both_sides() {
        let err = ensure_eq("count", 3u64, 4u64).unwrap_err();
        assert_eq!(err.to_string(), "count: expected 3, got 4");
    }
}
