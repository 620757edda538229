use std::fmt;

use crate::error::ConformanceError;

/// Outcome of a single scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
    /// The scenario's category was not selected by the suite.
    Skipped,
}

/// Result of a single conformance scenario.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Scenario category (e.g. "save", "find_all_pageable"), or
    /// "uncategorized".
    pub category: String,
    /// Scenario name (e.g. "save_new_document_increments_count").
    pub name: String,
    pub outcome: Outcome,
}

impl TestResult {
    pub(crate) fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            outcome: Outcome::Passed,
        }
    }

    pub(crate) fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            outcome: Outcome::Failed(msg),
        }
    }

    pub(crate) fn skipped(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            outcome: Outcome::Skipped,
        }
    }

    pub(crate) fn from_result(
        category: &str,
        name: &str,
        result: Result<(), ConformanceError>,
    ) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(err) => Self::fail(category, name, err.to_string()),
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Aggregated report from a suite run.
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl ConformanceReport {
    pub fn from_results(results: Vec<TestResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        let failed = results.iter().filter(|r| r.failed()).count();
        let total = results.len();
        ConformanceReport {
            results,
            passed,
            failed,
            skipped: total - passed - failed,
            total,
        }
    }

    pub fn merge(mut self, other: ConformanceReport) -> Self {
        self.results.extend(other.results);
        Self::from_results(self.results)
    }

    /// Look up a scenario result by name.
    pub fn result(&self, name: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// # Panics
    ///
    /// Panics with the rendered report if any scenario failed.
    pub fn assert_conformant(&self) {
        assert!(self.failed == 0, "{self}");
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed, {} skipped)",
            self.passed, self.total, self.failed, self.skipped
        )?;
        for r in &self.results {
            if let Outcome::Failed(msg) = &r.outcome {
                writeln!(f, "  FAIL [{}/{}]: {}", r.category, r.name, msg)?;
            }
        }
        Ok(())
    }
}
