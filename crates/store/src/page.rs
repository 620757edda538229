//! Sorting and paging parameters shared by the store, the repository under
//! test and the conformance engine, so that every side computes page
//! boundaries the same way.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort on one document field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Desc,
        }
    }

    /// Order two `(key, body)` pairs by the sort field, breaking ties by key.
    ///
    /// Documents missing the field sort last in either direction.
    pub fn compare(&self, a: (&str, &Value), b: (&str, &Value)) -> Ordering {
        let left = a.1.get(&self.field).filter(|v| !v.is_null());
        let right = b.1.get(&self.field).filter(|v| !v.is_null());
        let by_field = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => return Ordering::Greater,
            (Some(_), None) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ordering = compare_values(l, r);
                match self.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            }
        };
        by_field.then_with(|| a.0.cmp(b.0))
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(l), Value::Number(r)) => {
            let l = l.as_f64().unwrap_or(f64::NAN);
            let r = r.as_f64().unwrap_or(f64::NAN);
            l.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
        (Value::String(l), Value::String(r)) => l.cmp(r),
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// A page request. `page` is zero-based; `size` is strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub sort: Option<Sort>,
}

impl PageRequest {
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(page: usize, size: usize) -> Self {
        assert!(size > 0, "page size must be positive");
        Self {
            page,
            size,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn offset(&self) -> usize {
        self.page * self.size
    }
}

/// One page of results plus the totals needed to navigate the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: usize,
    pub size: usize,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        page_count(self.total_elements, self.size)
    }
}

/// `ceil(total / size)`.
pub fn page_count(total: u64, size: usize) -> u64 {
    total.div_ceil(size as u64)
}

/// Index of the last page as asserted by navigation links:
/// `total / size - (total % size == 0 ? 1 : 0)`, in integer arithmetic.
///
/// An empty collection yields `-1`, so no `next` link is ever expected.
pub fn last_page_index(total: u64, size: usize) -> i64 {
    let total = total as i64;
    let size = size as i64;
    total / size - if total % size == 0 { 1 } else { 0 }
}
