//! Scenario categories and the opt-out selection a concrete suite declares.
//!
//! A suite that names no categories tests everything. Authors of a new
//! document-type suite opt out by passing the subset they want; an empty
//! subset is indistinguishable from "all".

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A closed set of scenario categories.
pub trait Category: Copy + Ord + fmt::Debug + Send + Sync + 'static {
    /// Every category, in declaration order.
    const ALL: &'static [Self];

    fn name(self) -> &'static str;
}

/// Categories of the repository-level suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CrudCategory {
    Index,
    Save,
    SaveBulk,
    FindAll,
    FindAllById,
    FindAllPageable,
    FindAllSorted,
    FindOne,
    Exist,
    Count,
    DeleteAll,
    DeleteAllById,
    Delete,
    DeleteById,
}

impl Category for CrudCategory {
    const ALL: &'static [Self] = &[
        CrudCategory::Index,
        CrudCategory::Save,
        CrudCategory::SaveBulk,
        CrudCategory::FindAll,
        CrudCategory::FindAllById,
        CrudCategory::FindAllPageable,
        CrudCategory::FindAllSorted,
        CrudCategory::FindOne,
        CrudCategory::Exist,
        CrudCategory::Count,
        CrudCategory::DeleteAll,
        CrudCategory::DeleteAllById,
        CrudCategory::Delete,
        CrudCategory::DeleteById,
    ];

    fn name(self) -> &'static str {
        match self {
            CrudCategory::Index => "index",
            CrudCategory::Save => "save",
            CrudCategory::SaveBulk => "save_bulk",
            CrudCategory::FindAll => "find_all",
            CrudCategory::FindAllById => "find_all_by_id",
            CrudCategory::FindAllPageable => "find_all_pageable",
            CrudCategory::FindAllSorted => "find_all_sorted",
            CrudCategory::FindOne => "find_one",
            CrudCategory::Exist => "exist",
            CrudCategory::Count => "count",
            CrudCategory::DeleteAll => "delete_all",
            CrudCategory::DeleteAllById => "delete_all_by_id",
            CrudCategory::Delete => "delete",
            CrudCategory::DeleteById => "delete_by_id",
        }
    }
}

/// Categories of the HTTP resource suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RestCategory {
    Create,
    Update,
    Patch,
    Delete,
    FindOne,
    FindAll,
    FindAllPageable,
    DeleteAll,
    DeleteById,
}

impl Category for RestCategory {
    const ALL: &'static [Self] = &[
        RestCategory::Create,
        RestCategory::Update,
        RestCategory::Patch,
        RestCategory::Delete,
        RestCategory::FindOne,
        RestCategory::FindAll,
        RestCategory::FindAllPageable,
        RestCategory::DeleteAll,
        RestCategory::DeleteById,
    ];

    fn name(self) -> &'static str {
        match self {
            RestCategory::Create => "create",
            RestCategory::Update => "update",
            RestCategory::Patch => "patch",
            RestCategory::Delete => "delete",
            RestCategory::FindOne => "find_one",
            RestCategory::FindAll => "find_all",
            RestCategory::FindAllPageable => "find_all_pageable",
            RestCategory::DeleteAll => "delete_all",
            RestCategory::DeleteById => "delete_by_id",
        }
    }
}

/// The categories a concrete suite opted into. `None` means all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<C: Category> {
    only: Option<BTreeSet<C>>,
}

impl<C: Category> Selection<C> {
    pub fn all() -> Self {
        Self { only: None }
    }

    /// Select exactly `categories`. An empty list selects everything.
    pub fn only(categories: impl IntoIterator<Item = C>) -> Self {
        let set: BTreeSet<C> = categories.into_iter().collect();
        Self {
            only: if set.is_empty() { None } else { Some(set) },
        }
    }

    pub fn is_selected(&self, scenario: Option<C>) -> bool {
        is_selected(scenario, self)
    }

    /// The selected categories in declaration order.
    pub fn categories(&self) -> Vec<C> {
        C::ALL
            .iter()
            .copied()
            .filter(|c| self.is_selected(Some(*c)))
            .collect()
    }
}

impl<C: Category> Default for Selection<C> {
    fn default() -> Self {
        Self::all()
    }
}

impl<C: Category> From<Option<Vec<C>>> for Selection<C> {
    fn from(categories: Option<Vec<C>>) -> Self {
        match categories {
            Some(categories) => Self::only(categories),
            None => Self::all(),
        }
    }
}

/// Whether a scenario runs under a suite's selection.
///
/// Uncategorized scenarios always run; a categorized one runs iff its
/// category is selected.
pub fn is_selected<C: Category>(scenario: Option<C>, suite: &Selection<C>) -> bool {
    match (scenario, &suite.only) {
        (None, _) | (Some(_), None) => true,
        (Some(category), Some(set)) => set.contains(&category),
    }
}
