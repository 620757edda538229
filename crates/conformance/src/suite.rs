//! The `crud_conformance_tests!` and `rest_conformance_tests!` macros.
//!
//! Each macro generates one `#[tokio::test]` per scenario category, so a
//! failing category shows up as its own failing test.
//!
//! # Usage
//!
//! ```rust,ignore
//! use docket_conformance::{crud_conformance_tests, CrudSuite};
//!
//! fn book_suite() -> CrudSuite<Book, MemoryStore> {
//!     let store = Arc::new(MemoryStore::new());
//!     CrudSuite::new(store.clone(), BookRepository::new(store), BookFixture).unwrap()
//! }
//!
//! crud_conformance_tests!(book_suite());
//! ```
//!
//! Generated tests are named `crud_conformance_<category>` and
//! `rest_conformance_<category>`; `cargo test conformance_` runs them all.
//! Categories the suite opted out of still generate a test, which passes
//! with every scenario reported as skipped.
//!
//! # Parallelism
//!
//! libtest runs tests in parallel, but the fixture loader wipes and reloads
//! whole store locations. Generated tests therefore take a process-wide lock
//! for their whole body, so two of them never touch the store at once. The
//! lock does not cover hand-written tests in the same binary; when those
//! share a real store with the generated ones, run with
//! `cargo test -- --test-threads=1`. Separate test binaries are separate
//! processes and need a store each.

use std::sync::OnceLock;

use tokio::sync::Mutex;

/// Lock serializing the generated conformance tests of one process.
#[doc(hidden)]
pub fn serial_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Generate repository conformance tests.
///
/// `$suite_expr` must evaluate to a `CrudSuite`. It is evaluated fresh inside
/// each generated test (and may `.await`), so every test gets its own suite.
#[macro_export]
macro_rules! crud_conformance_tests {
    ($suite_expr:expr) => {
        $crate::__conformance_test!(crud_conformance_baseline, $suite_expr, run_uncategorized());
        $crate::__conformance_test!(crud_conformance_index, $suite_expr, run_category($crate::CrudCategory::Index));
        $crate::__conformance_test!(crud_conformance_save, $suite_expr, run_category($crate::CrudCategory::Save));
        $crate::__conformance_test!(crud_conformance_save_bulk, $suite_expr, run_category($crate::CrudCategory::SaveBulk));
        $crate::__conformance_test!(crud_conformance_find_all, $suite_expr, run_category($crate::CrudCategory::FindAll));
        $crate::__conformance_test!(crud_conformance_find_all_by_id, $suite_expr, run_category($crate::CrudCategory::FindAllById));
        $crate::__conformance_test!(crud_conformance_find_all_pageable, $suite_expr, run_category($crate::CrudCategory::FindAllPageable));
        $crate::__conformance_test!(crud_conformance_find_all_sorted, $suite_expr, run_category($crate::CrudCategory::FindAllSorted));
        $crate::__conformance_test!(crud_conformance_find_one, $suite_expr, run_category($crate::CrudCategory::FindOne));
        $crate::__conformance_test!(crud_conformance_exist, $suite_expr, run_category($crate::CrudCategory::Exist));
        $crate::__conformance_test!(crud_conformance_count, $suite_expr, run_category($crate::CrudCategory::Count));
        $crate::__conformance_test!(crud_conformance_delete_all, $suite_expr, run_category($crate::CrudCategory::DeleteAll));
        $crate::__conformance_test!(crud_conformance_delete_all_by_id, $suite_expr, run_category($crate::CrudCategory::DeleteAllById));
        $crate::__conformance_test!(crud_conformance_delete, $suite_expr, run_category($crate::CrudCategory::Delete));
        $crate::__conformance_test!(crud_conformance_delete_by_id, $suite_expr, run_category($crate::CrudCategory::DeleteById));
    };
}

/// Generate resource conformance tests.
///
/// `$suite_expr` must evaluate to a `RestSuite`; it is evaluated fresh
/// inside each generated test.
#[macro_export]
macro_rules! rest_conformance_tests {
    ($suite_expr:expr) => {
        $crate::__conformance_test!(rest_conformance_create, $suite_expr, run_category($crate::RestCategory::Create));
        $crate::__conformance_test!(rest_conformance_update, $suite_expr, run_category($crate::RestCategory::Update));
        $crate::__conformance_test!(rest_conformance_patch, $suite_expr, run_category($crate::RestCategory::Patch));
        $crate::__conformance_test!(rest_conformance_delete, $suite_expr, run_category($crate::RestCategory::Delete));
        $crate::__conformance_test!(rest_conformance_find_one, $suite_expr, run_category($crate::RestCategory::FindOne));
        $crate::__conformance_test!(rest_conformance_find_all, $suite_expr, run_category($crate::RestCategory::FindAll));
        $crate::__conformance_test!(rest_conformance_find_all_pageable, $suite_expr, run_category($crate::RestCategory::FindAllPageable));
        $crate::__conformance_test!(rest_conformance_delete_all, $suite_expr, run_category($crate::RestCategory::DeleteAll));
        $crate::__conformance_test!(rest_conformance_delete_by_id, $suite_expr, run_category($crate::RestCategory::DeleteById));
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __conformance_test {
    ($name:ident, $suite_expr:expr, $($run:tt)+) => {
        #[tokio::test]
        async fn $name() {
            let _serial = $crate::suite::serial_lock().lock().await;
            let suite = $suite_expr;
            suite.$($run)+.await.assert_conformant();
        }
    };
}
