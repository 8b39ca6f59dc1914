//! Test utilities: fakes for the storage and page-loading seams.
//!
//! Handwritten fakes for dependency injection in unit tests.
//! All fakes use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::router::Route;
use crate::traits::{PageFactory, Storage};

// ---------------------------------------------------------------------------
// FailingStorage
// ---------------------------------------------------------------------------

/// Storage whose writes (and optionally reads) always fail.
#[derive(Debug, Clone)]
pub struct FailingStorage {
    fail_reads: bool,
}

impl FailingStorage {
    /// Reads succeed (empty), `set`/`clear` fail.
    pub fn on_write() -> Self {
        Self { fail_reads: false }
    }

    /// Every operation fails.
    pub fn always() -> Self {
        Self { fail_reads: true }
    }
}

impl Storage for FailingStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
        if self.fail_reads {
            return Err(AppError::StorageError("storage unavailable".into()));
        }
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), AppError> {
        Err(AppError::StorageError("storage is read-only".into()))
    }

    fn clear(&self, _key: &str) -> Result<(), AppError> {
        Err(AppError::StorageError("storage is read-only".into()))
    }
}

// ---------------------------------------------------------------------------
// MockPageFactory
// ---------------------------------------------------------------------------

/// Page produced by [`MockPageFactory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPage {
    pub route: Route,
}

/// Page factory that counts how often each route is constructed.
#[derive(Clone, Default)]
pub struct MockPageFactory {
    loads: Arc<Mutex<HashMap<Route, usize>>>,
    /// Routes whose next load fails (consumed on use).
    fail_next: Arc<Mutex<Vec<Route>>>,
}

impl MockPageFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose first load of `route` returns an error.
    pub fn failing_once(route: Route) -> Self {
        let factory = Self::new();
        factory.fail_next.lock().unwrap().push(route);
        factory
    }

    /// Number of load attempts for `route`, failed ones included.
    pub fn load_count(&self, route: Route) -> usize {
        self.loads.lock().unwrap().get(&route).copied().unwrap_or(0)
    }
}

impl PageFactory for MockPageFactory {
    type Page = MockPage;

    async fn load(&self, route: Route) -> Result<MockPage, AppError> {
        *self.loads.lock().unwrap().entry(route).or_insert(0) += 1;

        let mut fail_next = self.fail_next.lock().unwrap();
        if let Some(pos) = fail_next.iter().position(|r| *r == route) {
            fail_next.remove(pos);
            return Err(AppError::Generic(format!("chunk for {route} failed to load")));
        }

        Ok(MockPage { route })
    }
}
