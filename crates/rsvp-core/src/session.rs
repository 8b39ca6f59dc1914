//! Admin session state.
//!
//! [`AuthStore`] is the single owner of the admin bearer token. It keeps an
//! in-memory copy for cheap reads and mirrors every change to a [`Storage`]
//! backend, so a restarted client comes back already logged in.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::AppError;
use crate::traits::Storage;

/// Storage key holding the admin bearer token as plain text.
pub const TOKEN_KEY: &str = "admin_token";

/// Shared handle to the admin session.
///
/// Clones share the same state; hand one to the router and one to whatever
/// performs the login.
#[derive(Clone)]
pub struct AuthStore {
    token: Arc<RwLock<Option<String>>>,
    storage: Arc<dyn Storage>,
}

impl AuthStore {
    /// Create a store, restoring any token already persisted in `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Result<Self, AppError> {
        let token = storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty());

        tracing::debug!(authenticated = token.is_some(), "auth store initialised");

        Ok(Self {
            token: Arc::new(RwLock::new(token)),
            storage,
        })
    }

    /// The storage backend the token is persisted to.
    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage)
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the current token. `None` or an empty string logs out.
    ///
    /// Storage is written first while holding the write lock; if it fails the
    /// in-memory token is left untouched.
    pub fn set_token(&self, new_token: Option<&str>) -> Result<(), AppError> {
        let mut current = self.token.write().unwrap_or_else(PoisonError::into_inner);

        match new_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                self.storage.set(TOKEN_KEY, token)?;
                *current = Some(token.to_string());
                tracing::info!("Admin session started");
            }
            None => {
                self.storage.clear(TOKEN_KEY)?;
                if current.take().is_some() {
                    tracing::info!("Admin session ended");
                }
            }
        }

        Ok(())
    }

    pub fn logout(&self) -> Result<(), AppError> {
        self.set_token(None)
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
