//! Process-wide admin session: the identity provider's signed-in user plus
//! the derived admin-membership flag.

use crate::identity::{IdentityError, IdentityProvider, Subscription};
use crate::models::db_operations::documents_db_operations::{DbError, DocumentStore};
use crate::models::document::Collection;
use crate::models::AuthUser;
use serde::Serialize;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    Authentication(#[from] IdentityError),
    #[error("Access denied. Admin privileges required.")]
    AccessDenied,
    #[error("Could not verify admin membership: {0}")]
    Lookup(#[from] DbError),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub is_admin: bool,
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState { user: None, is_admin: false, loading: true }
    }
}

/// Fails closed: a lookup error counts as "not an admin".
fn lookup_admin(documents: &dyn DocumentStore, uid: &str) -> bool {
    match documents.get(Collection::Admins, uid) {
        Ok(record) => record.is_some(),
        Err(e) => {
            log::error!("Error checking admin status for {}: {}", uid, e);
            false
        }
    }
}

fn write_state(state: &RwLock<SessionState>) -> std::sync::RwLockWriteGuard<'_, SessionState> {
    state.write().unwrap_or_else(|poisoned| {
        log::error!("RwLock for session state was poisoned! Recovering lock.");
        poisoned.into_inner()
    })
}

pub struct SessionStore {
    identity: Arc<dyn IdentityProvider>,
    documents: Arc<dyn DocumentStore>,
    state: Arc<RwLock<SessionState>>,
    subscription: Mutex<Option<Subscription>>,
}

impl SessionStore {
    pub fn new(identity: Arc<dyn IdentityProvider>, documents: Arc<dyn DocumentStore>) -> Self {
        SessionStore {
            identity,
            documents,
            state: Arc::new(RwLock::new(SessionState::default())),
            subscription: Mutex::new(None),
        }
    }

    /// Subscribes to auth-state changes. Calling it twice replaces the old subscription.
    pub fn init(&self) {
        let state = self.state.clone();
        let documents = self.documents.clone();
        let subscription = self.identity.on_auth_state_changed(Arc::new(move |user: Option<&AuthUser>| {
            let is_admin = user.map_or(false, |u| lookup_admin(documents.as_ref(), &u.uid));
            let mut current = write_state(&state);
            current.user = user.cloned();
            current.is_admin = is_admin;
            current.loading = false;
        }));

        let mut slot = self.subscription.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(subscription);
    }

    /// Drops the subscription; later auth events no longer touch this store.
    pub fn teardown(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    pub fn snapshot(&self) -> SessionState {
        match self.state.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Signs in, then requires an `admins/{uid}` record. Without one the
    /// session is signed back out before `AccessDenied` is returned.
    pub fn login(&self, email: &str, password: &str) -> Result<AuthUser, SessionError> {
        let user = self.identity.sign_in(email, password)?;

        let membership = self.documents.get(Collection::Admins, &user.uid);
        match membership {
            Ok(Some(_)) => Ok(user),
            Ok(None) => {
                log::warn!("Denied console access to non-admin {}", user.email);
                self.logout()?;
                Err(SessionError::AccessDenied)
            }
            Err(e) => {
                log::error!("Admin lookup failed during login for {}: {}", user.email, e);
                self.logout()?;
                Err(SessionError::Lookup(e))
            }
        }
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.identity.sign_out()?;
        Ok(())
    }

    /// The uid of the signed-in admin, if the session is settled and authorised.
    pub fn admin_uid(&self) -> Option<String> {
        let state = self.snapshot();
        if state.loading || !state.is_admin {
            return None;
        }
        state.user.map(|u| u.uid)
    }
}
