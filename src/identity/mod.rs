//! Email/password identity provider with an auth-state-changed listener registry.

use crate::models::db_operations::accounts_db_operations;
use crate::models::{Account, AuthUser};
use crate::DbPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("An account with this email already exists.")]
    EmailTaken,
}

/// Called with the signed-in user, or `None` after sign-out.
pub type AuthListener = Arc<dyn Fn(Option<&AuthUser>) + Send + Sync>;

/// Handle returned by [`IdentityProvider::on_auth_state_changed`]. The
/// listener stays registered until this is dropped or `unsubscribe` is called.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Subscription { cancel: Some(Box::new(cancel)) }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError>;

    fn sign_out(&self) -> Result<(), IdentityError>;

    fn current_user(&self) -> Option<AuthUser>;

    /// Registers `listener`, invokes it once with the current user, and
    /// invokes it again after every sign-in and sign-out.
    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription;

    fn list_accounts(&self) -> Result<Vec<Account>, IdentityError>;

    fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError>;
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    listeners: HashMap<u64, AuthListener>,
}

/// Accounts live in the SQLite identity database; the signed-in user is
/// process-wide, so a new sign-in replaces the previous one.
pub struct LocalIdentityProvider {
    pool: DbPool,
    current: RwLock<Option<AuthUser>>,
    registry: Arc<Mutex<ListenerRegistry>>,
    // Held across "set current user, then notify" so concurrent sign-ins
    // reach listeners in the order they took effect.
    publish: Mutex<()>,
}

impl LocalIdentityProvider {
    pub fn new(pool: DbPool) -> Self {
        LocalIdentityProvider {
            pool,
            current: RwLock::new(None),
            registry: Arc::new(Mutex::new(ListenerRegistry::default())),
            publish: Mutex::new(()),
        }
    }

    fn set_current(&self, user: Option<AuthUser>) {
        let mut current = self.current.write().unwrap_or_else(|poisoned| {
            log::error!("RwLock for the current user was poisoned! Recovering lock.");
            poisoned.into_inner()
        });
        *current = user;
    }

    /// Listeners run under the publish lock and must not sign in or out themselves.
    fn publish(&self, user: Option<AuthUser>) {
        let _publishing = self.publish.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.set_current(user.clone());
        self.notify(user.as_ref());
    }

    fn notify(&self, user: Option<&AuthUser>) {
        // Snapshot first so listeners run without the registry lock held.
        let listeners: Vec<AuthListener> = match self.registry.lock() {
            Ok(registry) => registry.listeners.values().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().listeners.values().cloned().collect(),
        };
        for listener in listeners {
            listener(user);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.lock().map(|r| r.listeners.len()).unwrap_or(0)
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError> {
        let conn = self.pool.get()?;
        let user = accounts_db_operations::verify_credentials(&conn, email, password)?
            .ok_or(IdentityError::InvalidCredentials)?;
        drop(conn);

        log::info!("Signed in {}", user.email);
        self.publish(Some(user.clone()));
        Ok(user)
    }

    fn sign_out(&self) -> Result<(), IdentityError> {
        if let Some(user) = self.current_user() {
            log::info!("Signed out {}", user.email);
        }
        self.publish(None);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription {
        let id = {
            let mut registry = self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.insert(id, listener.clone());
            id
        };

        {
            let _publishing = self.publish.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let user = self.current_user();
            listener(user.as_ref());
        }

        let registry: Weak<Mutex<ListenerRegistry>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                let mut registry = registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                registry.listeners.remove(&id);
            }
        })
    }

    fn list_accounts(&self) -> Result<Vec<Account>, IdentityError> {
        let conn = self.pool.get()?;
        Ok(accounts_db_operations::read_all_accounts(&conn)?)
    }

    fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError> {
        let conn = self.pool.get()?;
        if accounts_db_operations::read_account_by_email(&conn, email)?.is_some() {
            return Err(IdentityError::EmailTaken);
        }
        Ok(accounts_db_operations::create_account(&conn, email, password)?)
    }
}
