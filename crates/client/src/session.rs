//! Per-user session state: the cart and the admin flag.
//!
//! The session is a small JSON document under the keys `sweetCart`,
//! `adminAuthenticated` and `adminName`. Stores decide where it lives; the
//! CLI keeps it in a file so the cart survives between commands.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sweetshop_core::Cart;
use thiserror::Error;
use tracing::{debug, warn};

/// Session storage errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("admin login required")]
    NotAuthenticated,
    #[error("session store lock poisoned")]
    Poisoned,
}

/// Everything kept for one browsing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "sweetCart", default)]
    pub cart: Cart,
    #[serde(rename = "adminAuthenticated", default)]
    pub admin_authenticated: bool,
    #[serde(rename = "adminName", default, skip_serializing_if = "Option::is_none")]
    pub admin_name: Option<String>,
}

impl Session {
    /// Mark the session as an authenticated admin.
    pub fn login(&mut self, name: &str) {
        let name = name.trim();
        self.admin_authenticated = true;
        self.admin_name = (!name.is_empty()).then(|| name.to_string());
    }

    /// Drop admin access. The cart is kept.
    pub fn logout(&mut self) {
        self.admin_authenticated = false;
        self.admin_name = None;
    }

    /// The admin's display name, or an error if not logged in.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAuthenticated`] when no admin is logged in.
    pub fn require_admin(&self) -> Result<&str, SessionError> {
        if !self.admin_authenticated {
            return Err(SessionError::NotAuthenticated);
        }
        Ok(self.admin_name.as_deref().unwrap_or("admin"))
    }
}

/// Where a [`Session`] is persisted.
pub trait SessionStore {
    /// Load the stored session, or a fresh one if there is none.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    fn load(&self) -> Result<Session, SessionError>;

    /// Persist the session.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Forget the stored session.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be cleared.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Session kept as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store the session at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File the session is stored in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Session, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No session file, starting fresh");
                return Ok(Session::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Session file is unreadable, starting fresh"
                );
                Ok(Session::default())
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session kept in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Session, SessionError> {
        let guard = self.session.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        let mut guard = self.session.lock().map_err(|_| SessionError::Poisoned)?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut guard = self.session.lock().map_err(|_| SessionError::Poisoned)?;
        *guard = None;
        Ok(())
    }
}

/// A loaded session bound to its store. Every change is written back.
#[derive(Debug)]
pub struct SessionHandle<S> {
    store: S,
    session: Session,
}

impl<S: SessionStore> SessionHandle<S> {
    /// Load the session from `store`.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub fn open(store: S) -> Result<Self, SessionError> {
        let session = store.load()?;
        Ok(Self { store, session })
    }

    /// Current session state.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.session.cart
    }

    /// Change the cart and persist it if `f` succeeds.
    ///
    /// On error the in-memory cart is restored and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or a store error while saving.
    pub fn update_cart<T, E>(&mut self, f: impl FnOnce(&mut Cart) -> Result<T, E>) -> Result<T, E>
    where
        E: From<SessionError>,
    {
        let before = self.session.cart.clone();
        match f(&mut self.session.cart) {
            Ok(value) => {
                self.persist()?;
                Ok(value)
            }
            Err(e) => {
                self.session.cart = before;
                Err(e)
            }
        }
    }

    /// Empty the cart and persist.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    pub fn clear_cart(&mut self) -> Result<(), SessionError> {
        self.session.cart.clear();
        self.persist()
    }

    /// Log in as admin and persist.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    pub fn login(&mut self, name: &str) -> Result<(), SessionError> {
        self.session.login(name);
        self.persist()
    }

    /// Log out and persist.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.session.logout();
        self.persist()
    }

    /// Write the session back; an empty session removes it from the store.
    fn persist(&self) -> Result<(), SessionError> {
        if self.session == Session::default() {
            return self.store.clear();
        }
        self.store.save(&self.session)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use sweetshop_core::{CartError, Money, Product, ProductId, ProductUnit};

    use super::*;

    fn ladoo() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Ladoo".to_string(),
            category: "Classic".to_string(),
            rate: Money::from_rupees(20),
            unit: ProductUnit::Piece,
            image: None,
            is_festival: None,
            stock: None,
        }
    }

    #[derive(Debug)]
    enum TestError {
        Cart,
        Session,
    }

    impl From<SessionError> for TestError {
        fn from(_: SessionError) -> Self {
            Self::Session
        }
    }

    impl From<CartError> for TestError {
        fn from(_: CartError) -> Self {
            Self::Cart
        }
    }

    #[test]
    fn test_cart_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut handle = SessionHandle::open(FileSessionStore::new(&path)).unwrap();
        handle
            .update_cart(|cart| Ok::<_, TestError>(cart.add(ladoo(), dec!(3))?))
            .unwrap();

        let reopened = SessionHandle::open(FileSessionStore::new(&path)).unwrap();
        assert_eq!(reopened.cart().len(), 1);
        assert_eq!(reopened.cart().total(), Money::from_rupees(60));
    }

    #[test]
    fn test_session_keys() {
        let mut session = Session::default();
        session.login("  Meena ");
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["adminAuthenticated"], true);
        assert_eq!(json["adminName"], "Meena");
        assert!(json["sweetCart"].is_array());
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let session = FileSessionStore::new(&path).load().unwrap();
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_failed_update_is_rolled_back() {
        let store = MemorySessionStore::new();
        let mut handle = SessionHandle::open(store).unwrap();
        handle
            .update_cart(|cart| Ok::<_, TestError>(cart.add(ladoo(), dec!(2))?))
            .unwrap();

        let result = handle.update_cart(|cart| {
            cart.clear();
            cart.remove(5).map_err(TestError::from)
        });
        assert!(matches!(result, Err(TestError::Cart)));
        assert_eq!(handle.cart().len(), 1);
    }

    #[test]
    fn test_require_admin() {
        let mut session = Session::default();
        assert!(matches!(
            session.require_admin(),
            Err(SessionError::NotAuthenticated)
        ));

        session.login("");
        assert_eq!(session.require_admin().unwrap(), "admin");

        session.logout();
        assert!(session.require_admin().is_err());
    }

    #[test]
    fn test_clear_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        FileSessionStore::new(dir.path().join("absent.json"))
            .clear()
            .unwrap();
    }

    #[test]
    fn test_empty_session_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut handle = SessionHandle::open(FileSessionStore::new(&path)).unwrap();
        handle
            .update_cart(|cart| Ok::<_, TestError>(cart.add(ladoo(), dec!(1))?))
            .unwrap();
        handle.login("Meena").unwrap();
        handle.clear_cart().unwrap();
        assert!(path.exists());

        handle.logout().unwrap();
        assert!(!path.exists());
        assert_eq!(FileSessionStore::new(&path).load().unwrap(), Session::default());
    }

    #[test]
    fn test_logout_keeps_cart_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut handle = SessionHandle::open(FileSessionStore::new(&path)).unwrap();
        handle.login("Meena").unwrap();
        handle
            .update_cart(|cart| Ok::<_, TestError>(cart.add(ladoo(), dec!(2))?))
            .unwrap();
        handle.logout().unwrap();

        let stored = FileSessionStore::new(&path).load().unwrap();
        assert!(!stored.admin_authenticated);
        assert_eq!(stored.cart.len(), 1);
    }
}
