//! Lazily acquired session handle.

use once_cell::sync::OnceCell;

use common::{StoreError, StoreResult};

/// Boxed session factory.
pub type SessionFactory<S> = Box<dyn Fn() -> StoreResult<S> + Send + Sync>;

/// Holds the session of a store, acquiring it on first use when built
/// from a factory. Once acquired the session is reused for the lifetime
/// of the handle.
pub struct SessionHandle<S> {
    session: OnceCell<S>,
    factory: Option<SessionFactory<S>>,
}

impl<S> SessionHandle<S> {
    /// Wrap an already open session
    pub fn direct(session: S) -> Self {
        Self {
            session: OnceCell::with_value(session),
            factory: None,
        }
    }

    /// Defer session acquisition until the first call to [`SessionHandle::get`]
    pub fn lazy<F>(factory: F) -> Self
    where
        F: Fn() -> StoreResult<S> + Send + Sync + 'static,
    {
        Self {
            session: OnceCell::new(),
            factory: Some(Box::new(factory)),
        }
    }

    /// Check if the session has been acquired
    pub fn is_acquired(&self) -> bool {
        self.session.get().is_some()
    }

    /// The session, acquiring it first if needed.
    ///
    /// A failed acquisition is not cached; the next call runs the factory again.
    pub fn get(&self) -> StoreResult<&S> {
        self.session.get_or_try_init(|| match &self.factory {
            Some(factory) => {
                tracing::debug!("acquiring document session");
                factory()
            }
            None => Err(StoreError::session("no session available")),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_direct_is_acquired() {
        let handle = SessionHandle::direct(7u32);
        assert!(handle.is_acquired());
        assert_eq!(*handle.get().unwrap(), 7);
    }

    #[test]
    fn test_lazy_runs_factory_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = SessionHandle::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42u32)
        });

        assert!(!handle.is_acquired());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(*handle.get().unwrap(), 42);
        assert_eq!(*handle.get().unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_factory_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = SessionHandle::lazy(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StoreError::session("store offline"))
            } else {
                Ok("session")
            }
        });

        assert!(handle.get().is_err());
        assert!(!handle.is_acquired());
        assert_eq!(*handle.get().unwrap(), "session");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
