//! Error boundary - the one place that reacts to failed calls
//!
//! Views report errors here instead of inspecting them. An unauthorized
//! response expires the session and sends the user to login, whichever
//! view made the call; anything else becomes a message for the view's
//! error slot.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::{Error, ErrorKind};
use crate::services::routing::Route;
use crate::services::session::SessionStore;

/// What the view should do with a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handled {
    pub message: String,
    pub kind: ErrorKind,
    /// Where to navigate, if anywhere
    pub redirect: Option<Route>,
    /// The stored session was dropped as a result of this error
    pub session_cleared: bool,
}

#[derive(Clone)]
pub struct ErrorBoundary {
    store: Arc<SessionStore>,
}

impl ErrorBoundary {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn handle(&self, error: &Error) -> Handled {
        let kind = error.kind();
        match error {
            Error::Unauthorized { .. } => {
                // redirect even if the session file could not be removed
                let session_cleared = self.store.expire().unwrap_or(false);
                Handled {
                    message: error.to_string(),
                    kind,
                    redirect: Some(Route::Login),
                    session_cleared,
                }
            }
            Error::SessionRequired => Handled {
                message: error.to_string(),
                kind,
                redirect: Some(Route::Login),
                session_cleared: false,
            },
            _ => Handled {
                message: error.to_string(),
                kind,
                redirect: None,
                session_cleared: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::adapters::memory_session::MemorySessionStorage;
    use crate::domain::{BearerToken, Session};
    use crate::ports::SessionStorage;

    fn boundary() -> (ErrorBoundary, Arc<SessionStore>, Arc<MemorySessionStorage>) {
        let storage = Arc::new(MemorySessionStorage::with_session(Session::authenticated(
            BearerToken::new("t1"),
            "IT60X0542811101000000123456",
            Some("Anna".into()),
        )));
        let store = Arc::new(SessionStore::open(storage.clone()).unwrap());
        (ErrorBoundary::new(Arc::clone(&store)), store, storage)
    }

    #[test]
    fn test_unauthorized_expires_and_redirects() {
        let (boundary, store, storage) = boundary();
        for status in [401, 403] {
            let handled = boundary.handle(&Error::Unauthorized { status });
            assert_eq!(handled.redirect, Some(Route::Login));
            assert!(!store.is_authenticated());
            assert!(storage.load().unwrap().is_none());
            // only the first one had something to clear
            assert_eq!(handled.session_cleared, status == 401);
        }
    }

    #[test]
    fn test_session_required_redirects_without_clearing() {
        let (boundary, store, _) = boundary();
        let handled = boundary.handle(&Error::SessionRequired);
        assert_eq!(handled.redirect, Some(Route::Login));
        assert!(!handled.session_cleared);
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_other_errors_stay_on_view() {
        let (boundary, store, _) = boundary();
        let handled = boundary.handle(&Error::Backend {
            status: 500,
            message: "Servizio non disponibile".into(),
        });
        assert_eq!(handled.message, "Servizio non disponibile");
        assert_eq!(handled.kind, ErrorKind::Backend);
        assert_eq!(handled.redirect, None);
        assert!(store.is_authenticated());

        let handled = boundary.handle(&Error::validation("L'importo deve essere un numero positivo valido."));
        assert_eq!(handled.redirect, None);
        assert_eq!(handled.kind, ErrorKind::Validation);
    }
}
