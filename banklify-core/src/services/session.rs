//! Session store - the single owner of authentication state
//!
//! The store is created once per application context and passed around
//! explicitly. Readers either take a snapshot with [`SessionStore::current`]
//! or subscribe to change notifications with [`SessionStore::subscribe`].

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::result::{Error, Result};
use crate::domain::{LoginCredentials, RegistrationForm, Session};
use crate::ports::{BankingApi, SessionStorage};
use crate::services::cancel::CancelToken;

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Open the store, restoring whatever session the storage holds
    pub fn open(storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let restored = storage.load()?.unwrap_or_default();
        let (state, _rx) = watch::channel(restored);
        Ok(Self { storage, state })
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.state.subscribe(),
        }
    }

    /// Authenticate against `/auth/login` and persist the session.
    ///
    /// A rejected login (401/403 or any other 4xx) is reported as
    /// [`Error::InvalidCredentials`]; there is no session to expire yet.
    pub async fn login(
        &self,
        api: &dyn BankingApi,
        credentials: &LoginCredentials,
        cancel: &CancelToken,
    ) -> Result<Session> {
        credentials.validate()?;

        let response = api
            .login(credentials, cancel)
            .await
            .map_err(map_login_error)?;

        let iban = response.iban.trim();
        if iban.is_empty() {
            return Err(Error::Backend {
                status: 200,
                message: "Risposta di accesso incompleta: IBAN mancante.".to_string(),
            });
        }

        let session = Session::authenticated(response.token, iban, response.first_name);
        self.storage.save(&session)?;
        self.state.send_replace(session.clone());
        Ok(session)
    }

    /// Register a new customer, then log in with the same credentials
    pub async fn register(
        &self,
        api: &dyn BankingApi,
        form: &RegistrationForm,
        cancel: &CancelToken,
    ) -> Result<Session> {
        let request = form.validate()?;
        api.register(&request, cancel).await?;
        self.login(api, &request.credentials(), cancel).await
    }

    /// User-initiated logout
    pub fn logout(&self) -> Result<()> {
        self.clear().map(|_| ())
    }

    /// Forced logout after the backend rejected the credential.
    ///
    /// Returns whether a session was actually dropped.
    pub fn expire(&self) -> Result<bool> {
        self.clear()
    }

    fn clear(&self) -> Result<bool> {
        let had_session = self.state.borrow().credential.is_some();
        // in-memory state is cleared even when the storage fails
        let stored = self.storage.clear();
        self.state.send_replace(Session::default());
        stored?;
        Ok(had_session)
    }
}

fn map_login_error(err: Error) -> Error {
    match err {
        Error::Unauthorized { .. } => Error::InvalidCredentials,
        Error::Backend { status, .. } if (400..500).contains(&status) => Error::InvalidCredentials,
        other => other,
    }
}

/// Read-only view of the session; always reflects the latest login or logout
#[derive(Debug, Clone)]
pub struct SessionWatch {
    rx: watch::Receiver<Session>,
}

impl SessionWatch {
    pub fn current(&self) -> Session {
        self.rx.borrow().clone()
    }

    pub fn credential_header(&self) -> Option<String> {
        self.rx.borrow().credential.as_ref().map(|c| c.header_value())
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_authenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::adapters::memory_session::MemorySessionStorage;
    use crate::domain::{
        Balance, BearerToken, LoginResponse, RegisterRequest, TransactionRecord, TransferReceipt,
        TransferRequest,
    };

    /// Backend stub answering only the auth endpoints
    struct AuthStub {
        login_status: Option<u16>,
        register_calls: AtomicUsize,
    }

    impl AuthStub {
        fn accepting() -> Self {
            Self { login_status: None, register_calls: AtomicUsize::new(0) }
        }

        fn rejecting(status: u16) -> Self {
            Self { login_status: Some(status), register_calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl BankingApi for AuthStub {
        async fn login(&self, c: &LoginCredentials, _: &CancelToken) -> Result<LoginResponse> {
            match self.login_status {
                Some(401) | Some(403) => Err(Error::Unauthorized { status: 401 }),
                Some(status) => Err(Error::Backend { status, message: "errore".into() }),
                None => Ok(LoginResponse {
                    token: BearerToken::new(format!("token-for-{}", c.email)),
                    iban: "IT60X0542811101000000123456".into(),
                    first_name: Some("Anna".into()),
                }),
            }
        }

        async fn register(&self, _: &RegisterRequest, _: &CancelToken) -> Result<()> {
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn balance(&self, _: &str, _: &CancelToken) -> Result<Balance> {
            unimplemented!()
        }

        async fn transactions(&self, _: &str, _: usize, _: &CancelToken) -> Result<Vec<TransactionRecord>> {
            unimplemented!()
        }

        async fn transfer(&self, _: &TransferRequest, _: &CancelToken) -> Result<TransferReceipt> {
            unimplemented!()
        }
    }

    fn store() -> (SessionStore, Arc<MemorySessionStorage>) {
        let storage = Arc::new(MemorySessionStorage::new());
        let store = SessionStore::open(storage.clone()).unwrap();
        (store, storage)
    }

    #[tokio::test]
    async fn test_login_persists_and_notifies() {
        let (store, storage) = store();
        let watch = store.subscribe();
        assert!(!watch.is_authenticated());

        let session = store
            .login(&AuthStub::accepting(), &LoginCredentials::new("a@b.it", "secret1"), &CancelToken::none())
            .await
            .unwrap();

        assert!(session.is_authenticated());
        assert_eq!(storage.load().unwrap(), Some(session.clone()));

        assert_eq!(watch.current(), session);
        assert_eq!(watch.credential_header().as_deref(), Some("Bearer token-for-a@b.it"));
    }

    #[tokio::test]
    async fn test_rejected_login_is_invalid_credentials() {
        for status in [401, 403, 400] {
            let (store, storage) = store();
            let err = store
                .login(&AuthStub::rejecting(status), &LoginCredentials::new("a@b.it", "bad"), &CancelToken::none())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidCredentials), "status {}", status);
            assert!(storage.load().unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_masked() {
        let (store, _) = store();
        let err = store
            .login(&AuthStub::rejecting(500), &LoginCredentials::new("a@b.it", "x"), &CancelToken::none())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Backend { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_register_validates_before_network() {
        let (store, _) = store();
        let api = AuthStub::accepting();
        let form = RegistrationForm {
            password: "short".into(),
            confirm_password: "short".into(),
            ..Default::default()
        };
        let err = store.register(&api, &form, &CancelToken::none()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(api.register_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_logout_and_expire_clear_everything() {
        let (store, storage) = store();
        store
            .login(&AuthStub::accepting(), &LoginCredentials::new("a@b.it", "secret1"), &CancelToken::none())
            .await
            .unwrap();

        assert!(store.expire().unwrap());
        assert!(!store.is_authenticated());
        assert!(storage.load().unwrap().is_none());
        // nothing left to expire
        assert!(!store.expire().unwrap());

        store.logout().unwrap();
        assert_eq!(store.current(), Session::default());
    }

    #[test]
    fn test_open_restores_persisted_session() {
        let storage = Arc::new(MemorySessionStorage::new());
        let session = Session::authenticated(BearerToken::new("t1"), "IT60", None);
        storage.save(&session).unwrap();

        let store = SessionStore::open(storage).unwrap();
        assert_eq!(store.current(), session);
    }
}
