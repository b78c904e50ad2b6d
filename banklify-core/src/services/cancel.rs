//! View-scoped cancellation
//!
//! Every async call takes a [`CancelToken`]. The view that starts the call
//! owns the matching [`ViewScope`]; tearing the view down (dropping the
//! scope) resolves every pending call made with its tokens to
//! [`Error::Cancelled`].

use std::future::Future;

use tokio::sync::watch;

use crate::domain::result::{Error, Result};

/// Owner side of a cancellation signal, one per view instance
#[derive(Debug)]
pub struct ViewScope {
    name: &'static str,
    tx: watch::Sender<bool>,
}

impl ViewScope {
    pub fn new(name: &'static str) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { name, tx }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Cancel pending calls without tearing the scope down
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

/// Receiver side handed to async calls
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn none() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the owning scope cancels or goes away
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Run `fut` unless the token fires first
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_uncancelled_token_runs_future() {
        let scope = ViewScope::new("dashboard");
        let token = scope.token();
        let value = token.run(async { Ok::<_, Error>(42) }).await.unwrap();
        assert_eq!(value, 42);
        assert!(!scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropping_scope_cancels_pending_call() {
        let scope = ViewScope::new("dashboard");
        let token = scope.token();

        let pending = tokio::spawn(async move {
            token
                .run(async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok::<_, Error>(())
                })
                .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(scope);

        let result = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("call should resolve after teardown")
            .unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_already_cancelled_token_short_circuits() {
        let scope = ViewScope::new("transfer");
        let token = scope.token();
        scope.cancel();
        assert!(token.is_cancelled());

        let polled = std::sync::atomic::AtomicBool::new(false);
        let result = token
            .run(async {
                polled.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok::<_, Error>(())
            })
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_none_token_never_cancels() {
        let token = CancelToken::none();
        assert!(!token.is_cancelled());
        assert_eq!(token.run(async { Ok::<_, Error>("ok") }).await.unwrap(), "ok");
    }
}
