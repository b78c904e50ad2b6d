//! Dashboard service - balance card and recent movements

use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::transaction::sort_most_recent_first;
use crate::domain::{Balance, Session, TransactionRecord};
use crate::ports::BankingApi;
use crate::services::cancel::CancelToken;

/// Everything the dashboard view renders
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub balance: Balance,
    /// Most recent first
    pub transactions: Vec<TransactionRecord>,
}

impl DashboardSnapshot {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardService;

impl DashboardService {
    pub fn new() -> Self {
        Self
    }

    /// Fetch balance and the last `limit` movements concurrently.
    ///
    /// Either request failing fails the whole load; the caller routes the
    /// error through the boundary (a 401 from either one expires the session).
    pub async fn load(
        &self,
        api: &dyn BankingApi,
        session: &Session,
        limit: usize,
        cancel: &CancelToken,
    ) -> Result<DashboardSnapshot> {
        let iban = session
            .iban()
            .filter(|_| session.is_authenticated())
            .ok_or(Error::SessionRequired)?;

        let (balance, mut transactions) = tokio::try_join!(
            api.balance(iban, cancel),
            api.transactions(iban, limit, cancel)
        )?;

        sort_most_recent_first(&mut transactions);
        transactions.truncate(limit);

        Ok(DashboardSnapshot {
            balance,
            transactions,
        })
    }
}
