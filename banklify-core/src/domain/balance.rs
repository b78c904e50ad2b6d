//! Account balance snapshot

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::deserialize_decimal;

/// Balance of an account as returned by `GET /accounts/{iban}/balance`
///
/// Read-only; fetched again on every dashboard load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub iban: String,
    /// Accounting balance, pending entries included
    #[serde(deserialize_with = "deserialize_decimal")]
    pub ledger_balance: Decimal,
    /// Spendable balance after holds
    #[serde(deserialize_with = "deserialize_decimal")]
    pub available_balance: Decimal,
}

impl Balance {
    pub fn covers(&self, amount: Decimal) -> bool {
        amount <= self.available_balance
    }
}
