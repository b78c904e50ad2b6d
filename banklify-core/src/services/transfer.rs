//! Transfer service - validated, single-flight funds transfer

use crate::domain::money::format_eur;
use crate::domain::result::{Error, Result};
use crate::domain::{Session, TransferForm, TransferReceipt, TransferRequest};
use crate::ports::BankingApi;
use crate::services::cancel::CancelToken;
use crate::services::submit::SubmitGate;

#[derive(Debug, Clone, Default)]
pub struct TransferService {
    gate: SubmitGate,
}

impl TransferService {
    pub fn new(gate: SubmitGate) -> Self {
        Self { gate }
    }

    /// Whether a submission is currently pending
    pub fn is_submitting(&self) -> bool {
        self.gate.is_busy()
    }

    /// Submit the form.
    ///
    /// Order: in-flight guard, client-side validation, optional balance
    /// pre-check, POST. On success the form keeps only the sender IBAN.
    /// On failure the form is left untouched so the user can correct it.
    pub async fn submit(
        &self,
        api: &dyn BankingApi,
        session: &Session,
        form: &mut TransferForm,
        balance_precheck: bool,
        cancel: &CancelToken,
    ) -> Result<TransferReceipt> {
        let _permit = self.gate.try_acquire()?;

        let request = TransferRequest::from_form(form, session)?;

        // advisory only: it can reject, the backend still has the last word
        if balance_precheck {
            let balance = api.balance(&request.sender_iban, cancel).await?;
            if !balance.covers(request.amount) {
                return Err(Error::InsufficientFunds {
                    available: format_eur(balance.available_balance),
                });
            }
        }

        let receipt = api.transfer(&request, cancel).await?;
        form.clear_after_success();
        Ok(receipt)
    }
}
