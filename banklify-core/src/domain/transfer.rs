//! Funds transfer form and request

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{deserialize_decimal, parse_amount, serialize_cents, to_cents};
use super::result::{Error, Result};
use super::session::Session;

pub const MIN_IBAN_LEN: usize = 15;
const MAX_IBAN_LEN: usize = 34;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Bonifico eseguito con successo!";

/// Transfer form state, owned by the transfer view
///
/// The sender IBAN is fixed to the session account and survives a
/// successful submission; everything else is reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferForm {
    pub sender_iban: String,
    pub receiver_iban: String,
    pub amount: String,
    pub description: String,
}

impl TransferForm {
    /// Empty form bound to the session account
    pub fn for_session(session: &Session) -> Result<Self> {
        let iban = session
            .iban()
            .filter(|_| session.is_authenticated())
            .ok_or(Error::SessionRequired)?;
        Ok(Self {
            sender_iban: iban.to_string(),
            ..Default::default()
        })
    }

    /// Reset after a successful submission, keeping the sender
    pub fn clear_after_success(&mut self) {
        self.receiver_iban.clear();
        self.amount.clear();
        self.description.clear();
    }
}

/// Body of `POST /transactions/transfer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub sender_iban: String,
    pub receiver_iban: String,
    /// Always two fraction digits on the wire, e.g. `"100.00"`
    #[serde(serialize_with = "serialize_cents", deserialize_with = "deserialize_decimal")]
    pub amount: Decimal,
    pub description: String,
}

impl TransferRequest {
    /// Validate a form against the current session.
    ///
    /// Everything here runs before any network call.
    pub fn from_form(form: &TransferForm, session: &Session) -> Result<Self> {
        let session_iban = session
            .iban()
            .filter(|_| session.is_authenticated())
            .ok_or(Error::SessionRequired)?;

        let sender = normalize_iban(&form.sender_iban);
        if sender != normalize_iban(session_iban) {
            return Err(Error::validation(
                "L'IBAN mittente non corrisponde al conto della sessione.",
            ));
        }

        let amount = parse_amount(&form.amount)
            .map(to_cents)
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(|| Error::validation("L'importo deve essere un numero positivo valido."))?;

        let receiver = normalize_iban(&form.receiver_iban);
        if !is_plausible_iban(&receiver) {
            return Err(Error::validation(format!(
                "L'IBAN del destinatario non è valido (minimo {} caratteri alfanumerici).",
                MIN_IBAN_LEN
            )));
        }

        let description = form.description.trim();
        if description.is_empty() {
            return Err(Error::validation("Il campo Causale è obbligatorio."));
        }

        Ok(Self {
            sender_iban: sender,
            receiver_iban: receiver,
            amount,
            description: description.to_string(),
        })
    }
}

/// Outcome of a submitted transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    #[serde(default)]
    pub message: Option<String>,
}

impl TransferReceipt {
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_SUCCESS_MESSAGE)
    }
}

/// Uppercase and strip the spaces people paste in printed IBANs
pub fn normalize_iban(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn is_plausible_iban(iban: &str) -> bool {
    (MIN_IBAN_LEN..=MAX_IBAN_LEN).contains(&iban.len())
        && iban.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::BearerToken;

    const SENDER: &str = "IT60X0542811101000000123456";
    const RECEIVER: &str = "IT02L1234512345123456789012";

    fn session() -> Session {
        Session::authenticated(BearerToken::new("t1"), SENDER, Some("Anna".into()))
    }

    fn form(amount: &str) -> TransferForm {
        TransferForm {
            sender_iban: SENDER.into(),
            receiver_iban: RECEIVER.into(),
            amount: amount.into(),
            description: "Affitto".into(),
        }
    }

    #[test]
    fn test_valid_transfer_is_normalized() {
        let request = TransferRequest::from_form(&form("100"), &session()).unwrap();
        assert_eq!(request.amount.to_string(), "100.00");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"], "100.00");
        assert_eq!(json["senderIban"], SENDER);
        assert_eq!(json["receiverIban"], RECEIVER);
    }

    #[test]
    fn test_non_positive_or_garbage_amounts_rejected() {
        for bad in ["0", "0.00", "-1", "-0.01", "abc", "", "  ", "0.004", "1e5x"] {
            let err = TransferRequest::from_form(&form(bad), &session()).unwrap_err();
            assert!(
                matches!(err, Error::Validation(_)),
                "amount {:?} should be rejected, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_sender_must_match_session() {
        let mut f = form("10.00");
        f.sender_iban = RECEIVER.into();
        let err = TransferRequest::from_form(&f, &session()).unwrap_err();
        assert!(err.to_string().contains("mittente"));
    }

    #[test]
    fn test_receiver_iban_checked() {
        let mut f = form("10.00");
        f.receiver_iban = "IT60".into();
        assert!(TransferRequest::from_form(&f, &session()).is_err());

        f.receiver_iban = "it02 l123 4512 3451 2345 6789 012".into();
        let request = TransferRequest::from_form(&f, &session()).unwrap();
        assert_eq!(request.receiver_iban, RECEIVER);
    }

    #[test]
    fn test_description_required() {
        let mut f = form("10.00");
        f.description = "   ".into();
        assert!(TransferRequest::from_form(&f, &session()).is_err());
    }

    #[test]
    fn test_anonymous_session_rejected() {
        let err = TransferRequest::from_form(&form("10.00"), &Session::default()).unwrap_err();
        assert!(matches!(err, Error::SessionRequired));
        assert!(TransferForm::for_session(&Session::default()).is_err());
    }

    #[test]
    fn test_clear_after_success_keeps_sender() {
        let mut f = form("10.00");
        f.clear_after_success();
        assert_eq!(f.sender_iban, SENDER);
        assert!(f.receiver_iban.is_empty());
        assert!(f.amount.is_empty());
        assert!(f.description.is_empty());
    }

    #[test]
    fn test_receipt_message_fallback() {
        assert_eq!(TransferReceipt { message: None }.message(), DEFAULT_SUCCESS_MESSAGE);
        assert_eq!(
            TransferReceipt { message: Some("OK".into()) }.message(),
            "OK"
        );
    }
}
