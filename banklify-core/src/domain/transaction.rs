//! Account movement as listed on the dashboard

use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::deserialize_decimal;

/// A single movement returned by `GET /accounts/{iban}/movimenti`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(rename = "transactionId")]
    pub id: i64,
    /// Older backends send `timestamp`, newer ones `eventTimestamp`
    #[serde(alias = "eventTimestamp", deserialize_with = "deserialize_timestamp")]
    pub timestamp: NaiveDateTime,
    /// Signed: negative for debits
    #[serde(deserialize_with = "deserialize_decimal")]
    pub amount: Decimal,
    #[serde(rename = "transactionType", default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

impl TransactionRecord {
    pub fn is_debit(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

/// Order movements most-recent-first; equal timestamps fall back to id
pub fn sort_most_recent_first(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

/// Parse the timestamp formats the backend has been seen to emit:
/// RFC 3339 with offset, or a bare ISO local date-time (Spring `LocalDateTime`).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<NaiveDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
}
