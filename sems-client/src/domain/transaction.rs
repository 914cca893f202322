use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Postal address attached to a customer. The backend omits it for
/// customers that never registered one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl Address {
    /// Single-line rendering used on printed documents.
    pub fn one_line(&self) -> String {
        match &self.postal_code {
            Some(code) => format!("{}, {} {}", self.street, self.city, code),
            None => format!("{}, {}", self.street, self.city),
        }
    }
}

/// A prepaid electricity purchase and the energy allocated by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: i64,
    pub customer_name: String,
    pub meter_id: i64,
    pub amount: f64,
    pub kwh_allocated: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default, alias = "getAddressDto")]
    pub address: Option<Address>,
}
