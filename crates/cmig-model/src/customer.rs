use serde::{Deserialize, Serialize};

use crate::enums::PayoutMethod;
use crate::ids::{CustomerId, LegacyId};

/// A consignor or buyer account.
///
/// Created once per legacy id / email; later passes patch missing fields in
/// place and never produce a duplicate record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub legacy_id: Option<LegacyId>,
    pub email: String,
    pub name: String,
    pub street: Option<String>,
    pub street2: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    /// IBANs, unique within the customer.
    pub bank_accounts: Vec<String>,
    pub payout_method: Option<PayoutMethod>,
    pub payout_percentage: Option<f64>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub legacy_id: Option<LegacyId>,
    pub email: String,
    pub name: String,
    pub street: Option<String>,
    pub street2: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub note: Option<String>,
}

impl Customer {
    /// Whether the customer already holds the given IBAN.
    pub fn has_bank_account(&self, iban: &str) -> bool {
        self.bank_accounts.iter().any(|acc| acc == iban)
    }
}
