use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{PayoutMethod, ReturnAction};
use crate::ids::{CustomerId, LegacyId, SubmissionId};

/// A consignment intake batch ("bag"): the unit under which products enter
/// the shop and against which payouts are settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub name: String,
    pub legacy_id: Option<LegacyId>,
    pub legacy_code: Option<String>,
    pub customer_id: CustomerId,
    /// Date the bag was received in the shop.
    pub received_date: NaiveDate,
    /// Date the bag's items went online.
    pub published_date: NaiveDate,
    pub payout_method: PayoutMethod,
    pub payout_percentage: f64,
    /// Once true, the payout terms are a contract: later conflicting
    /// values from the legacy export are ignored.
    pub payout_contracted: bool,
    pub action_unsold: ReturnAction,
    pub iban: Option<String>,
    /// Free-form intake notes carried over from the legacy system.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub name: String,
    pub legacy_id: Option<LegacyId>,
    pub legacy_code: Option<String>,
    pub customer_id: CustomerId,
    pub received_date: NaiveDate,
    pub published_date: NaiveDate,
    pub payout_method: PayoutMethod,
    pub payout_percentage: f64,
    pub action_unsold: ReturnAction,
    pub iban: Option<String>,
    pub notes: Vec<String>,
}
