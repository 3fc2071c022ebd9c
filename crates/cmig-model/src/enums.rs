//! Closed vocabularies shared across the store and the migration engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a consignor is paid out for sold items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    /// Bank transfer at the cash percentage.
    Cash,
    /// Shop credit coupon at the coupon percentage.
    Coupon,
}

impl PayoutMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PayoutMethod::Cash => "cash",
            PayoutMethod::Coupon => "coupon",
        }
    }

    /// Default payout percentage associated with the method.
    pub fn default_percentage(self) -> f64 {
        match self {
            PayoutMethod::Cash => 0.30,
            PayoutMethod::Coupon => 0.50,
        }
    }
}

impl fmt::Display for PayoutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a product ended up not sold; mutually exclusive with being
/// published with stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsoldReason {
    Returned,
    Charity,
    Lost,
    Brand,
    Unknown,
    Other,
}

impl UnsoldReason {
    pub fn as_str(self) -> &'static str {
        match self {
            UnsoldReason::Returned => "returned",
            UnsoldReason::Charity => "charity",
            UnsoldReason::Lost => "lost",
            UnsoldReason::Brand => "brand",
            UnsoldReason::Unknown => "unknown",
            UnsoldReason::Other => "other",
        }
    }
}

impl fmt::Display for UnsoldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens with unsold or unaccepted items of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnAction {
    Donate,
    Return,
}

/// Lifecycle state of a sales order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Draft,
    Confirmed,
}
