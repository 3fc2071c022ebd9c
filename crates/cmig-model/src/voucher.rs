use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::VoucherId;

/// The value a voucher code carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    /// Gift card with a remaining euro balance.
    GiftCard { balance: f64 },
    /// Promo code worth a fixed euro amount.
    FixedPromo { amount: f64 },
    /// Promo code worth a percentage off the order.
    PercentPromo { percent: f64 },
}

/// A redeemable code (gift card or promo code). Codes are unique across
/// all voucher kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    pub id: VoucherId,
    pub code: String,
    pub kind: VoucherKind,
    pub expires: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub code: String,
    pub kind: VoucherKind,
    pub expires: Option<NaiveDate>,
}
