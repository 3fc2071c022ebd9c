use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::OrderState;
use crate::ids::{CustomerId, OrderId, ProductId};

/// A historical sales order synthesized by the migration. The client
/// reference is the idempotency key: one reference, one order, ever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub reference: String,
    pub customer_id: CustomerId,
    pub date_order: NaiveDate,
    pub origin: String,
    pub state: OrderState,
    pub lines: Vec<OrderLine>,
}

/// One line of a sales order.
///
/// `commission` is frozen at materialization time and never recomputed,
/// even if the submission's payout percentage changes later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub price_unit: f64,
    pub qty_ordered: f64,
    pub qty_delivered: f64,
    pub qty_invoiced: f64,
    pub paid: bool,
    pub payout_date: Option<NaiveDate>,
    pub commission: f64,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub reference: String,
    pub customer_id: CustomerId,
    pub date_order: NaiveDate,
    pub origin: String,
    pub state: OrderState,
    pub lines: Vec<OrderLine>,
}
