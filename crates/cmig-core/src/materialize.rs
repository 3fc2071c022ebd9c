//! Materialization of classification outcomes: stock, publication,
//! synthesized historical orders, and still-available duplicate copies.
//!
//! Every write is keyed deterministically (order reference, copy code), so
//! re-applying an outcome on a re-run detects the previous materialization
//! and degrades to a skip.

use tracing::{debug, info, warn};

use chrono::NaiveDate;
use cmig_model::{
    CustomerId, NewOrder, NewProduct, OrderLine, OrderRepo, OrderState, Product, ProductRepo,
    SubmissionId, SubmissionRepo, UnsoldReason,
};

use crate::classify::Outcome;
use crate::config::MigrationConfig;
use crate::report::OutcomeTally;

/// Synthetic records every order/copy hangs off: the migration customer
/// buys the historical orders, the migration submission parks the copies.
#[derive(Debug, Clone, Copy)]
pub struct MaterializeCtx {
    pub migration_customer: CustomerId,
    pub migration_submission: SubmissionId,
}

/// Execute one outcome against the store, updating the tally.
pub fn apply_outcome<S>(
    store: &mut S,
    config: &MigrationConfig,
    ctx: MaterializeCtx,
    product: &Product,
    outcome: &Outcome,
    tally: &mut OutcomeTally,
) -> cmig_model::Result<()>
where
    S: ProductRepo + OrderRepo + SubmissionRepo,
{
    match outcome {
        Outcome::Order {
            date,
            paid,
            payout_date,
            duplicate_stock,
        } => {
            let created =
                synthesize_order(store, ctx, product, *date, *paid, *payout_date)?;
            if created {
                if *paid {
                    tally.paid_orders += 1;
                } else {
                    tally.unpaid_orders += 1;
                }
            } else {
                tally.order_skips += 1;
            }
            if let Some(stock) = duplicate_stock {
                if duplicate_copy(store, config, ctx, product, *stock)? {
                    tally.copies += 1;
                } else {
                    tally.copy_skips += 1;
                }
            }
        }
        Outcome::Withdraw {
            stock,
            reason,
            note,
        } => {
            set_withdrawn(store, product, *stock, *reason, note.as_deref())?;
            tally.withdraw(reason.as_str());
        }
        Outcome::Publish { stock } => {
            set_published(store, product, *stock)?;
            tally.published += 1;
        }
    }
    Ok(())
}

fn order_key(product: &Product) -> Option<&str> {
    product
        .legacy_id
        .as_ref()
        .map(cmig_model::LegacyId::as_str)
        .or(product.default_code.as_deref())
}

/// Create the historical order for a product, or skip when the reference
/// already exists in a confirmed state. Either way the product ends with
/// zero stock and unpublished. Returns whether an order was created.
pub fn synthesize_order<S>(
    store: &mut S,
    ctx: MaterializeCtx,
    product: &Product,
    date: NaiveDate,
    paid: bool,
    payout_date: Option<NaiveDate>,
) -> cmig_model::Result<bool>
where
    S: ProductRepo + OrderRepo + SubmissionRepo,
{
    let Some(key) = order_key(product) else {
        warn!(product = %product.name, "no legacy id or code, order skipped, withdrawing");
        set_withdrawn(
            store,
            product,
            0.0,
            UnsoldReason::Other,
            Some("order skipped: product has no reference key"),
        )?;
        return Ok(false);
    };
    let reference = format!("MIGR_{key}_{}", date.format("%Y-%m-%d"));

    if let Some(existing) = store.find_order_by_reference(&reference)
        && existing.state == OrderState::Confirmed
    {
        debug!(reference, "order already materialized, skipping");
        clear_product(store, product)?;
        return Ok(false);
    }

    // Commission is frozen now, against the payout percentage the
    // submission carries today; it is never recomputed afterwards.
    let commission = if paid {
        let percentage = store
            .get_submission(product.submission_id)
            .map(|submission| submission.payout_percentage)
            .unwrap_or(0.0);
        product.list_price * percentage
    } else {
        0.0
    };

    let order = store.insert_order(NewOrder {
        reference: reference.clone(),
        customer_id: ctx.migration_customer,
        date_order: date,
        origin: format!("Migration: {}", product.name),
        state: OrderState::Confirmed,
        lines: vec![OrderLine {
            product_id: product.id,
            price_unit: product.list_price,
            qty_ordered: 1.0,
            // Delivered and invoiced are forced to the ordered quantity so
            // the order never shows up as "to invoice".
            qty_delivered: 1.0,
            qty_invoiced: 1.0,
            paid,
            payout_date,
            commission,
        }],
    })?;
    info!(reference = %order.reference, product = %product.name, paid, "order created");

    clear_product(store, product)?;
    Ok(true)
}

/// Zero the stock and unpublish, keeping everything else.
fn clear_product<S: ProductRepo>(store: &mut S, product: &Product) -> cmig_model::Result<()> {
    let mut updated = match store.get_product(product.id) {
        Some(current) => current,
        None => product.clone(),
    };
    updated.stock = 0.0;
    updated.published = false;
    store.update_product(&updated)
}

/// Clone a product into the migration submission as a still-available
/// copy with the given stock. Returns whether a copy was created.
pub fn duplicate_copy<S>(
    store: &mut S,
    config: &MigrationConfig,
    ctx: MaterializeCtx,
    product: &Product,
    stock: f64,
) -> cmig_model::Result<bool>
where
    S: ProductRepo,
{
    let base = product
        .default_code
        .as_deref()
        .or(product.legacy_id.as_ref().map(cmig_model::LegacyId::as_str));
    let Some(base) = base else {
        warn!(product = %product.name, "no code to derive a copy from, skipping");
        return Ok(false);
    };
    let code = format!("{base}{}", config.copy_code_suffix);

    if store.find_product_by_code(&code).is_some() {
        debug!(code, "copy already materialized, skipping");
        return Ok(false);
    }

    let mut copy = store.insert_product(NewProduct {
        legacy_id: None,
        default_code: Some(code.clone()),
        name: product.name.clone(),
        list_price: product.list_price,
        submission_id: ctx.migration_submission,
        brand_id: product.brand_id,
        public_category_id: product.public_category_id,
        internal_category_id: product.internal_category_id,
        description_ecommerce: product.description_ecommerce.clone(),
        seo_title: product.seo_title.clone(),
        seo_description: product.seo_description.clone(),
        seo_keywords: product.seo_keywords.clone(),
        image: product.image.clone(),
    })?;
    copy.attributes = product.attributes.clone();
    copy.stock = stock;
    copy.published = true;
    store.update_product(&copy)?;
    info!(code, stock, "still-available copy created");
    Ok(true)
}

/// Take a product off the shop with a reason, keeping the row's stock.
pub fn set_withdrawn<S: ProductRepo>(
    store: &mut S,
    product: &Product,
    stock: f64,
    reason: UnsoldReason,
    note: Option<&str>,
) -> cmig_model::Result<()> {
    let mut updated = match store.get_product(product.id) {
        Some(current) => current,
        None => product.clone(),
    };
    updated.stock = stock;
    updated.published = false;
    updated.unsold_reason = Some(reason);
    if let Some(note) = note {
        let existing = updated.description.take().unwrap_or_default();
        let line = format!("[migration] unsold: {note}");
        updated.description = Some(if existing.is_empty() {
            line
        } else {
            format!("{existing}\n{line}")
        });
    }
    store.update_product(&updated)
}

/// Put a product (back) on the shop with the given stock.
pub fn set_published<S: ProductRepo>(
    store: &mut S,
    product: &Product,
    stock: f64,
) -> cmig_model::Result<()> {
    let mut updated = match store.get_product(product.id) {
        Some(current) => current,
        None => product.clone(),
    };
    updated.stock = stock;
    updated.published = true;
    updated.unsold_reason = None;
    store.update_product(&updated)
}
