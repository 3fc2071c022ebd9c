//! Classification of legacy product rows.
//!
//! `classify` is a pure decision function: per-row status signals go in,
//! exactly one [`Outcome`] comes out. Side effects live in the
//! materializer, which keeps this table independently testable.
//!
//! Rules are evaluated in a fixed priority order; the first match wins:
//!
//! 1. the absolute "inactive" image marker withdraws the product;
//! 2. paid rows synthesize a paid order (optionally duplicating leftover
//!    stock into a still-available copy);
//! 3. unpaid-but-sold rows get an unpaid order when the sale date is
//!    usable (after the cutoff, or the exempt bag), otherwise withdraw;
//! 4. unsold rows publish or withdraw depending on the hidden flag;
//! 5. anything else falls into a logged catch-all withdrawal.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use cmig_model::UnsoldReason;

use crate::config::MigrationConfig;

/// Typed per-row signals, produced by the row normalizer. The
/// classification never touches raw strings except the free-form
/// withdrawal reason.
#[derive(Debug, Clone, Default)]
pub struct StatusSignals {
    pub paid: bool,
    pub sold: bool,
    pub hidden: bool,
    /// The legacy shop's "definitely inactive" image marker.
    pub inactive_marker: bool,
    pub sale_date: Option<NaiveDate>,
    pub payout_date: Option<NaiveDate>,
    pub stock: f64,
    /// Legacy code of the owning bag, for the exempt-bag rule.
    pub submission_code: Option<String>,
    /// Free-form "why hidden" text from the export.
    pub reason_text: String,
}

/// What the materializer has to do for one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Synthesize a historical sales order at `date`. When
    /// `duplicate_stock` is set, the remaining stock is duplicated into a
    /// still-available copy of the product.
    Order {
        date: NaiveDate,
        paid: bool,
        payout_date: Option<NaiveDate>,
        duplicate_stock: Option<f64>,
    },
    /// Take the product off the shop with a reason.
    Withdraw {
        stock: f64,
        reason: UnsoldReason,
        note: Option<String>,
    },
    /// Keep the product for sale with the given stock.
    Publish { stock: f64 },
}

/// Map free-form withdrawal text onto the closed reason set.
/// Case-insensitive substring match, first hit wins; no text with zero
/// stock means the legacy state is simply unknown.
pub fn map_withdraw_reason(text: &str, stock: f64) -> UnsoldReason {
    let folded = text.trim().to_lowercase();
    if folded.contains("terug") || folded.contains("opgehaald") {
        UnsoldReason::Returned
    } else if folded.contains("goed doel")
        || folded.contains("spullenhulp")
        || folded.contains("doneer")
    {
        UnsoldReason::Charity
    } else if folded.contains("verloren") || folded.contains("kapot") || folded.contains("vlek") {
        UnsoldReason::Lost
    } else if folded.contains("merk") {
        UnsoldReason::Brand
    } else if folded.is_empty() && stock <= 0.0 {
        UnsoldReason::Unknown
    } else {
        UnsoldReason::Other
    }
}

fn withdraw(stock: f64, text: &str) -> Outcome {
    let trimmed = text.trim();
    Outcome::Withdraw {
        stock,
        reason: map_withdraw_reason(trimmed, stock),
        note: if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        },
    }
}

/// Effective order/payout dates for a paid row. `None` means the row has
/// no usable date at all and must be withdrawn instead of ordered.
fn paid_effective_dates(
    signals: &StatusSignals,
    config: &MigrationConfig,
) -> Option<(NaiveDate, NaiveDate)> {
    if let Some(payout) = signals.payout_date {
        return Some((signals.sale_date.unwrap_or(payout), payout));
    }
    if let Some(sale) = signals.sale_date {
        info!(
            order_date = %sale,
            "paid row without payout date, using sale date for both"
        );
        return Some((sale, sale));
    }
    if let Some(fallback) = config.fallback_paid_date {
        warn!(
            fallback = %fallback,
            "paid row without sale or payout date, using hard fallback date"
        );
        return Some((fallback, fallback));
    }
    None
}

/// Decide the single outcome for one product row.
pub fn classify(signals: &StatusSignals, config: &MigrationConfig) -> Outcome {
    if signals.inactive_marker {
        debug!("inactive image marker, withdrawing");
        return withdraw(signals.stock, "inactive status marker");
    }

    if signals.paid {
        let Some((order_date, payout_date)) = paid_effective_dates(signals, config) else {
            warn!("paid row with no usable date at all, withdrawing");
            return withdraw(signals.stock, "paid without any usable date");
        };
        if order_date > config.cutoff_date {
            warn!(
                order_date = %order_date,
                cutoff = %config.cutoff_date,
                "paid row dated after the cutoff, inconsistent but processed as paid"
            );
        }
        let order = |duplicate_stock: Option<f64>| Outcome::Order {
            date: order_date,
            paid: true,
            payout_date: Some(payout_date),
            duplicate_stock,
        };
        return if signals.sold {
            order(None)
        } else if !signals.hidden && signals.stock > 0.0 {
            // Paid out but never marked sold and still visible with
            // leftover stock: order the sold unit, duplicate the rest.
            order(Some(signals.stock))
        } else if signals.hidden || signals.stock <= 0.0 {
            order(None)
        } else {
            warn!(stock = signals.stock, "unknown paid status combination, withdrawing");
            withdraw(signals.stock, "unknown status combination")
        };
    }

    match (signals.sold, signals.sale_date) {
        (true, Some(sale_date)) => {
            let exempt = signals.submission_code.as_deref() == Some(config.exempt_legacy_code.as_str());
            if sale_date > config.cutoff_date || exempt {
                Outcome::Order {
                    date: sale_date,
                    paid: false,
                    payout_date: None,
                    duplicate_stock: None,
                }
            } else {
                debug!(sale_date = %sale_date, "sold before cutoff but unpaid, withdrawing");
                let text = if signals.reason_text.trim().is_empty() {
                    "sold before cutoff but unpaid (inconsistent)"
                } else {
                    signals.reason_text.as_str()
                };
                withdraw(signals.stock, text)
            }
        }
        (true, None) => {
            let text = if signals.reason_text.trim().is_empty() {
                "no sale date known"
            } else {
                signals.reason_text.as_str()
            };
            withdraw(signals.stock, text)
        }
        (false, _) if !signals.hidden => Outcome::Publish {
            stock: signals.stock,
        },
        (false, _) => withdraw(signals.stock, &signals.reason_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn config() -> MigrationConfig {
        MigrationConfig::default()
    }

    fn signals() -> StatusSignals {
        StatusSignals::default()
    }

    #[test]
    fn inactive_marker_wins_over_everything() {
        let row = StatusSignals {
            paid: true,
            sold: true,
            inactive_marker: true,
            sale_date: Some(ymd(2025, 10, 1)),
            stock: 3.0,
            ..signals()
        };
        let outcome = classify(&row, &config());
        assert!(matches!(
            outcome,
            Outcome::Withdraw {
                reason: UnsoldReason::Other,
                ..
            }
        ));
    }

    #[test]
    fn paid_and_sold_orders_at_sale_date() {
        let row = StatusSignals {
            paid: true,
            sold: true,
            sale_date: Some(ymd(2024, 3, 10)),
            payout_date: Some(ymd(2024, 4, 1)),
            ..signals()
        };
        let outcome = classify(&row, &config());
        assert_eq!(
            outcome,
            Outcome::Order {
                date: ymd(2024, 3, 10),
                paid: true,
                payout_date: Some(ymd(2024, 4, 1)),
                duplicate_stock: None,
            }
        );
    }

    #[test]
    fn paid_unsold_visible_with_stock_duplicates_copy() {
        let row = StatusSignals {
            paid: true,
            sold: false,
            hidden: false,
            stock: 3.0,
            payout_date: Some(ymd(2024, 4, 1)),
            ..signals()
        };
        let outcome = classify(&row, &config());
        assert_eq!(
            outcome,
            Outcome::Order {
                date: ymd(2024, 4, 1),
                paid: true,
                payout_date: Some(ymd(2024, 4, 1)),
                duplicate_stock: Some(3.0),
            }
        );
    }

    #[test]
    fn paid_unsold_hidden_or_out_of_stock_orders_without_copy() {
        for row in [
            StatusSignals {
                paid: true,
                hidden: true,
                stock: 3.0,
                payout_date: Some(ymd(2024, 4, 1)),
                ..signals()
            },
            StatusSignals {
                paid: true,
                hidden: false,
                stock: 0.0,
                payout_date: Some(ymd(2024, 4, 1)),
                ..signals()
            },
        ] {
            let outcome = classify(&row, &config());
            assert!(matches!(
                outcome,
                Outcome::Order {
                    paid: true,
                    duplicate_stock: None,
                    ..
                }
            ));
        }
    }

    #[test]
    fn paid_without_payout_date_falls_back_to_sale_date() {
        let row = StatusSignals {
            paid: true,
            sold: true,
            sale_date: Some(ymd(2023, 5, 5)),
            ..signals()
        };
        let outcome = classify(&row, &config());
        assert_eq!(
            outcome,
            Outcome::Order {
                date: ymd(2023, 5, 5),
                paid: true,
                payout_date: Some(ymd(2023, 5, 5)),
                duplicate_stock: None,
            }
        );
    }

    #[test]
    fn paid_without_any_date_uses_configured_fallback() {
        let row = StatusSignals {
            paid: true,
            sold: true,
            ..signals()
        };
        let outcome = classify(&row, &config());
        assert_eq!(
            outcome,
            Outcome::Order {
                date: ymd(2022, 8, 31),
                paid: true,
                payout_date: Some(ymd(2022, 8, 31)),
                duplicate_stock: None,
            }
        );
    }

    #[test]
    fn paid_without_any_date_and_no_fallback_is_withdrawn_not_dropped() {
        let mut cfg = config();
        cfg.fallback_paid_date = None;
        let row = StatusSignals {
            paid: true,
            sold: true,
            ..signals()
        };
        let outcome = classify(&row, &cfg);
        match outcome {
            Outcome::Withdraw { note, .. } => {
                assert!(note.unwrap().contains("usable date"));
            }
            other => panic!("expected withdraw, got {other:?}"),
        }
    }

    #[test]
    fn unpaid_sold_after_cutoff_orders_unpaid() {
        let row = StatusSignals {
            sold: true,
            sale_date: Some(ymd(2025, 10, 15)),
            ..signals()
        };
        let outcome = classify(&row, &config());
        assert_eq!(
            outcome,
            Outcome::Order {
                date: ymd(2025, 10, 15),
                paid: false,
                payout_date: None,
                duplicate_stock: None,
            }
        );
    }

    #[test]
    fn unpaid_sold_before_cutoff_exempt_bag_still_orders() {
        let row = StatusSignals {
            sold: true,
            sale_date: Some(ymd(2025, 6, 1)),
            submission_code: Some("20250012".to_string()),
            ..signals()
        };
        assert!(matches!(
            classify(&row, &config()),
            Outcome::Order { paid: false, .. }
        ));
    }

    #[test]
    fn unpaid_sold_before_cutoff_other_bag_withdraws() {
        let row = StatusSignals {
            sold: true,
            sale_date: Some(ymd(2025, 6, 1)),
            submission_code: Some("20210001".to_string()),
            ..signals()
        };
        match classify(&row, &config()) {
            Outcome::Withdraw { note, .. } => assert!(note.unwrap().contains("cutoff")),
            other => panic!("expected withdraw, got {other:?}"),
        }
    }

    #[test]
    fn unpaid_sold_without_date_withdraws() {
        let row = StatusSignals {
            sold: true,
            ..signals()
        };
        match classify(&row, &config()) {
            Outcome::Withdraw { note, .. } => {
                assert!(note.unwrap().contains("sale date"));
            }
            other => panic!("expected withdraw, got {other:?}"),
        }
    }

    #[test]
    fn unpaid_unsold_visible_publishes_with_stock() {
        let row = StatusSignals {
            stock: 2.0,
            ..signals()
        };
        assert_eq!(classify(&row, &config()), Outcome::Publish { stock: 2.0 });
    }

    #[test]
    fn unpaid_unsold_hidden_maps_reason_keywords() {
        let row = StatusSignals {
            hidden: true,
            stock: 1.0,
            reason_text: "naar goed doel gebracht".to_string(),
            ..signals()
        };
        assert_eq!(
            classify(&row, &config()),
            Outcome::Withdraw {
                stock: 1.0,
                reason: UnsoldReason::Charity,
                note: Some("naar goed doel gebracht".to_string()),
            }
        );
    }

    #[test]
    fn reason_keyword_priority_and_defaults() {
        assert_eq!(map_withdraw_reason("Terug opgehaald", 0.0), UnsoldReason::Returned);
        assert_eq!(map_withdraw_reason("Spullenhulp", 0.0), UnsoldReason::Charity);
        assert_eq!(map_withdraw_reason("vlek op mouw", 0.0), UnsoldReason::Lost);
        assert_eq!(map_withdraw_reason("merk niet ok", 0.0), UnsoldReason::Brand);
        assert_eq!(map_withdraw_reason("", 0.0), UnsoldReason::Unknown);
        assert_eq!(map_withdraw_reason("", 2.0), UnsoldReason::Other);
        assert_eq!(map_withdraw_reason("iets anders", 0.0), UnsoldReason::Other);
    }

    #[test]
    fn hidden_without_reason_and_no_stock_is_unknown() {
        let row = StatusSignals {
            hidden: true,
            ..signals()
        };
        assert_eq!(
            classify(&row, &config()),
            Outcome::Withdraw {
                stock: 0.0,
                reason: UnsoldReason::Unknown,
                note: None,
            }
        );
    }
}
