//! Gift card and promo code migration.
//!
//! Both arrive as CSV exports of redeemable codes. Gift cards carry a
//! balance and only the unspent, unexpired remainder migrates; promo codes
//! come in a fixed-amount and a percentage flavor.

use chrono::NaiveDate;
use tracing::{info, warn};

use cmig_ingest::{LegacyTable, RowView, parse_date};
use cmig_model::{NewVoucher, VoucherKind, VoucherRepo};

use crate::report::PhaseReport;

/// Strict money parse: absent means zero, garbage means unusable row.
fn parse_money(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "nan" {
        return Some(0.0);
    }
    trimmed.replace(',', ".").parse::<f64>().ok()
}

/// Expiry handling shared by both voucher kinds: expired codes are
/// dropped, unreadable dates import without an expiry.
enum Expiry {
    Keep(Option<NaiveDate>),
    Expired,
}

fn voucher_expiry(row: &RowView<'_>, today: NaiveDate) -> Expiry {
    let raw = row.resolve(&["tot", "geldig_tot", "valid_until"]);
    if raw.is_empty() || raw == "0000-00-00" {
        return Expiry::Keep(None);
    }
    match parse_date(raw) {
        Some(date) if date < today => Expiry::Expired,
        Some(date) => Expiry::Keep(Some(date)),
        None => {
            warn!(value = raw, "unreadable voucher expiry, imported without one");
            Expiry::Keep(None)
        }
    }
}

/// Import gift cards: only codes with a positive remaining balance that
/// have not expired and do not already exist.
pub fn process_gift_cards<S: VoucherRepo>(
    store: &mut S,
    table: &LegacyTable,
    today: NaiveDate,
    report: &mut PhaseReport,
) {
    for row in table.iter() {
        report.processed += 1;
        let code = row.resolve(&["code"]);
        if code.is_empty() {
            report.skip("missing code");
            continue;
        }
        if store.find_voucher_by_code(code).is_some() {
            report.skip("already imported");
            continue;
        }
        let Some(total) = parse_money(row.resolve(&["bedrag", "amount"])) else {
            warn!(code, "gift card with unreadable amounts, skipped");
            report.skip("invalid amount");
            continue;
        };
        let Some(used) = parse_money(row.resolve(&["bedrag_gebruikt", "amount_used"])) else {
            warn!(code, "gift card with unreadable amounts, skipped");
            report.skip("invalid amount");
            continue;
        };
        let balance = total - used;
        if balance <= 0.01 {
            report.skip("exhausted");
            continue;
        }
        let expires = match voucher_expiry(&row, today) {
            Expiry::Expired => {
                report.skip("expired");
                continue;
            }
            Expiry::Keep(expires) => expires,
        };
        match store.insert_voucher(NewVoucher {
            code: code.to_string(),
            kind: VoucherKind::GiftCard { balance },
            expires,
        }) {
            Ok(_) => report.created += 1,
            Err(error) => {
                warn!(code, %error, "gift card insert failed");
                report.skip("store error");
            }
        }
    }
    info!(
        created = report.created,
        skipped = report.skipped_total(),
        "gift cards imported"
    );
}

/// Import promo codes, split by kind: "vast" (fixed amount) and
/// "percentage" codes; anything else is unusable.
pub fn process_promo_codes<S: VoucherRepo>(
    store: &mut S,
    table: &LegacyTable,
    today: NaiveDate,
    report: &mut PhaseReport,
) {
    for row in table.iter() {
        report.processed += 1;
        let code = row.resolve(&["code"]);
        if code.is_empty() {
            report.skip("missing code");
            continue;
        }
        if store.find_voucher_by_code(code).is_some() {
            report.skip("already imported");
            continue;
        }
        let expires = match voucher_expiry(&row, today) {
            Expiry::Expired => {
                report.skip("expired");
                continue;
            }
            Expiry::Keep(expires) => expires,
        };
        let Some(value) = parse_money(row.resolve(&["aantal", "waarde", "value"])) else {
            report.skip("invalid value");
            continue;
        };
        if value <= 0.0 {
            report.skip("zero value");
            continue;
        }
        let kind_raw = row.resolve(&["soort", "type"]).to_lowercase();
        let kind = if kind_raw.contains("vast") {
            VoucherKind::FixedPromo { amount: value }
        } else if kind_raw.contains("percentage") {
            VoucherKind::PercentPromo { percent: value }
        } else {
            report.skip("unknown kind");
            continue;
        };
        match store.insert_voucher(NewVoucher {
            code: code.to_string(),
            kind,
            expires,
        }) {
            Ok(_) => report.created += 1,
            Err(error) => {
                warn!(code, %error, "promo code insert failed");
                report.skip("store error");
            }
        }
    }
    info!(
        created = report.created,
        skipped = report.skipped_total(),
        "promo codes imported"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmig_model::MemoryStore;
    use std::path::Path;

    fn table(content: &str) -> LegacyTable {
        LegacyTable::parse(content.as_bytes(), Path::new("test.csv")).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn gift_card_remainder_and_skip_rules() {
        let mut store = MemoryStore::new();
        let mut report = PhaseReport::new("gift cards");
        let table = table(
            "code;bedrag;bedrag_gebruikt;tot\n\
             GC1;25,00;5,00;2026-12-31\n\
             GC2;25,00;25,00;2026-12-31\n\
             GC3;25,00;0,00;2020-01-01\n\
             ;25,00;0,00;\n\
             GC1;25,00;0,00;\n",
        );
        process_gift_cards(&mut store, &table, today(), &mut report);
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped["exhausted"], 1);
        assert_eq!(report.skipped["expired"], 1);
        assert_eq!(report.skipped["missing code"], 1);
        assert_eq!(report.skipped["already imported"], 1);
        let card = store.find_voucher_by_code("GC1").unwrap();
        assert_eq!(card.kind, VoucherKind::GiftCard { balance: 20.0 });
    }

    #[test]
    fn unreadable_expiry_imports_without_one() {
        let mut store = MemoryStore::new();
        let mut report = PhaseReport::new("gift cards");
        let table = table("code;bedrag;bedrag_gebruikt;tot\nGC9;10;0;2026-99-99\n");
        process_gift_cards(&mut store, &table, today(), &mut report);
        let card = store.find_voucher_by_code("GC9").unwrap();
        assert!(card.expires.is_none());
    }

    #[test]
    fn promo_codes_split_by_kind() {
        let mut store = MemoryStore::new();
        let mut report = PhaseReport::new("promo codes");
        let table = table(
            "code;soort;aantal;tot\n\
             FIX10;vast bedrag;10;\n\
             PCT20;percentage;20;\n\
             BAD;raar;5;\n\
             ZERO;vast;0;\n",
        );
        process_promo_codes(&mut store, &table, today(), &mut report);
        assert_eq!(report.created, 2);
        assert_eq!(
            store.find_voucher_by_code("FIX10").unwrap().kind,
            VoucherKind::FixedPromo { amount: 10.0 }
        );
        assert_eq!(
            store.find_voucher_by_code("PCT20").unwrap().kind,
            VoucherKind::PercentPromo { percent: 20.0 }
        );
        assert_eq!(report.skipped["unknown kind"], 1);
        assert_eq!(report.skipped["zero value"], 1);
    }
}
