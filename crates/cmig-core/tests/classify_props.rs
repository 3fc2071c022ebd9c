//! Property tests over the classification decision table.

use chrono::NaiveDate;
use proptest::option;
use proptest::prelude::*;

use cmig_core::{MigrationConfig, Outcome, StatusSignals, classify};

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2019i32..2027, 1u32..13, 1u32..29)
        .prop_map(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

fn signals_strategy() -> impl Strategy<Value = StatusSignals> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        option::of(date_strategy()),
        option::of(date_strategy()),
        -2.0f64..10.0,
        any::<bool>(),
        "[a-z ]{0,16}",
    )
        .prop_map(
            |(paid, sold, hidden, inactive, sale_date, payout_date, stock, exempt, reason)| {
                StatusSignals {
                    paid,
                    sold,
                    hidden,
                    inactive_marker: inactive,
                    sale_date,
                    payout_date,
                    stock,
                    submission_code: exempt
                        .then(|| MigrationConfig::default().exempt_legacy_code.clone()),
                    reason_text: reason,
                }
            },
        )
}

proptest! {
    /// The table is total: every signal combination yields exactly one
    /// outcome, and classification is deterministic.
    #[test]
    fn classification_is_total_and_deterministic(signals in signals_strategy()) {
        let config = MigrationConfig::default();
        let first = classify(&signals, &config);
        let second = classify(&signals, &config);
        prop_assert_eq!(&first, &second);
    }

    /// A paid row never silently vanishes: with the default fallback date
    /// configured it always orders, and without one it is withdrawn.
    #[test]
    fn paid_rows_never_vanish(signals in signals_strategy()) {
        let mut signals = signals;
        signals.paid = true;
        signals.inactive_marker = false;

        let config = MigrationConfig::default();
        match classify(&signals, &config) {
            Outcome::Order { paid, .. } => prop_assert!(paid),
            Outcome::Withdraw { .. } => {}
            Outcome::Publish { .. } => prop_assert!(false, "paid row published"),
        }

        let mut no_fallback = MigrationConfig::default();
        no_fallback.fallback_paid_date = None;
        if signals.sale_date.is_none() && signals.payout_date.is_none() {
            let is_withdraw = matches!(
                classify(&signals, &no_fallback),
                Outcome::Withdraw { .. }
            );
            prop_assert!(is_withdraw);
        }
    }

    /// Publishing only ever happens for unpaid, unsold, visible rows.
    #[test]
    fn publish_requires_clean_signals(signals in signals_strategy()) {
        let config = MigrationConfig::default();
        if let Outcome::Publish { stock } = classify(&signals, &config) {
            prop_assert!(!signals.paid);
            prop_assert!(!signals.sold);
            prop_assert!(!signals.hidden);
            prop_assert!(!signals.inactive_marker);
            prop_assert_eq!(stock, signals.stock);
        }
    }

    /// An unpaid order only exists for rows with a known sale date, and it
    /// is dated exactly on that sale date.
    #[test]
    fn unpaid_orders_carry_the_sale_date(signals in signals_strategy()) {
        let mut signals = signals;
        signals.paid = false;
        signals.inactive_marker = false;

        let config = MigrationConfig::default();
        if let Outcome::Order { date, paid, payout_date, .. } = classify(&signals, &config) {
            prop_assert!(!paid);
            prop_assert!(payout_date.is_none());
            prop_assert_eq!(Some(date), signals.sale_date);
        }
    }
}

/// NaN stock on a paid row hits no arithmetic arm; the catch-all default
/// must withdraw it with a logged note instead of dropping it.
#[test]
fn nan_stock_routes_to_catch_all_withdraw() {
    let config = MigrationConfig::default();
    let signals = StatusSignals {
        paid: true,
        stock: f64::NAN,
        payout_date: NaiveDate::from_ymd_opt(2024, 4, 1),
        ..StatusSignals::default()
    };
    match classify(&signals, &config) {
        Outcome::Withdraw { note, .. } => {
            assert!(note.unwrap().contains("unknown status combination"));
        }
        other => panic!("expected catch-all withdraw, got {other:?}"),
    }
}
