//! End-to-end migration runs over CSV fixtures and the in-memory store.

use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;

use cmig_core::{ImageStore, MigrationConfig, MigrationFiles, run_migration};
use cmig_model::{
    CustomerRepo, LegacyId, MemoryStore, OrderRepo, ProductRepo, SubmissionRepo, UnsoldReason,
    VoucherRepo,
};

fn write_csv(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{content}").unwrap();
    path
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

const CUSTOMERS: &str = "\
klant_id;username;voornaam;achternaam;straat;huisnr;bus;postcode;gemeente;rekeningnummer;rekeningnummer2
1;an@example.com;An;Peeters;Dorpsstraat;12;;9000;Gent;BE68 5390 0754 7034;
";

const SUBMISSIONS: &str = "\
zak_id;KlantId;code;datum_verzonden;datum_ontvangen;schenking;notities
10;1;20210337;2021-03-01;2021-03-05;goed doel;eerste zak
";

const PRODUCT_HEADER: &str = "product_id;zak_id;naam;code;type;maat;seizoen;categorie;staat;merk_id;prijs;stock;uitbetaald;verkocht;product_niet_weergeven;status_image;datum_uitbetaald;datum_verkocht;waarom_niet_weergeven;commissie\n";

fn products_csv() -> String {
    let mut csv = String::from(PRODUCT_HEADER);
    // Paid out, never marked sold, still visible with stock: order + copy.
    csv.push_str("101;10;Rode trui;A-1;Trui & Cardigan;86/92;Winter;Meisje;5;;10,00;3;ja;nee;nee;;2024-04-01;;;50\n");
    // Sold after the cutoff but not paid out yet: unpaid order.
    csv.push_str("102;10;Blauwe broek;A-2;Broek;104;;Jongen;4;;12,50;0;nee;ja;nee;;;2025-10-15;;\n");
    // Hidden with a charity reason: withdrawn.
    csv.push_str("103;10;Groen kleedje;A-3;Kleedje;98;;Meisje;3;;8,00;2;nee;nee;ja;;;;goed doel;\n");
    // Plain still-for-sale row: published with stock.
    csv.push_str("104;10;Gele jas;A-4;Jas;110;Winter;;;;15,00;1;nee;nee;nee;;;;;\n");
    // References a bag that does not exist: skipped, not fatal.
    csv.push_str("105;99;Witte romper;A-5;Body;62;;;;;5,00;1;nee;nee;nee;;;;;\n");
    csv
}

struct Fixture {
    _dir: tempfile::TempDir,
    files: MigrationFiles,
    config: MigrationConfig,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let files = MigrationFiles {
        customers: Some(write_csv(dir.path(), "customers.csv", CUSTOMERS)),
        submissions: Some(write_csv(dir.path(), "submissions.csv", SUBMISSIONS)),
        brands: None,
        products: Some(write_csv(dir.path(), "products.csv", &products_csv())),
        gift_cards: None,
        promo_codes: None,
    };
    Fixture {
        _dir: dir,
        files,
        config: MigrationConfig::default(),
    }
}

#[test]
fn full_run_materializes_all_outcomes() {
    let fx = fixture();
    let mut store = MemoryStore::new();
    let images = ImageStore::disabled();
    let report = run_migration(&mut store, &fx.config, &images, &fx.files, today()).unwrap();

    // One real customer plus the synthetic migration customer.
    assert_eq!(store.customer_count(), 2);
    // One real bag plus the synthetic migration submission.
    assert_eq!(store.submission_count(), 2);
    // Four migrated products (one row skipped) plus one duplicate copy.
    assert_eq!(store.product_count(), 5);
    assert_eq!(store.order_count(), 2);

    assert_eq!(report.outcomes.paid_orders, 1);
    assert_eq!(report.outcomes.unpaid_orders, 1);
    assert_eq!(report.outcomes.copies, 1);
    assert_eq!(report.outcomes.published, 1);
    assert_eq!(report.outcomes.withdrawn["charity"], 1);
    let products_phase = report.phase("products").unwrap();
    assert_eq!(products_phase.skipped["unknown bag"], 1);

    // Scenario: paid + unsold + visible with stock 3.
    let original = store
        .find_product_by_legacy_id(&LegacyId::new("101"))
        .unwrap();
    assert_eq!(original.stock, 0.0);
    assert!(!original.published);
    assert!(original.unsold_reason.is_none());
    let copy = store.find_product_by_code("A-1-C").unwrap();
    assert_eq!(copy.stock, 3.0);
    assert!(copy.published);
    let migration_submission = store
        .find_submission_by_name(&fx.config.migration_submission_name)
        .unwrap();
    assert_eq!(copy.submission_id, migration_submission.id);

    let order = store.find_order_by_reference("MIGR_101_2024-04-01").unwrap();
    let line = &order.lines[0];
    assert!(line.paid);
    assert_eq!(line.qty_delivered, 1.0);
    assert_eq!(line.qty_invoiced, 1.0);
    assert_eq!(line.payout_date, NaiveDate::from_ymd_opt(2024, 4, 1));
    // Commission frozen at list price x the contracted coupon percentage.
    assert_eq!(line.commission, 5.0);

    // Scenario: sold after cutoff, unpaid.
    let sold = store
        .find_product_by_legacy_id(&LegacyId::new("102"))
        .unwrap();
    assert_eq!(sold.stock, 0.0);
    assert!(!sold.published);
    assert!(sold.unsold_reason.is_none());
    let unpaid = store.find_order_by_reference("MIGR_102_2025-10-15").unwrap();
    assert!(!unpaid.lines[0].paid);
    assert_eq!(unpaid.lines[0].commission, 0.0);

    // Scenario: hidden with charity text.
    let withdrawn = store
        .find_product_by_legacy_id(&LegacyId::new("103"))
        .unwrap();
    assert_eq!(withdrawn.unsold_reason, Some(UnsoldReason::Charity));
    assert_eq!(withdrawn.stock, 2.0);
    assert!(!withdrawn.published);
    assert!(withdrawn.description.as_deref().unwrap().contains("goed doel"));

    // Scenario: still for sale.
    let published = store
        .find_product_by_legacy_id(&LegacyId::new("104"))
        .unwrap();
    assert!(published.published);
    assert_eq!(published.stock, 1.0);
    assert!(published.unsold_reason.is_none());

    // The attribute split produced one line per size value.
    assert!(original.has_attribute("Maat", "86"));
    assert!(original.has_attribute("Maat", "92"));
    assert!(original.has_attribute("Seizoen", "Winter"));
}

#[test]
fn second_run_is_a_no_op_for_materialized_entities() {
    let fx = fixture();
    let mut store = MemoryStore::new();
    let images = ImageStore::disabled();
    run_migration(&mut store, &fx.config, &images, &fx.files, today()).unwrap();

    let customers = store.customer_count();
    let submissions = store.submission_count();
    let products = store.product_count();
    let orders = store.order_count();

    let report = run_migration(&mut store, &fx.config, &images, &fx.files, today()).unwrap();

    assert_eq!(store.customer_count(), customers);
    assert_eq!(store.submission_count(), submissions);
    assert_eq!(store.product_count(), products);
    assert_eq!(store.order_count(), orders);

    // Orders and copies are detected by their deterministic keys.
    assert_eq!(report.outcomes.paid_orders, 0);
    assert_eq!(report.outcomes.unpaid_orders, 0);
    assert_eq!(report.outcomes.order_skips, 2);
    assert_eq!(report.outcomes.copy_skips, 1);
    let products_phase = report.phase("products").unwrap();
    assert_eq!(products_phase.created, 0);
}

#[test]
fn frozen_commission_survives_payout_changes() {
    let fx = fixture();
    let mut store = MemoryStore::new();
    let images = ImageStore::disabled();
    run_migration(&mut store, &fx.config, &images, &fx.files, today()).unwrap();

    // Someone renegotiates the bag's payout terms after the migration.
    let mut submission = store
        .find_submission_by_legacy_id(&LegacyId::new("10"))
        .unwrap();
    submission.payout_percentage = 0.9;
    store.update_submission(&submission).unwrap();

    run_migration(&mut store, &fx.config, &images, &fx.files, today()).unwrap();

    let order = store.find_order_by_reference("MIGR_101_2024-04-01").unwrap();
    assert_eq!(order.lines[0].commission, 5.0);
}

#[test]
fn customer_reprocessed_with_new_address_is_updated_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_csv(dir.path(), "c1.csv", CUSTOMERS);
    let second = write_csv(
        dir.path(),
        "c2.csv",
        "klant_id;username;voornaam;achternaam;straat;huisnr;bus;postcode;gemeente;rekeningnummer;rekeningnummer2\n\
         1;an@example.com;An;Peeters;Nieuwstraat;7;;9000;Gent;;\n",
    );
    let config = MigrationConfig::default();
    let images = ImageStore::disabled();
    let mut store = MemoryStore::new();

    let files = MigrationFiles {
        customers: Some(first),
        ..MigrationFiles::default()
    };
    run_migration(&mut store, &config, &images, &files, today()).unwrap();
    let files = MigrationFiles {
        customers: Some(second),
        ..MigrationFiles::default()
    };
    run_migration(&mut store, &config, &images, &files, today()).unwrap();

    // Synthetic migration customer plus exactly one real customer.
    assert_eq!(store.customer_count(), 2);
    let customer = store
        .find_customer_by_legacy_id(&LegacyId::new("1"))
        .unwrap();
    assert_eq!(customer.street.as_deref(), Some("Nieuwstraat 7"));
    assert_eq!(customer.bank_accounts, vec!["BE68539007547034".to_string()]);
}

#[test]
fn bad_rows_never_stop_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::from(PRODUCT_HEADER);
    // A name without any bag reference; the row is counted, the next row
    // still lands.
    csv.push_str(";;Kapotte rij;;;;;;;;;;;;;;;;;\n");
    csv.push_str("104;10;Gele jas;A-4;Jas;110;;;;;15,00;1;nee;nee;nee;;;;;\n");
    let files = MigrationFiles {
        customers: Some(write_csv(dir.path(), "customers.csv", CUSTOMERS)),
        submissions: Some(write_csv(dir.path(), "submissions.csv", SUBMISSIONS)),
        products: Some(write_csv(dir.path(), "products.csv", &csv)),
        ..MigrationFiles::default()
    };
    let config = MigrationConfig::default();
    let images = ImageStore::disabled();
    let mut store = MemoryStore::new();
    let report = run_migration(&mut store, &config, &images, &files, today()).unwrap();

    let products_phase = report.phase("products").unwrap();
    assert_eq!(products_phase.processed, 2);
    assert_eq!(products_phase.created, 1);
    assert!(products_phase.skipped_total() >= 1);
    assert!(
        store
            .find_product_by_legacy_id(&LegacyId::new("104"))
            .is_some()
    );
}

#[test]
fn checkpoints_follow_the_configured_cadence() {
    let fx = fixture();
    let mut config = fx.config.clone();
    config.checkpoint_rows = 2;
    let mut store = MemoryStore::new();
    let images = ImageStore::disabled();
    run_migration(&mut store, &config, &images, &fx.files, today()).unwrap();

    // 1 customer row + 1 bag row + 5 product rows at a cadence of 2, plus
    // one checkpoint per phase end and one closing the run.
    assert!(store.checkpoint_count() >= 4);
}

#[test]
fn vouchers_ride_along_with_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let files = MigrationFiles {
        customers: Some(write_csv(dir.path(), "customers.csv", CUSTOMERS)),
        gift_cards: Some(write_csv(
            dir.path(),
            "giftcards.csv",
            "code;bedrag;bedrag_gebruikt;tot\nGC1;25,00;5,00;2026-12-31\n",
        )),
        promo_codes: Some(write_csv(
            dir.path(),
            "promocodes.csv",
            "code;soort;aantal;tot\nFIX10;vast;10;\n",
        )),
        ..MigrationFiles::default()
    };
    let config = MigrationConfig::default();
    let images = ImageStore::disabled();
    let mut store = MemoryStore::new();
    run_migration(&mut store, &config, &images, &files, today()).unwrap();

    assert_eq!(store.voucher_count(), 2);
    assert!(store.find_voucher_by_code("GC1").is_some());
    assert!(store.find_voucher_by_code("FIX10").is_some());
}
