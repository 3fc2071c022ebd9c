//! The migration run orchestrator.
//!
//! Drives the files in dependency order (customers → bags → brands →
//! synthetic migration records → products → gift cards → promo codes) row
//! by row, with caches shared across the whole run. A failing row is
//! logged and counted, never fatal; the store is checkpointed every N rows
//! so a crash loses at most one partial batch, and a re-run after a crash
//! is a no-op for everything already materialized.

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use tracing::{info, info_span, warn};

use cmig_ingest::{LegacyTable, RowView, clean_legacy_id, is_missing, parse_amount, parse_date, parse_flag};
use cmig_model::{
    CategoryId, CommerceStore, LegacyId, NewCustomer, NewSubmission, PayoutMethod, ReturnAction,
};

use crate::classify::{StatusSignals, classify};
use crate::config::MigrationConfig;
use crate::images::ImageStore;
use crate::materialize::{MaterializeCtx, apply_outcome};
use crate::product::{ProductRowData, apply_commission, is_gift_card_name, upsert_product};
use crate::report::{PhaseReport, RunReport};
use crate::resolver::{
    BrandSeed, CustomerFields, RunCaches, SubmissionSeed, ensure_category,
    ensure_fallback_internal, find_or_create_customer, find_or_create_submission, upsert_brand,
};
use crate::voucher::{process_gift_cards, process_promo_codes};

/// The CSV exports of one migration batch; any subset may be present, but
/// a run needs at least customers or products to do anything.
#[derive(Debug, Clone, Default)]
pub struct MigrationFiles {
    pub customers: Option<std::path::PathBuf>,
    pub submissions: Option<std::path::PathBuf>,
    pub brands: Option<std::path::PathBuf>,
    pub products: Option<std::path::PathBuf>,
    pub gift_cards: Option<std::path::PathBuf>,
    pub promo_codes: Option<std::path::PathBuf>,
}

/// Run the whole migration against the store. `today` anchors voucher
/// expiry checks and the date fallbacks, so runs are reproducible in tests.
pub fn run_migration<S: CommerceStore>(
    store: &mut S,
    config: &MigrationConfig,
    images: &ImageStore,
    files: &MigrationFiles,
    today: NaiveDate,
) -> Result<RunReport> {
    if files.customers.is_none() && files.products.is_none() {
        bail!("nothing to do: provide at least the customers or products export");
    }
    let mut runner = Runner {
        store,
        config,
        images,
        today,
        caches: RunCaches::default(),
        report: RunReport::default(),
        fallback_internal: None,
        rows_since_checkpoint: 0,
    };
    info!("migration run started");

    if let Some(path) = &files.customers {
        runner.phase_customers(path)?;
    }
    if let Some(path) = &files.submissions {
        runner.phase_submissions(path)?;
    }
    if let Some(path) = &files.brands {
        runner.phase_brands(path)?;
    }
    let ctx = runner.ensure_migration_records()?;
    if let Some(path) = &files.products {
        runner.phase_products(path, ctx)?;
    }
    if let Some(path) = &files.gift_cards {
        runner.phase_gift_cards(path)?;
    }
    if let Some(path) = &files.promo_codes {
        runner.phase_promo_codes(path)?;
    }

    runner.store.checkpoint()?;
    info!("migration run complete");
    Ok(runner.report)
}

struct Runner<'a, S: CommerceStore> {
    store: &'a mut S,
    config: &'a MigrationConfig,
    images: &'a ImageStore,
    today: NaiveDate,
    caches: RunCaches,
    report: RunReport,
    fallback_internal: Option<CategoryId>,
    rows_since_checkpoint: usize,
}

/// Alias-resolved field with the export's `nan` marker normalized away.
fn field<'a>(row: &RowView<'a>, aliases: &[&str]) -> &'a str {
    let value = row.resolve(aliases);
    if is_missing(value) { "" } else { value }
}

impl<S: CommerceStore> Runner<'_, S> {
    fn tick(&mut self) -> Result<()> {
        self.rows_since_checkpoint += 1;
        if self.rows_since_checkpoint >= self.config.checkpoint_rows.max(1) {
            self.store.checkpoint()?;
            self.rows_since_checkpoint = 0;
        }
        Ok(())
    }

    fn read_table(&self, path: &Path) -> Result<LegacyTable> {
        LegacyTable::read(path).with_context(|| format!("read {}", path.display()))
    }

    // =====================================================================
    // Phase 1: customers
    // =====================================================================

    fn phase_customers(&mut self, path: &Path) -> Result<()> {
        let span = info_span!("customers", file = %path.display());
        let _guard = span.enter();
        let table = self.read_table(path)?;
        let mut report = PhaseReport::new("customers");
        for row in table.iter() {
            report.processed += 1;
            if report.processed % 100 == 0 {
                info!(count = report.processed, "customer rows processed");
            }
            if let Err(error) = self.customer_row(&row, &mut report) {
                warn!(row = row.number, %error, "customer row failed");
                report.skip("row error");
            }
            self.tick()?;
        }
        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped_total(),
            "customers complete"
        );
        self.store.checkpoint()?;
        self.report.phases.push(report);
        Ok(())
    }

    fn customer_row(&mut self, row: &RowView<'_>, report: &mut PhaseReport) -> Result<()> {
        let legacy = clean_legacy_id(row.resolve(&["klant_id", "KlantId", "customer_id"]));
        let email = field(row, &["username", "email"]);
        let (Some(legacy), false) = (legacy, email.is_empty()) else {
            report.skip("missing id or email");
            return Ok(());
        };
        let legacy = LegacyId::new(legacy);

        let street = format!(
            "{} {}",
            field(row, &["straat", "street"]),
            field(row, &["huisnr", "house_number"])
        )
        .trim()
        .to_string();
        let bus = field(row, &["bus"]);
        let street2 = if bus.is_empty() {
            String::new()
        } else {
            format!("Bus {bus}")
        };
        let name = format!(
            "{} {}",
            field(row, &["voornaam", "first_name"]),
            field(row, &["achternaam", "last_name"])
        )
        .trim()
        .to_string();
        let fields = CustomerFields {
            name,
            street,
            street2,
            zip: field(row, &["postcode", "zip"]).to_string(),
            city: field(row, &["gemeente", "city"]).to_string(),
        };

        let (customer, created) = find_or_create_customer(self.store, &legacy, email, &fields)?;
        if created {
            report.created += 1;
        } else {
            report.updated += 1;
        }

        let mut iban = field(row, &["rekeningnummer", "iban"]);
        if iban.is_empty() {
            iban = field(row, &["rekeningnummer2", "iban2"]);
        }
        if !iban.is_empty() {
            let clean = iban.replace(' ', "");
            if !clean.is_empty() {
                self.store.add_bank_account(customer.id, &clean)?;
            }
        }

        self.caches
            .customers
            .insert(legacy.as_str().to_string(), customer.id);
        Ok(())
    }

    // =====================================================================
    // Phase 2: submissions (consignment bags)
    // =====================================================================

    fn phase_submissions(&mut self, path: &Path) -> Result<()> {
        let span = info_span!("submissions", file = %path.display());
        let _guard = span.enter();
        let table = self.read_table(path)?;
        let mut report = PhaseReport::new("submissions");
        for row in table.iter() {
            report.processed += 1;
            if report.processed % 100 == 0 {
                info!(count = report.processed, "bag rows processed");
            }
            if let Err(error) = self.submission_row(&row, &mut report) {
                warn!(row = row.number, %error, "bag row failed");
                report.skip("row error");
            }
            self.tick()?;
        }
        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped_total(),
            "submissions complete"
        );
        self.store.checkpoint()?;
        self.report.phases.push(report);
        Ok(())
    }

    fn submission_row(&mut self, row: &RowView<'_>, report: &mut PhaseReport) -> Result<()> {
        let Some(bag_id) = clean_legacy_id(row.resolve(&["zak_id", "ZakId", "bag_id"])) else {
            report.skip("missing bag id");
            return Ok(());
        };
        let Some(customer_legacy) = clean_legacy_id(row.resolve(&["KlantId", "klant_id", "customer_id"]))
        else {
            report.skip("missing customer id");
            return Ok(());
        };
        let customer_id = self
            .caches
            .customers
            .get(&customer_legacy)
            .copied()
            .or_else(|| {
                self.store
                    .find_customer_by_legacy_id(&LegacyId::new(customer_legacy.clone()))
                    .map(|customer| customer.id)
            });
        let Some(customer_id) = customer_id else {
            report.skip("unknown customer");
            return Ok(());
        };

        let donation = field(row, &["schenking"]).to_lowercase();
        let action = if donation.contains("goed doel") {
            ReturnAction::Donate
        } else if donation.contains("terug") {
            ReturnAction::Return
        } else {
            ReturnAction::Donate
        };

        let note = field(row, &["notities", "notes"]);
        let seed = SubmissionSeed {
            legacy_id: LegacyId::new(bag_id.clone()),
            legacy_code: field(row, &["code"]).to_string(),
            customer_id,
            sent_date: parse_date(row.resolve(&["datum_verzonden", "sent_date"])),
            received_date: parse_date(row.resolve(&["datum_ontvangen", "received_date"])),
            action_unsold: action,
            notes: if note.is_empty() {
                Vec::new()
            } else {
                vec![note.to_string()]
            },
        };
        let (submission_id, created) = find_or_create_submission(self.store, seed, self.today)?;
        if created {
            report.created += 1;
        } else {
            report.updated += 1;
        }
        self.caches.submissions.insert(bag_id, submission_id);
        Ok(())
    }

    // =====================================================================
    // Phase 3: brands
    // =====================================================================

    fn phase_brands(&mut self, path: &Path) -> Result<()> {
        let span = info_span!("brands", file = %path.display());
        let _guard = span.enter();
        let table = self.read_table(path)?;
        let mut report = PhaseReport::new("brands");
        let mut logo_skips = 0usize;
        for row in table.iter() {
            report.processed += 1;
            if let Err(error) = self.brand_row(&row, &mut report, &mut logo_skips) {
                warn!(row = row.number, %error, "brand row failed");
                report.skip("row error");
            }
            self.tick()?;
        }
        info!(
            created = report.created,
            updated = report.updated,
            logo_downloads_skipped = logo_skips,
            "brands complete"
        );
        self.store.checkpoint()?;
        self.report.phases.push(report);
        Ok(())
    }

    fn brand_row(
        &mut self,
        row: &RowView<'_>,
        report: &mut PhaseReport,
        logo_skips: &mut usize,
    ) -> Result<()> {
        let Some(brand_legacy) = clean_legacy_id(row.resolve(&["merk_id", "MerkId", "brand_id"]))
        else {
            report.skip("missing brand id");
            return Ok(());
        };
        let name = field(row, &["naam", "name"]);
        if name.is_empty() {
            report.skip("missing name");
            return Ok(());
        }

        // Only fetch a logo for brands that do not have one yet.
        let needs_logo = self
            .store
            .find_brand_by_name(name)
            .map(|brand| brand.logo.is_none())
            .unwrap_or(true);
        let logo_url = field(row, &["foto", "logo"]);
        let logo = if needs_logo && !logo_url.is_empty() {
            self.images
                .fetch(logo_url, &format!("MERK_{brand_legacy}"))
        } else {
            if !needs_logo {
                *logo_skips += 1;
            }
            None
        };

        let seed = BrandSeed {
            name: name.to_string(),
            description: field(row, &["omschrijving_nl", "omschrijving", "description"]).to_string(),
            seo_title: field(row, &["seo_titel", "seo_title"]).to_string(),
            seo_description: field(row, &["seo_description"]).to_string(),
            seo_keywords: field(row, &["seo_keywords"]).to_string(),
            logo,
        };
        let (brand_ref, created) = upsert_brand(self.store, seed)?;
        if created {
            report.created += 1;
        } else {
            report.updated += 1;
        }
        self.caches.brands.insert(brand_legacy, brand_ref);
        Ok(())
    }

    // =====================================================================
    // Phase 4: synthetic migration records
    // =====================================================================

    /// The synthetic customer that "bought" every historical order, and
    /// the synthetic submission that parks still-available copies.
    fn ensure_migration_records(&mut self) -> Result<MaterializeCtx> {
        let customer = match self
            .store
            .find_customer_by_name(&self.config.migration_customer_name)
        {
            Some(existing) => existing,
            None => self.store.insert_customer(NewCustomer {
                email: self.config.migration_customer_email.clone(),
                name: self.config.migration_customer_name.clone(),
                note: Some(
                    "Synthetic account carrying historical sales from the retired webshop."
                        .to_string(),
                ),
                ..NewCustomer::default()
            })?,
        };
        let submission = match self
            .store
            .find_submission_by_name(&self.config.migration_submission_name)
        {
            Some(existing) => existing,
            None => self.store.insert_submission(NewSubmission {
                name: self.config.migration_submission_name.clone(),
                legacy_id: None,
                legacy_code: None,
                customer_id: customer.id,
                received_date: self.today,
                published_date: self.today,
                payout_method: PayoutMethod::Coupon,
                payout_percentage: PayoutMethod::Coupon.default_percentage(),
                action_unsold: ReturnAction::Donate,
                iban: None,
                notes: Vec::new(),
            })?,
        };
        info!(
            customer = %customer.name,
            submission = %submission.name,
            "migration records ready"
        );
        Ok(MaterializeCtx {
            migration_customer: customer.id,
            migration_submission: submission.id,
        })
    }

    // =====================================================================
    // Phase 5: products
    // =====================================================================

    fn phase_products(&mut self, path: &Path, ctx: MaterializeCtx) -> Result<()> {
        let span = info_span!("products", file = %path.display());
        let _guard = span.enter();
        let table = self.read_table(path)?;
        let mut report = PhaseReport::new("products");
        for row in table.iter() {
            report.processed += 1;
            if report.processed % 100 == 0 {
                info!(count = report.processed, "product rows processed");
            }
            if let Err(error) = self.product_row(&row, ctx, &mut report) {
                warn!(row = row.number, %error, "product row failed");
                report.skip("row error");
            }
            self.tick()?;
        }
        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped_total(),
            orders = self.report.outcomes.orders_total(),
            withdrawn = self.report.outcomes.withdrawn_total(),
            published = self.report.outcomes.published,
            "products complete"
        );
        self.store.checkpoint()?;
        self.report.phases.push(report);
        Ok(())
    }

    fn fallback_internal(&mut self) -> Result<CategoryId> {
        if let Some(id) = self.fallback_internal {
            return Ok(id);
        }
        let id = ensure_fallback_internal(self.store)?;
        self.fallback_internal = Some(id);
        Ok(id)
    }

    fn product_row(
        &mut self,
        row: &RowView<'_>,
        ctx: MaterializeCtx,
        report: &mut PhaseReport,
    ) -> Result<()> {
        let name = field(row, &["naam", "name"]);
        if is_gift_card_name(name) {
            report.skip("gift card row");
            return Ok(());
        }

        let Some(bag_legacy) = clean_legacy_id(row.resolve(&["zak_id", "ZakId", "bag_id"])) else {
            report.skip("missing bag reference");
            return Ok(());
        };
        let submission_id = self
            .caches
            .submissions
            .get(&bag_legacy)
            .copied()
            .or_else(|| {
                self.store
                    .find_submission_by_legacy_id(&LegacyId::new(bag_legacy.clone()))
                    .map(|submission| submission.id)
            });
        let Some(submission_id) = submission_id else {
            report.skip("unknown bag");
            return Ok(());
        };
        let Some(mut submission) = self.store.get_submission(submission_id) else {
            report.skip("unknown bag");
            return Ok(());
        };

        apply_commission(
            self.store,
            &mut submission,
            row.resolve(&["commissie", "commission"]),
        )?;

        let category = ensure_category(
            self.store,
            &mut self.caches,
            self.config,
            row.resolve(&["type"]),
        )?;
        let fallback_internal = self.fallback_internal()?;
        let brand = clean_legacy_id(row.resolve(&["merk_id", "MerkId", "brand_id"]))
            .and_then(|id| self.caches.brands.get(&id).cloned());

        let data = ProductRowData {
            legacy_id: clean_legacy_id(row.resolve(&["product_id", "ProductId"])).map(LegacyId::new),
            default_code: {
                let code = field(row, &["code"]);
                if code.is_empty() {
                    None
                } else {
                    Some(code.to_string())
                }
            },
            name: name.to_string(),
            price: parse_amount(row.resolve(&["prijs", "price"])),
            image_url: field(row, &["foto", "image"]).to_string(),
            extra_image_urls: field(row, &["extra_fotos"])
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(ToString::to_string)
                .collect(),
            size: field(row, &["maat", "size"]).to_string(),
            season: field(row, &["seizoen", "season"]).to_string(),
            gender: field(row, &["categorie"]).to_string(),
            condition_rating: field(row, &["staat", "conditie"]).to_string(),
            description_ecommerce: field(row, &["lange_omschrijving"]).to_string(),
            seo_title: field(row, &["seo_titel", "seo_title"]).to_string(),
            seo_description: field(row, &["korte_omschrijving_nl", "seo_description"]).to_string(),
            seo_keywords: field(row, &["seo_keywords"]).to_string(),
        };
        let (product, created) = upsert_product(
            self.store,
            self.config,
            self.images,
            &data,
            &submission,
            brand.as_ref(),
            category.as_ref(),
            fallback_internal,
        )?;
        if created {
            report.created += 1;
        } else {
            report.updated += 1;
        }

        let signals = StatusSignals {
            paid: parse_flag(row.resolve(&["uitbetaald", "paid"])),
            sold: parse_flag(row.resolve(&["verkocht", "sold"])),
            hidden: parse_flag(row.resolve(&["product_niet_weergeven", "hidden"])),
            inactive_marker: row
                .resolve(&["status_image"])
                .to_lowercase()
                .contains("nietactief.png"),
            sale_date: parse_date(row.resolve(&["datum_verkocht", "sale_date"])),
            payout_date: parse_date(row.resolve(&["datum_uitbetaald", "payout_date"])),
            stock: parse_amount(row.resolve(&["stock", "voorraad"])),
            submission_code: submission.legacy_code.clone(),
            reason_text: field(row, &["waarom_niet_weergeven", "reason"]).to_string(),
        };
        let outcome = classify(&signals, self.config);
        apply_outcome(
            self.store,
            self.config,
            ctx,
            &product,
            &outcome,
            &mut self.report.outcomes,
        )?;
        Ok(())
    }

    // =====================================================================
    // Phase 6: vouchers
    // =====================================================================

    fn phase_gift_cards(&mut self, path: &Path) -> Result<()> {
        let span = info_span!("gift_cards", file = %path.display());
        let _guard = span.enter();
        let table = self.read_table(path)?;
        let mut report = PhaseReport::new("gift cards");
        process_gift_cards(self.store, &table, self.today, &mut report);
        self.store.checkpoint()?;
        self.report.phases.push(report);
        Ok(())
    }

    fn phase_promo_codes(&mut self, path: &Path) -> Result<()> {
        let span = info_span!("promo_codes", file = %path.display());
        let _guard = span.enter();
        let table = self.read_table(path)?;
        let mut report = PhaseReport::new("promo codes");
        process_promo_codes(self.store, &table, self.today, &mut report);
        self.store.checkpoint()?;
        self.report.phases.push(report);
        Ok(())
    }
}
