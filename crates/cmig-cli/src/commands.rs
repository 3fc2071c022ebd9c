use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::Table;
use serde::Serialize;
use tracing::info;

use cmig_core::{ImageStore, MigrationConfig, MigrationFiles, RunReport, run_migration};
use cmig_model::{
    BrandRepo, CustomerRepo, MemoryStore, OrderRepo, ProductRepo, SubmissionRepo, VoucherRepo,
};

use crate::cli::RunArgs;
use crate::summary::apply_table_style;

/// Everything the summary needs after a run.
pub struct RunOutcome {
    pub report: RunReport,
    pub counts: StoreCounts,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
pub struct StoreCounts {
    pub customers: usize,
    pub submissions: usize,
    pub brands: usize,
    pub products: usize,
    pub orders: usize,
    pub vouchers: usize,
}

pub fn run_migration_command(args: &RunArgs) -> Result<RunOutcome> {
    let mut config = match &args.config {
        Some(path) => MigrationConfig::load(path)?,
        None => MigrationConfig::default(),
    };
    if let Some(dir) = &args.images {
        config.image_base_path = Some(dir.clone());
    }
    if let Some(url) = &args.site_url {
        config.site_url = url.clone();
    }
    if let Some(rows) = args.checkpoint_rows {
        config.checkpoint_rows = rows;
    }

    let files = MigrationFiles {
        customers: args.customers.clone(),
        submissions: args.bags.clone(),
        brands: args.brands.clone(),
        products: args.products.clone(),
        gift_cards: args.gift_cards.clone(),
        promo_codes: args.promo_codes.clone(),
    };
    let images = ImageStore::new(config.image_base_path.clone(), config.site_url.clone());
    let today = chrono::Local::now().date_naive();

    let mut store = MemoryStore::new();
    let report = run_migration(&mut store, &config, &images, &files, today)?;

    let counts = StoreCounts {
        customers: store.customer_count(),
        submissions: store.submission_count(),
        brands: store.brand_count(),
        products: store.product_count(),
        orders: store.order_count(),
        vouchers: store.voucher_count(),
    };

    let output_dir = if args.dry_run {
        info!("dry run, store export skipped");
        None
    } else {
        let dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("migrated"));
        export_store(&store, &dir)?;
        Some(dir)
    };

    Ok(RunOutcome {
        report,
        counts,
        output_dir,
    })
}

/// Write the migrated store as one JSON file per entity type.
fn export_store(store: &MemoryStore, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create output dir {}", dir.display()))?;
    let snapshot = store.snapshot();
    write_json(dir, "customers.json", &snapshot.customers)?;
    write_json(dir, "submissions.json", &snapshot.submissions)?;
    write_json(dir, "brands.json", &snapshot.brands)?;
    write_json(dir, "public_categories.json", &snapshot.public_categories)?;
    write_json(dir, "internal_categories.json", &snapshot.internal_categories)?;
    write_json(dir, "products.json", &snapshot.products)?;
    write_json(dir, "orders.json", &snapshot.orders)?;
    write_json(dir, "vouchers.json", &snapshot.vouchers)?;
    info!(dir = %dir.display(), "store exported");
    Ok(())
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value).context("serialize export")?;
    std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Print the legacy category mapping table.
pub fn run_mappings() -> Result<()> {
    let config = MigrationConfig::default();
    let mut table = Table::new();
    table.set_header(vec!["Legacy label", "Webshop path", "Type value"]);
    apply_table_style(&mut table);
    for entry in &config.category_mappings {
        table.add_row(vec![
            entry.legacy_label.clone(),
            entry.path.clone(),
            entry.type_value.clone(),
        ]);
    }
    println!("{table}");
    Ok(())
}
