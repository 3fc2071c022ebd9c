//! CLI argument definitions for the migration wizard.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cmig",
    version,
    about = "Consignment migration wizard - reconcile legacy shop exports into the commerce store",
    long_about = "Reconcile the CSV exports of the retired consignment webshop\n\
                  (customers, bags, brands, products, gift cards, promo codes)\n\
                  into the live commerce store. Runs are idempotent: a re-run\n\
                  on the same input creates no duplicate entities."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the migration over a set of legacy CSV exports.
    Run(RunArgs),

    /// Print the legacy category mapping table.
    Mappings,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Customers export (klanten).
    #[arg(long, value_name = "FILE")]
    pub customers: Option<PathBuf>,

    /// Consignment bags export (verzendzakken).
    #[arg(long = "bags", value_name = "FILE")]
    pub bags: Option<PathBuf>,

    /// Brands export (merken).
    #[arg(long, value_name = "FILE")]
    pub brands: Option<PathBuf>,

    /// Products export (producten).
    #[arg(long, value_name = "FILE")]
    pub products: Option<PathBuf>,

    /// Gift cards export (bonnen).
    #[arg(long = "gift-cards", value_name = "FILE")]
    pub gift_cards: Option<PathBuf>,

    /// Promo codes export (actiecodes).
    #[arg(long = "promo-codes", value_name = "FILE")]
    pub promo_codes: Option<PathBuf>,

    /// JSON file overriding the default migration constants.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Local image cache directory (<DIR>/<legacy_id>/<filename>).
    #[arg(long = "images", value_name = "DIR")]
    pub images: Option<PathBuf>,

    /// Base URL of the retired webshop, for image downloads.
    #[arg(long = "site-url", value_name = "URL")]
    pub site_url: Option<String>,

    /// Directory for the JSON export of the migrated store
    /// (default: ./migrated).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Process and report without exporting the store.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Durable commit cadence, in rows.
    #[arg(long = "checkpoint-rows", value_name = "N")]
    pub checkpoint_rows: Option<usize>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
