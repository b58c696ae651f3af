//! TCG Staging - stage a Manabox export for a TCGplayer inventory upload
//!
//! Matches each scanned card against the TCGplayer reference catalog and
//! writes the merged line items as a staging CSV.

use clap::Parser;
use std::path::PathBuf;
use tcg_staging::io::{read_inventory, write_given_up, write_records, write_report, RunReport};
use tcg_staging::{
    Catalog, GiveUpPrompter, Prompter, ResolverConfig, StagingError, StagingSession,
    TerminalPrompter,
};

/// Resolve a Manabox collection export against the TCGplayer catalog
#[derive(Parser, Debug)]
#[command(name = "tcg_staging")]
#[command(version, about, long_about = None)]
struct Args {
    /// Manabox collection export (CSV)
    input: PathBuf,

    /// TCGplayer reference catalog (CSV)
    #[arg(short, long, default_value = "REFERENCE.csv")]
    reference: PathBuf,

    /// Staged output CSV
    #[arg(short, long, default_value = "tcgplayer_staged.csv")]
    output: PathBuf,

    /// Also write the cards nobody could resolve to this CSV
    #[arg(long)]
    given_up: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Score at or above which a match is accepted without asking
    #[arg(long)]
    auto_confirm: Option<f64>,

    /// Lower score accepted when the best match leads clearly
    #[arg(long)]
    secondary: Option<f64>,

    /// Required lead over the runner-up for the lower score
    #[arg(long)]
    lead: Option<f64>,

    /// Price used when neither catalog nor purchase price is usable
    #[arg(long)]
    floor_price: Option<f64>,

    /// Score every catalog entry instead of pre-filtering by name
    #[arg(long, default_value_t = false)]
    no_prefilter: bool,

    /// Never prompt; inconclusive matches are given up
    #[arg(long, default_value_t = false)]
    non_interactive: bool,
}

impl Args {
    fn resolver_config(&self) -> ResolverConfig {
        let defaults = ResolverConfig::default();
        ResolverConfig {
            auto_confirm_score: self.auto_confirm.unwrap_or(defaults.auto_confirm_score),
            secondary_score: self.secondary.unwrap_or(defaults.secondary_score),
            lead_margin: self.lead.unwrap_or(defaults.lead_margin),
            floor_price: self.floor_price.unwrap_or(defaults.floor_price),
            prefilter: !self.no_prefilter,
            ..defaults
        }
    }
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    log::info!("Starting tcg_staging...");
    log::info!("Input: {}", args.input.display());
    log::info!("Reference: {}", args.reference.display());

    match run(&args) {
        Ok(()) => {}
        Err(StagingError::Cancelled) => {
            log::warn!("Run cancelled, nothing was written");
            std::process::exit(130);
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> tcg_staging::Result<()> {
    let catalog = Catalog::load(&args.reference)?;
    let rows = read_inventory(&args.input)?;

    let prompter: Box<dyn Prompter> = if args.non_interactive {
        log::info!("Non-interactive run, inconclusive matches will be given up");
        Box::new(GiveUpPrompter)
    } else {
        Box::new(TerminalPrompter)
    };

    let mut session = StagingSession::new(&catalog, args.resolver_config(), prompter);
    session.process_rows(rows)?;
    let output = session.finish();

    write_records(&args.output, &output.records)?;

    if let Some(path) = &args.given_up {
        write_given_up(path, &output.given_up)?;
    }

    if let Some(path) = &args.report {
        let report = RunReport::new(&args.input, &args.reference, catalog.stats(), &output);
        write_report(path, &report)?;
    }

    log::info!("Staged inventory ready for upload: {}", args.output.display());
    Ok(())
}
