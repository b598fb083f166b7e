//! Indicators CLI - Regulatory Indicator Export Runs
//!
//! Operational entry point for the indicator reporting engine.
//!
//! # Commands
//!
//! - `indicators run --export-type BILAN` - Run an export
//! - `indicators run --export-type GRAN --currency EUR --entity ALL` - Granular run
//! - `indicators check` - Check configuration and input files
//!
//! # Architecture
//!
//! As the service layer of the workspace, this binary orchestrates the
//! adapter (CSV ingestion), the indicator kernel (partitioner and
//! pipelines) and the export engine (archive and reconciliation).

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use service_cli::commands;
use service_cli::config::RunConfig;
use service_cli::{CliError, Result};

use anyhow::Result as AnyResult;
use indicator_core::{Currency, EntityScope, ExportType, IndicatorKind, Segment};

/// Regulatory indicator reporting CLI
#[derive(Parser)]
#[command(name = "indicators")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "indicators.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an export and produce the result archive
    Run {
        /// Export type (ALL, BILAN, CONSO, GRAN)
        #[arg(short = 't', long, default_value = "ALL")]
        export_type: String,

        /// Indicator view for GRAN (ALL, BILAN, CONSO)
        #[arg(long, default_value = "ALL")]
        view: String,

        /// Target entity for GRAN, or ALL
        #[arg(short, long, default_value = "ALL")]
        entity: String,

        /// Target currency, required for GRAN
        #[arg(long)]
        currency: Option<String>,

        /// Indicator families to run, comma separated, or ALL
        #[arg(short, long, value_delimiter = ',', default_value = "ALL")]
        indicators: Vec<String>,
    },

    /// Check configuration and input files
    Check,
}

fn main() -> AnyResult<()> {
    // Initialise tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let config = RunConfig::load_with_env_and_validate(std::path::Path::new(&cli.config))?;

    match cli.command {
        Commands::Run {
            export_type,
            view,
            entity,
            currency,
            indicators,
        } => {
            let opts = parse_run_options(&export_type, &view, &entity, currency.as_deref(), &indicators)?;
            let report = commands::run::run(&config, &opts)?;
            println!("Archive: {}", report.archive_path.display());
            for outcome in &report.outcomes {
                match &outcome.outcome {
                    Ok(written) => println!("  {}: {} artifact(s)", outcome.kind, written),
                    Err(message) => println!("  {}: FAILED - {}", outcome.kind, message),
                }
            }
        }
        Commands::Check => commands::check::run(&config)?,
    }
    Ok(())
}

/// Turn raw CLI strings into typed run options.
fn parse_run_options(
    export_type: &str,
    view: &str,
    entity: &str,
    currency: Option<&str>,
    indicators: &[String],
) -> Result<commands::run::RunOptions> {
    let export_type: ExportType = export_type
        .parse()
        .map_err(|e| CliError::invalid(format!("{}", e)))?;
    let view: Segment = view
        .parse()
        .map_err(|e| CliError::invalid(format!("{}", e)))?;
    let currency = currency
        .map(|c| {
            c.parse::<Currency>()
                .map_err(|e| CliError::invalid(format!("{}", e)))
        })
        .transpose()?;

    let mut kinds: Vec<IndicatorKind> = Vec::new();
    for name in indicators {
        if name.eq_ignore_ascii_case("ALL") {
            kinds = IndicatorKind::ALL.to_vec();
            break;
        }
        let kind: IndicatorKind = name
            .parse()
            .map_err(|e| CliError::invalid(format!("{}", e)))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    Ok(commands::run::RunOptions {
        export_type,
        view,
        entity: EntityScope::parse(entity),
        currency,
        indicators: kinds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_options_all_indicators() {
        let opts =
            parse_run_options("BILAN", "ALL", "ALL", None, &["ALL".to_string()]).unwrap();
        assert_eq!(opts.export_type, ExportType::Bilan);
        assert_eq!(opts.indicators.len(), 5);
        assert_eq!(opts.entity, EntityScope::All);
    }

    #[test]
    fn test_parse_run_options_subset() {
        let opts = parse_run_options(
            "GRAN",
            "CONSO",
            "FRANFINANCE",
            Some("EUR"),
            &["LCR".to_string(), "NSFR".to_string()],
        )
        .unwrap();
        assert_eq!(opts.export_type, ExportType::Gran);
        assert_eq!(opts.view, Segment::Conso);
        assert_eq!(opts.currency, Some(Currency::Eur));
        assert_eq!(
            opts.indicators,
            vec![IndicatorKind::Lcr, IndicatorKind::Nsfr]
        );
    }

    #[test]
    fn test_parse_run_options_bad_indicator() {
        assert!(parse_run_options("ALL", "ALL", "ALL", None, &["XVA".to_string()]).is_err());
    }
}
