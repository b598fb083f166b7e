//! Configuration and input file check.

use indicator_core::IndicatorKind;

use crate::config::RunConfig;
use crate::error::Result;

/// Verify the configuration and report which input files are present.
pub fn run(config: &RunConfig) -> Result<()> {
    config.validate()?;

    println!("Configuration OK");
    println!("  ledger_path: {}", config.ledger_path.display());
    println!("  refs_dir:    {}", config.refs_dir.display());
    println!("  output_dir:  {}", config.output_dir.display());
    println!("  entities:    {}", config.entities.len());

    let mark = |present: bool| if present { "ok" } else { "MISSING" };
    println!(
        "  ledger extract: {}",
        mark(config.ledger_path.exists())
    );

    let shared = ["entities.csv", "transformations.csv", "zone_buckets.csv"];
    for name in shared {
        let path = config.refs_dir.join(name);
        println!("  {}: {}", name, mark(path.exists()));
    }
    for kind in IndicatorKind::ALL {
        let stem = kind.name().to_lowercase();
        for suffix in ["lines", "adjustments"] {
            let name = format!("{}_{}.csv", stem, suffix);
            let path = config.refs_dir.join(&name);
            println!("  {}: {}", name, mark(path.exists()));
        }
    }
    Ok(())
}
