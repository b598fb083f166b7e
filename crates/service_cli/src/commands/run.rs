//! The export run: load, partition, pipelines, archive, reconcile.
//!
//! Indicator pipelines run concurrently on a fixed-size worker pool;
//! each failure is collected per indicator without aborting siblings,
//! and nothing already written to the archive is rolled back. The
//! reconciler runs strictly after every pipeline write has completed.

use std::collections::BTreeMap;
use std::path::PathBuf;

use adapter_ledger::{load_ledger, load_reference, CsvSliceStore};
use indicator_core::{Currency, CurrencyScope, EntityScope, ExportType, IndicatorKind, Segment};
use indicator_engine::{IndicatorSpec, LedgerSlice, Partitioner, ReferenceStore};
use indicator_export::render::frame_csv_bytes;
use indicator_export::{
    granular_summary, occurrence, reconcile, Archive, ExportError, ExportTreeWriter,
    HierarchySnapshot, OccurrenceSummary, PathTree,
};
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::error::{CliError, Result};

/// Parameters of one export run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Top-level run mode
    pub export_type: ExportType,
    /// Indicator view, granular mode only
    pub view: Segment,
    /// Entity scope, granular mode only
    pub entity: EntityScope,
    /// Target currency, required by the granular mode
    pub currency: Option<Currency>,
    /// Indicator families to run
    pub indicators: Vec<IndicatorKind>,
}

/// Outcome of one indicator pipeline: artifacts written, or the error.
#[derive(Debug)]
pub struct IndicatorOutcome {
    pub kind: IndicatorKind,
    pub outcome: std::result::Result<usize, String>,
}

/// What an export run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Path of the finished archive
    pub archive_path: PathBuf,
    /// Per-indicator outcomes, successes and failures alike
    pub outcomes: Vec<IndicatorOutcome>,
}

/// Execute one export run end to end.
pub fn run(config: &RunConfig, opts: &RunOptions) -> Result<RunReport> {
    let run_timestamp = chrono::Utc::now().format("%Y_%m_%d_%H_%M_%S").to_string();
    info!(
        export_type = %opts.export_type,
        timestamp = %run_timestamp,
        indicators = opts.indicators.len(),
        "starting export run"
    );

    let ledger = load_ledger(&config.ledger_path)?;
    let refs = load_reference_store(config, &opts.indicators)?;
    let partitioner = Partitioner::new(&ledger)?;

    let archive_file = config.output_dir.join(format!(
        "RUN_{}_{}.tar.gz",
        run_timestamp,
        opts.export_type.label()
    ));
    let archive = Archive::create(&archive_file)?;
    let writer = ExportTreeWriter::new(&archive, &run_timestamp, opts.export_type);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.unwrap_or_else(num_cpus::get))
        .build()
        .map_err(|e| CliError::invalid(format!("worker pool: {}", e)))?;

    let outcomes = if opts.export_type == ExportType::Gran {
        // Fails before any pipeline when the currency is missing.
        let slice = partitioner.granular(opts.currency, opts.view)?;
        let entities = opts.entity.resolve(&config.entities);

        let outcomes = pool.install(|| {
            opts.indicators
                .par_iter()
                .map(|kind| run_granular_pipeline(*kind, &slice, &refs, &writer, &entities))
                .collect::<Vec<_>>()
        });

        let summary = granular_summary(&entities, &opts.indicators);
        let snapshot = PathTree::from_entries(archive.entries()).flatten();
        append_summaries(&archive, &snapshot, &summary)?;
        outcomes
    } else {
        let imports_dir = config
            .output_dir
            .join(format!("imports_{}", run_timestamp));
        let store = CsvSliceStore::new(&imports_dir)?;
        let slices = partitioner.partition(opts.export_type, &store)?;

        let active_segment = match opts.export_type {
            ExportType::All => Segment::All,
            ExportType::Bilan => Segment::Bilan,
            ExportType::Conso => Segment::Conso,
            ExportType::Gran => unreachable!("granular handled above"),
        };
        let work: Vec<&LedgerSlice> = slices
            .iter()
            .filter(|s| s.segment == active_segment)
            .collect();

        let outcomes = pool.install(|| {
            opts.indicators
                .par_iter()
                .map(|kind| run_indicator_pipelines(*kind, &work, &refs, &writer))
                .collect::<Vec<_>>()
        });

        // Reconciliation reads only what the pipelines flushed; the
        // intermediate slices and summary artifacts come after.
        let entries = archive.entries();
        reconcile_and_append(&archive, &entries, config)?;
        append_slice_artifacts(&archive, &slices, &run_timestamp)?;
        outcomes
    };

    let archive_path = archive.finish()?;
    for outcome in &outcomes {
        match &outcome.outcome {
            Ok(written) => {
                info!(indicator = %outcome.kind, artifacts = written, "pipeline succeeded")
            }
            Err(message) => {
                error!(indicator = %outcome.kind, error = %message, "pipeline failed")
            }
        }
    }
    info!(path = %archive_path.display(), "export run finished");

    Ok(RunReport {
        archive_path,
        outcomes,
    })
}

/// One indicator over every currency slice of the active segment. A
/// failing slice aborts the remaining slices of this indicator only.
fn run_indicator_pipelines(
    kind: IndicatorKind,
    work: &[&LedgerSlice],
    refs: &ReferenceStore,
    writer: &ExportTreeWriter<'_>,
) -> IndicatorOutcome {
    let spec = IndicatorSpec::for_kind(kind);
    let mut written = 0usize;
    for slice in work {
        let outcome = indicator_engine::run(&slice.frame, &spec, refs)
            .map_err(|e| e.to_string())
            .and_then(|result| {
                writer
                    .place(&result, slice.currency)
                    .map_err(|e| e.to_string())
            });
        match outcome {
            Ok(paths) => written += paths.len(),
            Err(message) => {
                return IndicatorOutcome {
                    kind,
                    outcome: Err(message),
                }
            }
        }
    }
    IndicatorOutcome {
        kind,
        outcome: Ok(written),
    }
}

/// One indicator over the single granular slice.
fn run_granular_pipeline(
    kind: IndicatorKind,
    slice: &LedgerSlice,
    refs: &ReferenceStore,
    writer: &ExportTreeWriter<'_>,
    entities: &[&str],
) -> IndicatorOutcome {
    let spec = IndicatorSpec::for_kind(kind);
    let outcome = indicator_engine::run(&slice.frame, &spec, refs)
        .map_err(|e| e.to_string())
        .and_then(|result| {
            writer
                .place_granular(&result, slice.currency, entities)
                .map_err(|e| e.to_string())
        })
        .map(|written| written.len());
    IndicatorOutcome { kind, outcome }
}

/// Reconcile the archive and append the hierarchy and summary
/// artifacts. When the per-entity markers are absent (the coarsest mode
/// emits no per-entity reports) every canonical entity is reported at
/// zero instead of failing the run.
fn reconcile_and_append(
    archive: &Archive,
    entries: &[String],
    config: &RunConfig,
) -> Result<()> {
    let scopes = CurrencyScope::report_order();
    let labels: Vec<&str> = scopes.iter().map(|s| s.label()).collect();

    match reconcile(entries, &labels, &config.entities) {
        Ok((snapshot, summary)) => append_summaries(archive, &snapshot, &summary),
        Err(ExportError::MarkerNotFound(marker)) => {
            warn!(marker = %marker, "occurrence markers absent, entity counts zero-filled");
            let snapshot = PathTree::from_entries(entries).flatten();
            let zeroed: BTreeMap<String, i64> =
                config.entities.iter().map(|e| (e.clone(), 0)).collect();
            let summary = OccurrenceSummary {
                entity_counts: zeroed.into_iter().collect(),
                indicator_counts: occurrence::count_indicator_files(entries),
            };
            append_summaries(archive, &snapshot, &summary)
        }
        Err(other) => Err(other.into()),
    }
}

fn append_summaries(
    archive: &Archive,
    snapshot: &HierarchySnapshot,
    summary: &OccurrenceSummary,
) -> Result<()> {
    archive.append_bytes("hierarchy.csv", &frame_csv_bytes(&snapshot.to_frame())?)?;
    archive.append_bytes("occurrences.csv", &frame_csv_bytes(&summary.to_frame())?)?;
    Ok(())
}

/// Carry the verified intermediate slice artifacts into the archive.
fn append_slice_artifacts(
    archive: &Archive,
    slices: &[LedgerSlice],
    run_timestamp: &str,
) -> Result<()> {
    for slice in slices {
        let Some(path) = &slice.artifact else { continue };
        let Some(name) = path.file_name() else { continue };
        let bytes = std::fs::read(path)?;
        let entry = format!("imports_{}/{}", run_timestamp, name.to_string_lossy());
        archive.append_bytes(&entry, &bytes)?;
    }
    Ok(())
}

/// Load and normalise the reference tables the selected indicators
/// need.
fn load_reference_store(
    config: &RunConfig,
    indicators: &[IndicatorKind],
) -> Result<ReferenceStore> {
    let dir = &config.refs_dir;
    let mut builder = ReferenceStore::builder()
        .entities(load_reference(dir.join("entities.csv"))?)
        .map_err(CliError::Engine)?
        .transformations(load_reference(dir.join("transformations.csv"))?)
        .map_err(CliError::Engine)?;

    if indicators
        .iter()
        .any(|k| IndicatorSpec::for_kind(*k).bucketed())
    {
        builder = builder
            .zone_buckets(load_reference(dir.join("zone_buckets.csv"))?)
            .map_err(CliError::Engine)?;
    }

    for kind in indicators {
        let stem = kind.name().to_lowercase();
        builder = builder
            .lines(*kind, load_reference(dir.join(format!("{}_lines.csv", stem)))?)
            .map_err(CliError::Engine)?
            .adjustments(
                *kind,
                load_reference(dir.join(format!("{}_adjustments.csv", stem)))?,
            )
            .map_err(CliError::Engine)?;
    }

    builder.build().map_err(CliError::Engine)
}
