//! End-to-end export runs against a synthetic ledger and reference set.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use indicator_core::{Currency, EntityScope, ExportType, IndicatorKind, Segment};
use service_cli::commands::run::{run, RunOptions};
use service_cli::config::RunConfig;

fn write_file(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Synthetic inputs: two entities, two currencies, every time bucket
/// covered in both currencies so the bucketed pipelines can pivot.
fn setup_inputs(dir: &Path) -> RunConfig {
    let ledger = dir.join("data/ledger.csv");
    write_file(
        &ledger,
        "entity_code,account,currency,zone,flow_type,intra_group,amount\n\
         RU1,A1,EUR,E01,F10,INTER,100\n\
         RU1,A1,EUR,Z01,F10,INTER,40\n\
         RU1,A1,EUR,Z02,F10,INTER,30\n\
         RU2,A1,EUR,Z03,F10,INTER,20\n\
         RU1,A1,USD,E01,F10,INTER,50\n\
         RU1,A1,USD,Z01,F10,INTER,15\n\
         RU2,A1,USD,Z02,F10,INTER,25\n\
         RU2,A1,USD,Z03,F10,INTER,35\n\
         RU2,A2,EUR,Z01,F10,EXT,60\n\
         RU1,A1,EUR,E01,T99,INTER,999\n",
    );

    let refs = dir.join("data/refs");
    write_file(
        &refs.join("entities.csv"),
        "entity_code,entity_name\nRU1,FRANFINANCE\nRU2,MILLA\n",
    );
    write_file(&refs.join("transformations.csv"), "aggregate\nA1\nA2\n");
    write_file(
        &refs.join("zone_buckets.csv"),
        "col_a,col_b\nzone,bucket\nE01,0-6M\nZ01,0-6M\nZ02,6-12M\nZ03,>1Y\n",
    );

    write_file(
        &refs.join("lcr_lines.csv"),
        "account,line,flow_pct,stock_pct\nA1,L1,0.5,1.0\n",
    );
    write_file(
        &refs.join("lcr_adjustments.csv"),
        "account,line,factor\nA1,L1,2\n",
    );
    for stem in ["nsfr", "almm", "qis"] {
        write_file(
            &refs.join(format!("{}_lines.csv", stem)),
            "account,line\nA1,LN1\n",
        );
        write_file(
            &refs.join(format!("{}_adjustments.csv", stem)),
            "account,line,factor,factor_0-6M,factor_6-12M,factor_>1Y\n\
             A1,LN1,1,0.5,1.0,0.25\n",
        );
    }
    write_file(&refs.join("aer_lines.csv"), "account,line\nA1,LA1\n");
    write_file(
        &refs.join("aer_adjustments.csv"),
        "account,line,factor\nA1,LA1,3\n",
    );

    RunConfig {
        ledger_path: ledger,
        refs_dir: refs,
        output_dir: dir.join("output"),
        log_level: "info".to_string(),
        workers: Some(2),
        entities: vec!["FRANFINANCE".to_string(), "MILLA".to_string()],
    }
}

fn archive_contents(path: &PathBuf) -> BTreeMap<String, String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut contents = BTreeMap::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let name = entry.path().unwrap().to_string_lossy().into_owned();
        let mut body = String::new();
        entry.read_to_string(&mut body).unwrap();
        contents.insert(name, body);
    }
    contents
}

fn all_indicator_options(export_type: ExportType) -> RunOptions {
    RunOptions {
        export_type,
        view: Segment::All,
        entity: EntityScope::All,
        currency: None,
        indicators: IndicatorKind::ALL.to_vec(),
    }
}

#[test]
fn test_bilan_run_produces_complete_archive() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup_inputs(dir.path());

    let report = run(&config, &all_indicator_options(ExportType::Bilan)).unwrap();
    for outcome in &report.outcomes {
        assert!(
            outcome.outcome.is_ok(),
            "{} failed: {:?}",
            outcome.kind,
            outcome.outcome
        );
    }

    let contents = archive_contents(&report.archive_path);
    let names: Vec<&String> = contents.keys().collect();

    // Result artifacts for every currency scope.
    for currency in ["ALL", "EUR", "USD"] {
        for indicator in ["LCR", "NSFR", "ALMM", "QIS", "AER"] {
            let global = names.iter().any(|n| {
                n.ends_with(&format!(
                    "{}/Reports_all_entities/{}_BILAN_{}.csv",
                    currency, indicator, currency
                ))
            });
            assert!(global, "missing all-entities artifact {} {}", indicator, currency);
        }
    }

    // Per-entity artifacts exist for entities with rows.
    assert!(names
        .iter()
        .any(|n| n.contains("Reports_by_entity/FRANFINANCE/LCR_BILAN_ALL_FRANFINANCE.csv")));
    assert!(names
        .iter()
        .any(|n| n.contains("Reports_by_entity/MILLA/NSFR_BILAN_EUR_MILLA.csv")));

    // Intermediate slices, hierarchy and summary travel in the archive.
    assert!(names.iter().any(|n| n.starts_with("imports_")));
    assert!(contents.contains_key("hierarchy.csv"));
    assert!(contents.contains_key("occurrences.csv"));

    // The EXT row belongs to CONSO and must not appear in any BILAN
    // result: account A2 never reaches a report.
    for (name, body) in &contents {
        if name.contains("Reports_") {
            assert!(!body.contains("A2"), "{} leaked a CONSO row", name);
        }
    }

    // Occurrence summary counts per-entity files of the ALL section.
    let occurrences = &contents["occurrences.csv"];
    assert!(occurrences.contains("FRANFINANCE,5"));
    assert!(occurrences.contains("MILLA,5"));
}

#[test]
fn test_lcr_figures_flow_vs_stock() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup_inputs(dir.path());

    let report = run(
        &config,
        &RunOptions {
            export_type: ExportType::Bilan,
            view: Segment::All,
            entity: EntityScope::All,
            currency: None,
            indicators: vec![IndicatorKind::Lcr],
        },
    )
    .unwrap();

    let contents = archive_contents(&report.archive_path);
    let (_, body) = contents
        .iter()
        .find(|(n, _)| n.ends_with("EUR/Reports_all_entities/LCR_BILAN_EUR.csv"))
        .unwrap();

    // EUR flow row 100 * 0.5 + stock rows (40 + 30) * 1.0 = 120 for
    // FRANFINANCE, stock row 20 for MILLA; factor 2 doubles both.
    assert!(body.contains("FRANFINANCE,A1,L1,120,"));
    assert!(body.contains("240"));
    assert!(body.contains("MILLA,A1,L1,20,"));
}

#[test]
fn test_all_mode_zero_fills_entity_counts() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup_inputs(dir.path());

    let report = run(&config, &all_indicator_options(ExportType::All)).unwrap();
    let contents = archive_contents(&report.archive_path);

    // The coarsest mode emits no per-entity artifacts; every canonical
    // entity is reported at zero.
    let occurrences = &contents["occurrences.csv"];
    assert!(occurrences.contains("FRANFINANCE,0"));
    assert!(occurrences.contains("MILLA,0"));
    assert!(!contents.keys().any(|n| n.contains("Reports_by_entity")));
}

#[test]
fn test_gran_run_scopes_and_fixed_occurrences() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup_inputs(dir.path());

    let report = run(
        &config,
        &RunOptions {
            export_type: ExportType::Gran,
            view: Segment::All,
            entity: EntityScope::All,
            currency: Some(Currency::Eur),
            indicators: IndicatorKind::ALL.to_vec(),
        },
    )
    .unwrap();

    let contents = archive_contents(&report.archive_path);
    let names: Vec<&String> = contents.keys().collect();

    // Only per-entity artifacts under the single requested currency.
    assert!(names
        .iter()
        .any(|n| n.contains("EUR/Reports_by_entity/FRANFINANCE/LCR_GRAN_EUR_FRANFINANCE.csv")));
    assert!(!names.iter().any(|n| n.contains("Reports_all_entities")));
    assert!(!names.iter().any(|n| n.contains("/USD/")));
    assert!(!names.iter().any(|n| n.starts_with("imports_")));

    // Fixed occurrences: every chosen entity at 1, every indicator at
    // the number of chosen entities.
    let occurrences = &contents["occurrences.csv"];
    assert!(occurrences.contains("FRANFINANCE,1"));
    assert!(occurrences.contains("MILLA,1"));
    for indicator in ["LCR", "NSFR", "ALMM", "QIS", "AER"] {
        assert!(occurrences.contains(&format!("{},2", indicator)));
    }
}

#[test]
fn test_gran_without_currency_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup_inputs(dir.path());

    let err = run(
        &config,
        &RunOptions {
            export_type: ExportType::Gran,
            view: Segment::All,
            entity: EntityScope::All,
            currency: None,
            indicators: vec![IndicatorKind::Lcr],
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("currency"));
}

#[test]
fn test_failing_indicator_does_not_abort_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup_inputs(dir.path());

    // Remove one bucket from the zone map: the bucketed pipelines can
    // no longer materialise the >1Y column and fail at the pivot.
    write_file(
        &config.refs_dir.join("zone_buckets.csv"),
        "col_a,col_b\nzone,bucket\nE01,0-6M\nZ01,0-6M\nZ02,6-12M\n",
    );
    config.entities = vec!["FRANFINANCE".to_string(), "MILLA".to_string()];

    let report = run(&config, &all_indicator_options(ExportType::Bilan)).unwrap();
    let by_kind: BTreeMap<IndicatorKind, bool> = report
        .outcomes
        .iter()
        .map(|o| (o.kind, o.outcome.is_ok()))
        .collect();

    // The bucketed families fail, LCR and AER still deliver.
    assert!(by_kind[&IndicatorKind::Lcr]);
    assert!(by_kind[&IndicatorKind::Aer]);
    assert!(!by_kind[&IndicatorKind::Nsfr]);
    assert!(!by_kind[&IndicatorKind::Almm]);
    assert!(!by_kind[&IndicatorKind::Qis]);

    let failure = report
        .outcomes
        .iter()
        .find(|o| o.kind == IndicatorKind::Nsfr)
        .unwrap();
    let message = failure.outcome.as_ref().unwrap_err();
    assert!(message.contains("pivot"));
    assert!(message.contains(">1Y"));

    // The archive still holds the successful artifacts.
    let contents = archive_contents(&report.archive_path);
    assert!(contents.keys().any(|n| n.contains("LCR_BILAN_ALL.csv")));
}
