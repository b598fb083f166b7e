//! Deterministic placement of pipeline results in the export tree.
//!
//! Artifact paths derive only from (run timestamp, export type,
//! currency, entity scope, indicator name):
//!
//! ```text
//! RUN_<ts>_<type>/<currency>/Reports_all_entities/<IND>_<type>_<currency>.csv
//! RUN_<ts>_<type>/<currency>/Reports_by_entity/<entity>/<IND>_<type>_<currency>_<entity>.csv
//! ```
//!
//! The coarsest `ALL` mode only emits the all-entities artifact per
//! currency; the granular mode emits per-entity artifacts only. Empty
//! results and empty entity subsets are skipped silently.

use indicator_core::{CurrencyScope, ExportType};
use indicator_engine::PipelineResult;
use tracing::debug;

use crate::archive::Archive;
use crate::error::ExportError;
use crate::render::frame_csv_bytes;

/// File extension of result artifacts.
const ARTIFACT_EXT: &str = "csv";

/// Places finished pipeline results into the shared archive.
pub struct ExportTreeWriter<'a> {
    archive: &'a Archive,
    run_folder: String,
    export_type: ExportType,
}

impl<'a> ExportTreeWriter<'a> {
    /// Bind a writer to an archive and a run.
    pub fn new(archive: &'a Archive, run_timestamp: &str, export_type: ExportType) -> Self {
        ExportTreeWriter {
            archive,
            run_folder: format!("RUN_{}_{}", run_timestamp, export_type.label()),
            export_type,
        }
    }

    /// The archive folder all artifacts of this run live under.
    pub fn run_folder(&self) -> &str {
        &self.run_folder
    }

    fn all_entities_path(&self, result: &PipelineResult, currency: CurrencyScope) -> String {
        format!(
            "{}/{}/Reports_all_entities/{}_{}_{}.{}",
            self.run_folder,
            currency.label(),
            result.kind().name(),
            self.export_type.label(),
            currency.label(),
            ARTIFACT_EXT,
        )
    }

    fn entity_path(
        &self,
        result: &PipelineResult,
        currency: CurrencyScope,
        entity: &str,
    ) -> String {
        format!(
            "{}/{}/Reports_by_entity/{}/{}_{}_{}_{}.{}",
            self.run_folder,
            currency.label(),
            entity,
            result.kind().name(),
            self.export_type.label(),
            currency.label(),
            entity,
            ARTIFACT_EXT,
        )
    }

    /// Place one result for a non-granular export.
    ///
    /// Returns the entry paths written; an empty result writes nothing.
    pub fn place(
        &self,
        result: &PipelineResult,
        currency: CurrencyScope,
    ) -> Result<Vec<String>, ExportError> {
        if result.is_empty() {
            debug!(indicator = %result.kind(), currency = %currency, "empty result skipped");
            return Ok(Vec::new());
        }

        let mut written = Vec::new();
        let global_path = self.all_entities_path(result, currency);
        self.archive
            .append_bytes(&global_path, &frame_csv_bytes(result.frame())?)?;
        written.push(global_path);

        if self.export_type != ExportType::All {
            for entity in result.entity_values()? {
                let subset = result.subset_for_entity(&entity)?;
                if subset.is_empty() {
                    continue;
                }
                let path = self.entity_path(result, currency, &entity);
                self.archive
                    .append_bytes(&path, &frame_csv_bytes(&subset)?)?;
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Place one result for a granular export, scoped to the requested
    /// entities and single currency.
    pub fn place_granular(
        &self,
        result: &PipelineResult,
        currency: CurrencyScope,
        entities: &[&str],
    ) -> Result<Vec<String>, ExportError> {
        if result.is_empty() {
            debug!(indicator = %result.kind(), currency = %currency, "empty result skipped");
            return Ok(Vec::new());
        }

        let mut written = Vec::new();
        for entity in entities {
            let subset = result.subset_for_entity(entity)?;
            if subset.is_empty() {
                debug!(indicator = %result.kind(), entity, "no rows for entity");
                continue;
            }
            let path = self.entity_path(result, currency, entity);
            self.archive
                .append_bytes(&path, &frame_csv_bytes(&subset)?)?;
            written.push(path);
        }
        Ok(written)
    }
}
