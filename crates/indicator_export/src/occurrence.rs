//! Run-level KPI summary derived from the reconciled hierarchy.
//!
//! Non-granular runs count, per entity, the report files placed under
//! the `Reports_by_entity` branch of the unfiltered currency section,
//! and tally result filenames by their leading indicator token.
//! Granular runs derive nothing from the archive: every chosen entity
//! counts once and every selected indicator counts once per chosen
//! entity.

use std::collections::BTreeMap;

use indicator_core::frame::{Cell, Frame};
use indicator_core::IndicatorKind;

use crate::error::ExportError;
use crate::hierarchy::HierarchySnapshot;

/// Depth-2 marker under which per-entity folders live.
const BY_ENTITY_MARKER: &str = "Reports_by_entity";

/// Blank rows separating the two tables in the summary artifact.
const TABLE_PADDING: usize = 3;

/// Entity and indicator occurrence counts for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceSummary {
    /// Occurrences per entity, ordered by name
    pub entity_counts: Vec<(String, i64)>,
    /// Occurrences per indicator family, in reporting order
    pub indicator_counts: Vec<(IndicatorKind, i64)>,
}

impl OccurrenceSummary {
    /// Render both tables into one frame, separated by blank padding.
    pub fn to_frame(&self) -> Frame {
        let mut rows: Vec<Vec<Cell>> = self
            .entity_counts
            .iter()
            .map(|(name, count)| vec![Cell::Text(name.clone()), Cell::Int(*count)])
            .collect();
        for _ in 0..TABLE_PADDING {
            rows.push(vec![Cell::Null, Cell::Null]);
        }
        for (kind, count) in &self.indicator_counts {
            rows.push(vec![Cell::Text(kind.name().to_string()), Cell::Int(*count)]);
        }
        Frame::from_rows(["label", "occurrences"], rows).expect("fixed column pair")
    }
}

/// Reconcile the archive: rebuild the hierarchy and derive the
/// occurrence summary from it.
///
/// `currency_labels` is the run's ordered currency enumeration; the
/// entity count scans the rows from the first label's section through
/// the second label's header row, mirroring the report layout where the
/// unfiltered section precedes the per-currency ones.
pub fn reconcile(
    entries: &[String],
    currency_labels: &[&str],
    canonical_entities: &[String],
) -> Result<(HierarchySnapshot, OccurrenceSummary), ExportError> {
    let snapshot = crate::hierarchy::PathTree::from_entries(entries).flatten();
    let entity_counts = count_entities(&snapshot, currency_labels, canonical_entities)?;
    let indicator_counts = count_indicator_files(entries);
    Ok((
        snapshot,
        OccurrenceSummary {
            entity_counts,
            indicator_counts,
        },
    ))
}

/// Fixed occurrence summary of a granular run.
pub fn granular_summary(
    entities: &[&str],
    indicators: &[IndicatorKind],
) -> OccurrenceSummary {
    let per_indicator = entities.len() as i64;
    OccurrenceSummary {
        entity_counts: entities.iter().map(|e| (e.to_string(), 1)).collect(),
        indicator_counts: indicators.iter().map(|k| (*k, per_indicator)).collect(),
    }
}

/// Count per-entity report files in the window between the first two
/// currency sections.
pub fn count_entities(
    snapshot: &HierarchySnapshot,
    currency_labels: &[&str],
    canonical_entities: &[String],
) -> Result<Vec<(String, i64)>, ExportError> {
    let rows = snapshot.rows();
    let first_label = currency_labels.first().copied().unwrap_or("ALL");
    let second_label = currency_labels.get(1).copied().unwrap_or("EUR");
    let window_start = find_at_depth(rows, 1, first_label)?;
    let window_end = find_at_depth(rows, 1, second_label)?;
    if window_end < window_start {
        return Err(ExportError::MarkerNotFound(second_label.to_string()));
    }
    let window = &rows[window_start..=window_end];

    let marker = window
        .iter()
        .position(|row| row.get(2).map(String::as_str) == Some(BY_ENTITY_MARKER))
        .ok_or_else(|| ExportError::MarkerNotFound(BY_ENTITY_MARKER.to_string()))?;

    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    let mut current: Option<String> = None;
    let mut count: i64 = 0;
    for row in &window[marker..] {
        if let Some(entity) = row.get(3).filter(|s| !s.is_empty()) {
            if let Some(previous) = current.take() {
                *totals.entry(previous).or_insert(0) += count;
            }
            current = Some(entity.clone());
            count = 0;
        }
        if row.get(4).filter(|s| !s.is_empty()).is_some() {
            count += 1;
        }
    }
    if let Some(previous) = current {
        *totals.entry(previous).or_insert(0) += count;
    }

    // Canonical entities absent from the archive are reported at zero.
    for entity in canonical_entities {
        totals.entry(entity.clone()).or_insert(0);
    }
    Ok(totals.into_iter().collect())
}

fn find_at_depth(
    rows: &[Vec<String>],
    depth: usize,
    label: &str,
) -> Result<usize, ExportError> {
    rows.iter()
        .position(|row| row.get(depth).map(String::as_str) == Some(label))
        .ok_or_else(|| ExportError::MarkerNotFound(label.to_string()))
}

/// Tally archive filenames by their leading indicator token.
pub fn count_indicator_files(entries: &[String]) -> Vec<(IndicatorKind, i64)> {
    IndicatorKind::ALL
        .iter()
        .map(|kind| {
            let prefix = format!("{}_", kind.name());
            let count = entries
                .iter()
                .filter(|entry| {
                    entry
                        .rsplit('/')
                        .next()
                        .is_some_and(|file| file.starts_with(&prefix))
                })
                .count() as i64;
            (*kind, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_entries() -> Vec<String> {
        [
            "RUN/ALL/Reports_all_entities/LCR_BILAN_ALL.csv",
            "RUN/ALL/Reports_by_entity/E1/LCR_BILAN_ALL_E1.csv",
            "RUN/ALL/Reports_by_entity/E1/NSFR_BILAN_ALL_E1.csv",
            "RUN/ALL/Reports_by_entity/E2/LCR_BILAN_ALL_E2.csv",
            "RUN/EUR/Reports_all_entities/LCR_BILAN_EUR.csv",
            "RUN/EUR/Reports_by_entity/E1/LCR_BILAN_EUR_E1.csv",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_entity_counts_within_first_currency_window() {
        let (_, summary) = reconcile(&fixture_entries(), &["ALL", "EUR"], &[]).unwrap();
        assert_eq!(
            summary.entity_counts,
            vec![("E1".to_string(), 2), ("E2".to_string(), 1)]
        );
    }

    #[test]
    fn test_canonical_entities_zero_filled() {
        let canonical = vec!["E1".to_string(), "E2".to_string(), "E3".to_string()];
        let (_, summary) = reconcile(&fixture_entries(), &["ALL", "EUR"], &canonical).unwrap();
        assert_eq!(
            summary.entity_counts,
            vec![
                ("E1".to_string(), 2),
                ("E2".to_string(), 1),
                ("E3".to_string(), 0)
            ]
        );
    }

    #[test]
    fn test_repeated_entity_names_summed() {
        let entries: Vec<String> = [
            "RUN/ALL/Reports_by_entity/E1/LCR_A.csv",
            "RUN/ALL/Reports_by_entity/E2/LCR_B.csv",
            "RUN/ALL/Reports_by_entity/E1/NSFR_C.csv",
            "RUN/EUR/Reports_all_entities/LCR_D.csv",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let (_, summary) = reconcile(&entries, &["ALL", "EUR"], &[]).unwrap();
        // E1 appears in two separate folder runs; counts add up.
        assert_eq!(
            summary.entity_counts,
            vec![("E1".to_string(), 2), ("E2".to_string(), 1)]
        );
    }

    #[test]
    fn test_indicator_tally_counts_all_filenames() {
        let (_, summary) = reconcile(&fixture_entries(), &["ALL", "EUR"], &[]).unwrap();
        let by_kind: BTreeMap<IndicatorKind, i64> =
            summary.indicator_counts.into_iter().collect();
        assert_eq!(by_kind[&IndicatorKind::Lcr], 5);
        assert_eq!(by_kind[&IndicatorKind::Nsfr], 1);
        assert_eq!(by_kind[&IndicatorKind::Qis], 0);
    }

    #[test]
    fn test_missing_markers_reported() {
        let entries = vec!["RUN/ALL/Reports_all_entities/LCR_A.csv".to_string()];
        let err = reconcile(&entries, &["ALL", "EUR"], &[]).unwrap_err();
        assert!(matches!(err, ExportError::MarkerNotFound(label) if label == "EUR"));

        let entries = vec![
            "RUN/ALL/Reports_all_entities/LCR_A.csv".to_string(),
            "RUN/EUR/Reports_all_entities/LCR_B.csv".to_string(),
        ];
        let err = reconcile(&entries, &["ALL", "EUR"], &[]).unwrap_err();
        assert!(
            matches!(err, ExportError::MarkerNotFound(label) if label == "Reports_by_entity")
        );
    }

    #[test]
    fn test_granular_summary_fixed_occurrences() {
        let entities: Vec<String> = (1..=24).map(|i| format!("ENTITY_{:02}", i)).collect();
        let entity_refs: Vec<&str> = entities.iter().map(String::as_str).collect();

        let summary = granular_summary(&entity_refs, &IndicatorKind::ALL);
        assert_eq!(summary.entity_counts.len(), 24);
        assert!(summary.entity_counts.iter().all(|(_, c)| *c == 1));
        assert_eq!(summary.indicator_counts.len(), 5);
        assert!(summary.indicator_counts.iter().all(|(_, c)| *c == 24));
    }

    #[test]
    fn test_summary_frame_has_padding_between_tables() {
        let summary = OccurrenceSummary {
            entity_counts: vec![("E1".to_string(), 2)],
            indicator_counts: vec![(IndicatorKind::Lcr, 1)],
        };
        let frame = summary.to_frame();
        assert_eq!(frame.n_rows(), 1 + TABLE_PADDING + 1);
        assert!(frame.cell(1, "label").unwrap().is_null());
        assert_eq!(
            frame.cell(4, "label").unwrap(),
            &Cell::Text("LCR".to_string())
        );
    }
}
